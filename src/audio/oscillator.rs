//! Continuous tone generators.

/// A free-running triangle wave oscillator.
///
/// The phase advances on every sample whether or not anyone is listening,
/// so reconnecting a voice resumes the wave where it is rather than
/// restarting it.
#[derive(Debug, Clone)]
pub struct TriangleOscillator {
    frequency: f32,
    /// Normalized phase in [0, 1).
    phase: f32,
    /// Phase advance per sample.
    increment: f32,
}

impl TriangleOscillator {
    /// Creates an oscillator at `frequency` Hz for the given sample rate.
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            phase: 0.0,
            increment: frequency / sample_rate as f32,
        }
    }

    /// The oscillator frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Produces the next sample in [-1, 1] and advances the phase.
    pub fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let value = if p < 0.25 {
            4.0 * p
        } else if p < 0.75 {
            2.0 - 4.0 * p
        } else {
            4.0 * p - 4.0
        };

        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_shape() {
        // 4 samples per period: 0, 1, 0, -1
        let mut osc = TriangleOscillator::new(1.0, 4);
        let samples: Vec<f32> = (0..8).map(|_| osc.next_sample()).collect();
        let expected = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        for (got, want) in samples.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{samples:?}");
        }
    }

    #[test]
    fn test_output_is_bounded() {
        let mut osc = TriangleOscillator::new(987.77, 44100);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}
