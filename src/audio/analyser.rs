//! Frequency-domain analysis of the tap input.
//!
//! Produces byte magnitudes the same way browsers' analyser nodes do:
//! Blackman-windowed FFT, magnitudes converted to decibels and mapped
//! linearly from [`MIN_DECIBELS`, `MAX_DECIBELS`] onto 0..=255. No
//! smoothing is applied between snapshots.

use crate::audio::context::{AudioContext, TAP_WINDOW};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Transform size.
pub const FFT_SIZE: usize = TAP_WINDOW;

/// Number of frequency bins produced per snapshot.
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Decibel level mapped to byte 0.
pub const MIN_DECIBELS: f32 = -100.0;

/// Decibel level mapped to byte 255.
pub const MAX_DECIBELS: f32 = -30.0;

/// Read-only frequency snapshot source over the context's tap.
pub struct AnalysisTap {
    ctx: AudioContext,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl AnalysisTap {
    /// Creates an analyser reading the tap of `ctx`.
    pub fn new(ctx: &AudioContext) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            ctx: ctx.clone(),
            fft,
            window: blackman_window(FFT_SIZE),
            samples: vec![0.0; FFT_SIZE],
            buffer: vec![Complex { re: 0.0, im: 0.0 }; FFT_SIZE],
        }
    }

    /// Number of bins a full snapshot contains.
    pub fn bin_count(&self) -> usize {
        BIN_COUNT
    }

    /// Fills `out` with byte magnitudes of the lowest `out.len()` bins.
    ///
    /// Entries past [`BIN_COUNT`] are set to zero.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.ctx.read_tap(&mut self.samples);

        for ((dst, &sample), &w) in self
            .buffer
            .iter_mut()
            .zip(&self.samples)
            .zip(&self.window)
        {
            *dst = Complex {
                re: sample * w,
                im: 0.0,
            };
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = match self.buffer.get(i) {
                Some(bin) if i < BIN_COUNT => magnitude_to_byte(bin.norm() * scale),
                _ => 0,
            };
        }
    }
}

/// Converts a linear magnitude to a byte on the decibel scale.
fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) * 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}
