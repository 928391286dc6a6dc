//! Spectrum visualization state.
//!
//! Every animation frame the visualizer pulls a byte-magnitude snapshot from
//! the analysis tap and turns the lowest [`BAR_COUNT`] bins into bars: a
//! height percentage and a hue. Rendering the bars is left to the UI.

use crate::audio::{AnalysisTap, AudioContext};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of bars drawn.
pub const BAR_COUNT: usize = 128;

/// Height used for bins with zero magnitude, so every bar stays visible.
pub const MIN_HEIGHT_PERCENT: f32 = 2.0;

/// Hue step between neighbouring bars, in degrees.
pub const HUE_STEP: u16 = 10;

/// Bar color saturation (percent).
pub const SATURATION: f32 = 80.0;

/// Bar color lightness (percent).
pub const LIGHTNESS: f32 = 50.0;

/// Bar color opacity.
pub const ALPHA: f32 = 0.6;

/// Default frame interval (~60 frames per second).
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// One bar of the spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Height as a percentage of the available space.
    pub height_percent: f32,
    /// Hue in degrees; may exceed 360 and wraps when converted to a color.
    pub hue: u16,
}

impl Bar {
    /// Maps a bin magnitude at a slot to a bar.
    pub fn from_magnitude(index: usize, magnitude: u8) -> Self {
        let height_percent = if magnitude == 0 {
            MIN_HEIGHT_PERCENT
        } else {
            magnitude as f32 * 100.0 / 255.0
        };
        Self {
            height_percent,
            hue: index as u16 * HUE_STEP,
        }
    }

    /// The bar color as RGB, blended over a black background with [`ALPHA`].
    pub fn rgb(&self) -> (u8, u8, u8) {
        let (r, g, b) = hsl_to_rgb(self.hue as f32, SATURATION / 100.0, LIGHTNESS / 100.0);
        let blend = |c: f32| (c * ALPHA * 255.0).round() as u8;
        (blend(r), blend(g), blend(b))
    }
}

/// Converts HSL (hue in degrees, s and l in [0, 1]) to RGB in [0, 1].
fn hsl_to_rgb(hue: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (r + m, g + m, b + m)
}

/// Shared cancellation flag for a repeating task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A fixed-rate, cancellable frame schedule.
///
/// Frames that fall behind are dropped rather than queued: after a stall the
/// next frame is scheduled one interval from now.
#[derive(Debug)]
pub struct AnimationLoop {
    interval: Duration,
    next_due: Option<Instant>,
    token: CancelToken,
}

impl AnimationLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            token: CancelToken::new(),
        }
    }

    /// A token that stops this loop when cancelled.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true if a frame should run at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.token.is_cancelled() {
            return false;
        }

        match self.next_due {
            Some(due) if now < due => false,
            Some(due) => {
                let next = due + self.interval;
                self.next_due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            None => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }

    /// Time until the next frame is due, zero if it is due already.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or_default()
    }
}

/// Turns analysis snapshots into bars once per frame.
pub struct SpectrumVisualizer {
    tap: AnalysisTap,
    bins: Vec<u8>,
    bars: Vec<Bar>,
    frames: AnimationLoop,
}

impl SpectrumVisualizer {
    pub fn new(ctx: &AudioContext) -> Self {
        Self::with_interval(ctx, FRAME_INTERVAL)
    }

    pub fn with_interval(ctx: &AudioContext, interval: Duration) -> Self {
        Self {
            tap: AnalysisTap::new(ctx),
            bins: vec![0; BAR_COUNT],
            bars: (0..BAR_COUNT).map(|i| Bar::from_magnitude(i, 0)).collect(),
            frames: AnimationLoop::new(interval),
        }
    }

    /// Reads the tap and recomputes every bar.
    pub fn step(&mut self) {
        self.tap.byte_frequency_data(&mut self.bins);
        for (i, (bar, &magnitude)) in self.bars.iter_mut().zip(&self.bins).enumerate() {
            *bar = Bar::from_magnitude(i, magnitude);
        }
    }

    /// Runs a step if a frame is due. Returns true if the bars changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.frames.poll(now) {
            self.step();
            true
        } else {
            false
        }
    }

    /// The bars from the most recent step.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Token that cancels this visualizer's frame loop.
    pub fn cancel_token(&self) -> CancelToken {
        self.frames.token()
    }

    pub fn is_running(&self) -> bool {
        !self.frames.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Voice, SAMPLE_RATE};

    #[test]
    fn test_bar_mapping() {
        assert_eq!(Bar::from_magnitude(0, 0).height_percent, 2.0);
        assert_eq!(Bar::from_magnitude(3, 255).height_percent, 100.0);
        assert!((Bar::from_magnitude(0, 51).height_percent - 20.0).abs() < 1e-4);
        assert_eq!(Bar::from_magnitude(5, 0).hue, 50);
        assert_eq!(Bar::from_magnitude(127, 0).hue, 1270);
    }

    #[test]
    fn test_bar_colors() {
        // hue 0 at 80% saturation, 50% lightness is (0.9, 0.1, 0.1)
        let (r, g, b) = Bar::from_magnitude(0, 0).rgb();
        assert_eq!((r, g, b), (138, 15, 15));
        // hue wraps: 36 * 10 = 360 degrees
        assert_eq!(Bar::from_magnitude(36, 0).rgb(), (138, 15, 15));
        let (r, g, b) = Bar::from_magnitude(12, 0).rgb(); // 120 degrees
        assert!(g > r && g > b);
    }

    #[test]
    fn test_animation_loop_skips_late_frames() {
        let start = Instant::now();
        let interval = Duration::from_millis(10);
        let mut frames = AnimationLoop::new(interval);

        assert!(frames.poll(start));
        assert!(!frames.poll(start + Duration::from_millis(5)));
        assert!(frames.poll(start + Duration::from_millis(10)));

        // Stall for many intervals: only one frame runs, then the schedule resumes
        let late = start + Duration::from_millis(100);
        assert!(frames.poll(late));
        assert!(!frames.poll(late + Duration::from_millis(1)));
        assert_eq!(frames.time_until_next(late), interval);
    }

    #[test]
    fn test_cancelled_loop_never_runs() {
        let mut frames = AnimationLoop::new(Duration::from_millis(10));
        let token = frames.token();
        token.cancel();
        assert!(!frames.poll(Instant::now()));
        assert!(frames.is_cancelled());
    }

    #[test]
    fn test_silent_spectrum() {
        let ctx = AudioContext::offline(SAMPLE_RATE);
        let mut viz = SpectrumVisualizer::new(&ctx);
        let mut frames = vec![0.0; 1024];
        ctx.render(&mut frames);

        assert!(viz.tick(Instant::now()));
        assert_eq!(viz.bars().len(), BAR_COUNT);
        assert!(viz.bars().iter().all(|b| b.height_percent == MIN_HEIGHT_PERCENT));
    }

    #[test]
    fn test_tone_raises_bars() {
        let ctx = AudioContext::offline(SAMPLE_RATE);
        let mut viz = SpectrumVisualizer::new(&ctx);
        let mut voice = Voice::new(&ctx, 440.0);
        voice.play();
        let mut frames = vec![0.0; 1024];
        ctx.render(&mut frames);

        viz.step();
        let tallest = viz
            .bars()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.height_percent.total_cmp(&b.1.height_percent))
            .map(|(i, _)| i)
            .unwrap();
        // 440 Hz / 43.07 Hz per bin ≈ bin 10
        assert!((9..=11).contains(&tallest), "tallest bar {tallest}");
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let ctx = AudioContext::offline(SAMPLE_RATE);
        let mut viz = SpectrumVisualizer::new(&ctx);
        viz.cancel_token().cancel();
        assert!(!viz.is_running());
        assert!(!viz.tick(Instant::now()));
    }
}
