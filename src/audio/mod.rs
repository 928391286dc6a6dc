//! Audio engine for the piano.
//!
//! This module provides tone synthesis and audio output via rodio.
//! It supports:
//! - A session-scoped mixing graph with an output bus and analysis tap
//! - One free-running triangle oscillator per note
//! - Frequency analysis for the spectrum view
//! - Recording the bus to WAV

pub mod analyser;
pub mod context;
pub mod oscillator;
pub mod recorder;
pub mod voice;

pub use analyser::AnalysisTap;
pub use context::{AudioContext, AudioOutput, SAMPLE_RATE};
pub use recorder::{Recorder, Recording, RecordingId};
pub use voice::Voice;
