//! keytone - A terminal virtual piano.
//!
//! This library provides the core functionality for the piano app: the note
//! table and key dispatch, the audio graph with its voices, analyser and
//! recorder, and the spectrum visualizer.

pub mod app;
pub mod audio;
pub mod error;
pub mod piano;
pub mod session;
pub mod ui;
pub mod visualizer;

// Re-export commonly used types
pub use app::{App, Settings};
pub use audio::{AudioContext, Recorder, Recording, Voice};
pub use error::{PianoError, Result};
pub use piano::{Dispatcher, KeyCode, NoteTable, Row};
pub use session::Session;
pub use visualizer::SpectrumVisualizer;
