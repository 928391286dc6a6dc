//! Error types for the piano core.
//!
//! Lookup misses are not errors: an unmapped key is simply ignored by the
//! dispatcher. Everything here is either a startup validation failure or an
//! I/O problem while loading a keymap or encoding a recording.

use crate::piano::{KeyCode, Row};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the piano, audio context and recorder.
#[derive(Debug, Error)]
pub enum PianoError {
    /// The host has no usable audio output.
    #[error("audio output is not available: {0}")]
    CapabilityMissing(String),

    /// Two playable entries are bound to the same key.
    #[error("key {key} is bound to both {first} and {second}")]
    KeyCollision {
        key: KeyCode,
        first: String,
        second: String,
    },

    /// A table entry is neither a valid note nor a valid gap.
    #[error("invalid {row} entry at position {index}: {reason}")]
    InvalidEntry {
        row: Row,
        index: usize,
        reason: String,
    },

    /// The rendered key elements do not line up with the note table.
    #[error("{row} row has {entries} notes but {elements} key elements")]
    LayoutMismatch {
        row: Row,
        entries: usize,
        elements: usize,
    },

    /// A keymap file could not be read or parsed.
    #[error("failed to load keymap {path}: {message}")]
    Keymap { path: PathBuf, message: String },

    /// A recording could not be encoded.
    #[error("failed to encode recording: {0}")]
    Encode(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PianoError>;
