//! Keyboard-to-tone mapping.
//!
//! This module holds the immutable note table, the key codes used to address
//! it, and the dispatcher that turns key events into voice state changes.

mod dispatcher;
mod key;
mod note_table;

pub use dispatcher::{Dispatcher, KeyElement, KeyElements};
pub use key::KeyCode;
pub use note_table::{NoteEntry, NoteTable, Row};
