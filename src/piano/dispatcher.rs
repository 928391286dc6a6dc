//! Routing key events to voices.
//!
//! The dispatcher owns one voice per playable slot of the note table and
//! one visual element per slot (gaps included). Key-down plays the matching
//! voice and marks its element as playing; key-up reverses both. Keys that
//! match nothing are ignored.

use crate::audio::{AudioContext, Voice};
use crate::error::{PianoError, Result};
use crate::piano::{KeyCode, NoteTable, Row};
use std::sync::Arc;

/// Visual state of one on-screen key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyElement {
    row: Row,
    playing: bool,
}

impl KeyElement {
    fn new(row: Row) -> Self {
        Self {
            row,
            playing: false,
        }
    }

    /// Whether the key is drawn as pressed.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Class string describing the element, e.g. `"white playing"`.
    pub fn class_name(&self) -> String {
        let base = match self.row {
            Row::Natural => "white",
            Row::Altered => "black",
        };
        if self.playing {
            format!("{base} playing")
        } else {
            base.to_string()
        }
    }
}

/// The rendered key elements, index-aligned with the note table rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyElements {
    naturals: Vec<KeyElement>,
    altered: Vec<KeyElement>,
}

impl KeyElements {
    /// Creates `white` natural elements and `black` altered elements.
    pub fn new(white: usize, black: usize) -> Self {
        Self {
            naturals: vec![KeyElement::new(Row::Natural); white],
            altered: vec![KeyElement::new(Row::Altered); black],
        }
    }

    /// Creates exactly one element per table slot.
    pub fn for_table(table: &NoteTable) -> Self {
        Self::new(table.row(Row::Natural).len(), table.row(Row::Altered).len())
    }

    /// Elements of a row in order.
    pub fn row(&self, row: Row) -> &[KeyElement] {
        match row {
            Row::Natural => &self.naturals,
            Row::Altered => &self.altered,
        }
    }

    fn row_mut(&mut self, row: Row) -> &mut [KeyElement] {
        match row {
            Row::Natural => &mut self.naturals,
            Row::Altered => &mut self.altered,
        }
    }

    fn set_playing(&mut self, row: Row, index: usize, playing: bool) {
        if let Some(element) = self.row_mut(row).get_mut(index) {
            element.playing = playing;
        }
    }
}

/// Routes key events to voices and key elements.
pub struct Dispatcher {
    table: Arc<NoteTable>,
    elements: KeyElements,
    /// One slot per natural entry.
    naturals: Vec<Option<Voice>>,
    /// One slot per altered entry; gaps have no voice.
    altered: Vec<Option<Voice>>,
}

impl Dispatcher {
    /// Binds `elements` to `table` and allocates a voice for every note.
    ///
    /// # Errors
    ///
    /// Returns `PianoError::LayoutMismatch` if a row has a different number
    /// of elements than table entries.
    pub fn new(table: Arc<NoteTable>, elements: KeyElements, ctx: &AudioContext) -> Result<Self> {
        for row in Row::ALL {
            let entries = table.row(row).len();
            let rendered = elements.row(row).len();
            if entries != rendered {
                return Err(PianoError::LayoutMismatch {
                    row,
                    entries,
                    elements: rendered,
                });
            }
        }

        let voices_for = |row: Row| -> Vec<Option<Voice>> {
            table
                .row(row)
                .iter()
                .map(|entry| (!entry.is_gap()).then(|| Voice::new(ctx, entry.frequency)))
                .collect()
        };
        let naturals = voices_for(Row::Natural);
        let altered = voices_for(Row::Altered);

        Ok(Self {
            table,
            elements,
            naturals,
            altered,
        })
    }

    fn voices_mut(&mut self, row: Row) -> &mut [Option<Voice>] {
        match row {
            Row::Natural => &mut self.naturals,
            Row::Altered => &mut self.altered,
        }
    }

    fn voices(&self, row: Row) -> &[Option<Voice>] {
        match row {
            Row::Natural => &self.naturals,
            Row::Altered => &self.altered,
        }
    }

    /// Handles a key press. Returns true if the key is bound to a note.
    pub fn on_key_down(&mut self, key: KeyCode) -> bool {
        let mut matched = false;
        for row in Row::ALL {
            if let Some(index) = self.table.position(row, key) {
                self.elements.set_playing(row, index, true);
                if let Some(Some(voice)) = self.voices_mut(row).get_mut(index) {
                    voice.play();
                }
                matched = true;
            }
        }
        matched
    }

    /// Handles a key release. Returns true if the key is bound to a note.
    pub fn on_key_up(&mut self, key: KeyCode) -> bool {
        let mut matched = false;
        for row in Row::ALL {
            if let Some(index) = self.table.position(row, key) {
                self.elements.set_playing(row, index, false);
                if let Some(Some(voice)) = self.voices_mut(row).get_mut(index) {
                    voice.stop();
                }
                matched = true;
            }
        }
        matched
    }

    /// Resolves the key bound to an on-screen slot.
    pub fn key_at(&self, row: Row, index: usize) -> Option<KeyCode> {
        self.table.entry(row, index).and_then(|entry| entry.key)
    }

    /// Presses the on-screen key at a slot. Gaps are ignored.
    pub fn on_pointer_down(&mut self, row: Row, index: usize) -> Option<KeyCode> {
        let key = self.key_at(row, index)?;
        self.on_key_down(key);
        Some(key)
    }

    /// Releases the on-screen key at a slot. Gaps are ignored.
    pub fn on_pointer_up(&mut self, row: Row, index: usize) -> Option<KeyCode> {
        let key = self.key_at(row, index)?;
        self.on_key_up(key);
        Some(key)
    }

    /// Silences every voice and resets every element, whatever their state.
    pub fn stop_all(&mut self) {
        for row in Row::ALL {
            for index in 0..self.elements.row(row).len() {
                self.elements.set_playing(row, index, false);
            }
            for voice in self.voices_mut(row).iter_mut().flatten() {
                voice.stop();
            }
        }
    }

    /// Whether the voice at a slot is sounding. Gaps never sound.
    pub fn is_sounding(&self, row: Row, index: usize) -> bool {
        matches!(self.voices(row).get(index), Some(Some(voice)) if voice.is_sounding())
    }

    /// Whether a slot has a voice at all.
    pub fn has_voice(&self, row: Row, index: usize) -> bool {
        matches!(self.voices(row).get(index), Some(Some(_)))
    }

    /// Number of voices currently sounding.
    pub fn sounding_count(&self) -> usize {
        Row::ALL
            .iter()
            .flat_map(|&row| self.voices(row).iter().flatten())
            .filter(|voice| voice.is_sounding())
            .count()
    }

    pub fn elements(&self) -> &KeyElements {
        &self.elements
    }

    pub fn element(&self, row: Row, index: usize) -> Option<&KeyElement> {
        self.elements.row(row).get(index)
    }

    pub fn table(&self) -> &NoteTable {
        &self.table
    }
}
