//! The note table: which key plays which frequency.
//!
//! The table has two rows laid out like a piano: natural notes (white keys)
//! and altered notes (black keys). The altered row contains gaps where a
//! piano has no black key; gaps carry no key code so a lookup can never
//! select them.
//!
//! The table is immutable once built. Anything that needs to attach state to
//! a slot (visual elements, voices) keeps a separate index-aligned vector.

use crate::error::{PianoError, Result};
use crate::piano::KeyCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Label used by gap entries.
pub const GAP_LABEL: &str = "-";

/// Default natural notes: (frequency, label, key code).
const DEFAULT_NATURALS: [(f32, &str, u16); 21] = [
    (130.813, "C3", 81),  // Q
    (146.832, "D3", 87),  // W
    (164.814, "E3", 69),  // E
    (174.614, "F3", 82),  // R
    (195.998, "G3", 84),  // T
    (220.0, "A4", 89),    // Y
    (246.942, "B4", 85),  // U
    (261.626, "C4", 73),  // I
    (293.665, "D4", 79),  // O
    (329.628, "E4", 80),  // P
    (349.228, "F4", 219), // [
    (391.995, "G4", 221), // ]
    (440.0, "A5", 90),    // Z
    (493.88, "B5", 88),   // X
    (523.25, "C5", 67),   // C
    (587.33, "D5", 86),   // V
    (659.25, "E5", 66),   // B
    (698.46, "F5", 78),   // N
    (783.99, "G5", 77),   // M
    (880.0, "A6", 188),   // ,
    (987.77, "B6", 190),  // .
];

/// Default altered notes. `None` marks a gap.
const DEFAULT_ALTERED: [Option<(f32, &str, u16)>; 20] = [
    Some((138.591, "C#3", 50)), // 2
    Some((155.563, "D#3", 51)), // 3
    None,
    Some((184.997, "F#3", 53)), // 5
    Some((207.652, "G#3", 54)), // 6
    Some((233.082, "A#4", 55)), // 7
    None,
    Some((277.183, "C#4", 57)), // 9
    Some((311.127, "D#4", 48)), // 0
    None,
    Some((369.994, "F#4", 61)), // =
    Some((415.305, "G#4", 65)), // A
    Some((466.16, "A#5", 83)),  // S
    None,
    Some((554.37, "C#5", 70)), // F
    Some((622.25, "D#5", 71)), // G
    None,
    Some((739.99, "F#5", 74)), // J
    Some((830.61, "G#5", 75)), // K
    Some((932.33, "A#6", 76)), // L
];

/// One of the two rows of the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    /// Natural notes, drawn as white keys.
    Natural,
    /// Sharps and flats, drawn as black keys.
    Altered,
}

impl Row {
    /// Both rows, natural first.
    pub const ALL: [Row; 2] = [Row::Natural, Row::Altered];
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Natural => write!(f, "natural"),
            Row::Altered => write!(f, "altered"),
        }
    }
}

/// A single slot in a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Tone frequency in Hz. Zero for gaps.
    pub frequency: f32,
    /// Display label such as "C#4", or "-" for gaps.
    pub label: String,
    /// Key that plays this note. `None` for gaps.
    #[serde(default)]
    pub key: Option<KeyCode>,
}

impl NoteEntry {
    /// Creates a playable entry.
    pub fn note(frequency: f32, label: impl Into<String>, key: KeyCode) -> Self {
        Self {
            frequency,
            label: label.into(),
            key: Some(key),
        }
    }

    /// Creates a gap entry.
    pub fn gap() -> Self {
        Self {
            frequency: 0.0,
            label: GAP_LABEL.to_string(),
            key: None,
        }
    }

    /// Returns true if this slot has no note.
    pub fn is_gap(&self) -> bool {
        self.key.is_none()
    }

    /// Checks that the entry is either a well-formed note or a well-formed gap.
    fn check(&self) -> std::result::Result<(), String> {
        match self.key {
            None => {
                if self.frequency != 0.0 || self.label != GAP_LABEL {
                    return Err(format!(
                        "entry without a key must be a gap (0 Hz, \"{}\"), got {} Hz \"{}\"",
                        GAP_LABEL, self.frequency, self.label
                    ));
                }
            }
            Some(_) => {
                if !self.frequency.is_finite() || self.frequency <= 0.0 {
                    return Err(format!(
                        "note \"{}\" has invalid frequency {}",
                        self.label, self.frequency
                    ));
                }
                if self.label == GAP_LABEL {
                    return Err("a bound key cannot use the gap label".to_string());
                }
            }
        }
        Ok(())
    }
}

/// On-disk keymap format.
#[derive(Debug, Serialize, Deserialize)]
struct KeymapFile {
    naturals: Vec<NoteEntry>,
    altered: Vec<NoteEntry>,
}

/// The validated, immutable note table.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    naturals: Vec<NoteEntry>,
    altered: Vec<NoteEntry>,
}

impl NoteTable {
    /// Builds a table from two rows, validating it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - An entry is neither a valid note nor an exact gap
    /// - Two notes (in either row) share a key code
    pub fn new(naturals: Vec<NoteEntry>, altered: Vec<NoteEntry>) -> Result<Self> {
        let table = Self { naturals, altered };
        table.validate()?;
        Ok(table)
    }

    /// Loads and validates a keymap from a JSON file.
    ///
    /// The file holds `{"naturals": [...], "altered": [...]}`, each entry
    /// being `{"frequency": 440.0, "label": "A5", "key": 90}`. Gaps are
    /// written as `{"frequency": 0, "label": "-", "key": null}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let keymap_error = |message: String| PianoError::Keymap {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| keymap_error(e.to_string()))?;
        let file: KeymapFile =
            serde_json::from_str(&text).map_err(|e| keymap_error(e.to_string()))?;
        Self::new(file.naturals, file.altered)
    }

    /// Serializes the table in the keymap file format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&KeymapFile {
            naturals: self.naturals.clone(),
            altered: self.altered.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        let mut seen: HashMap<KeyCode, &str> = HashMap::new();

        for row in Row::ALL {
            for (index, entry) in self.row(row).iter().enumerate() {
                entry
                    .check()
                    .map_err(|reason| PianoError::InvalidEntry { row, index, reason })?;

                if let Some(key) = entry.key {
                    if let Some(first) = seen.insert(key, &entry.label) {
                        return Err(PianoError::KeyCollision {
                            key,
                            first: first.to_string(),
                            second: entry.label.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns the entries of a row in keyboard order.
    pub fn row(&self, row: Row) -> &[NoteEntry] {
        match row {
            Row::Natural => &self.naturals,
            Row::Altered => &self.altered,
        }
    }

    /// Returns the entry at a position, if any.
    pub fn entry(&self, row: Row, index: usize) -> Option<&NoteEntry> {
        self.row(row).get(index)
    }

    /// Finds the first slot in `row` bound to `key`.
    ///
    /// Gaps never match because they have no key.
    pub fn position(&self, row: Row, key: KeyCode) -> Option<usize> {
        self.row(row)
            .iter()
            .position(|entry| !entry.is_gap() && entry.key == Some(key))
    }

    /// Total number of playable (non-gap) entries.
    pub fn playable_count(&self) -> usize {
        Row::ALL
            .iter()
            .flat_map(|&row| self.row(row))
            .filter(|entry| !entry.is_gap())
            .count()
    }
}

impl Default for NoteTable {
    /// The built-in two-row layout spanning C3 to B6.
    fn default() -> Self {
        let naturals = DEFAULT_NATURALS
            .iter()
            .map(|&(freq, label, code)| NoteEntry::note(freq, label, KeyCode::new(code)))
            .collect();
        let altered = DEFAULT_ALTERED
            .iter()
            .map(|slot| match *slot {
                Some((freq, label, code)) => NoteEntry::note(freq, label, KeyCode::new(code)),
                None => NoteEntry::gap(),
            })
            .collect();
        Self { naturals, altered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = NoteTable::default();
        assert!(table.validate().is_ok());
        assert_eq!(table.row(Row::Natural).len(), 21);
        assert_eq!(table.row(Row::Altered).len(), 20);
        assert_eq!(table.playable_count(), 36);
    }

    #[test]
    fn test_lookup() {
        let table = NoteTable::default();
        let y = KeyCode::new(89);
        let idx = table.position(Row::Natural, y).unwrap();
        assert_eq!(table.row(Row::Natural)[idx].label, "A4");
        assert_eq!(table.row(Row::Natural)[idx].frequency, 220.0);
        assert_eq!(table.position(Row::Altered, y), None);

        let a = KeyCode::new(65);
        assert_eq!(table.position(Row::Natural, a), None);
        let idx = table.position(Row::Altered, a).unwrap();
        assert_eq!(table.row(Row::Altered)[idx].label, "G#4");
    }

    #[test]
    fn test_gaps_never_match() {
        let table = NoteTable::default();
        for code in 0..=u16::MAX {
            if let Some(idx) = table.position(Row::Altered, KeyCode::new(code)) {
                assert!(!table.row(Row::Altered)[idx].is_gap());
            }
        }
    }

    #[test]
    fn test_rows_are_disjoint() {
        let table = NoteTable::default();
        for entry in table.row(Row::Natural) {
            let key = entry.key.unwrap();
            assert_eq!(table.position(Row::Altered, key), None);
        }
    }

    #[test]
    fn test_collision_rejected() {
        let naturals = vec![
            NoteEntry::note(220.0, "A4", KeyCode::new(65)),
            NoteEntry::note(246.9, "B4", KeyCode::new(66)),
        ];
        let altered = vec![NoteEntry::gap(), NoteEntry::note(233.1, "A#4", KeyCode::new(65))];

        let err = NoteTable::new(naturals, altered).unwrap_err();
        match err {
            PianoError::KeyCollision { key, first, second } => {
                assert_eq!(key, KeyCode::new(65));
                assert_eq!(first, "A4");
                assert_eq!(second, "A#4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_gap_rejected() {
        let bad_gap = NoteEntry {
            frequency: 110.0,
            label: "-".to_string(),
            key: None,
        };
        let err = NoteTable::new(vec![bad_gap], vec![]).unwrap_err();
        assert!(matches!(
            err,
            PianoError::InvalidEntry {
                row: Row::Natural,
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_frequency_note_rejected() {
        let silent = NoteEntry::note(0.0, "C3", KeyCode::new(81));
        assert!(NoteTable::new(vec![silent], vec![]).is_err());
    }

    #[test]
    fn test_json_keymap() {
        let json = r#"{
            "naturals": [
                {"frequency": 261.626, "label": "C4", "key": 81},
                {"frequency": 293.665, "label": "D4", "key": 87}
            ],
            "altered": [
                {"frequency": 277.183, "label": "C#4", "key": 50},
                {"frequency": 0, "label": "-", "key": null}
            ]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keymap.json");
        std::fs::write(&path, json).unwrap();

        let table = NoteTable::from_json_file(&path).unwrap();
        assert_eq!(table.row(Row::Natural).len(), 2);
        assert!(table.row(Row::Altered)[1].is_gap());
        assert_eq!(table.position(Row::Altered, KeyCode::new(50)), Some(0));

        let reloaded: KeymapFile = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.naturals, table.row(Row::Natural));
    }

    #[test]
    fn test_missing_keymap_file() {
        let err = NoteTable::from_json_file("/nonexistent/keymap.json").unwrap_err();
        assert!(matches!(err, PianoError::Keymap { .. }));
    }
}
