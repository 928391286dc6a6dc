//! Numeric key identities.
//!
//! Keys are identified by browser-style key codes so keymaps stay
//! portable: letters use their uppercase ASCII value, digits their ASCII
//! value, and a handful of punctuation keys use the codes browsers report
//! for them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Punctuation keys and their codes.
const PUNCTUATION: [(char, u16); 5] = [
    ('[', 219),
    (']', 221),
    (',', 188),
    ('.', 190),
    ('=', 61),
];

/// A physical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(u16);

impl KeyCode {
    /// Wraps a raw key code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the raw key code.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Resolves the key code for a typed character.
    ///
    /// Letters are case-insensitive. Returns `None` for characters that have
    /// no key code in the mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use keytone::piano::KeyCode;
    ///
    /// assert_eq!(KeyCode::from_char('q'), Some(KeyCode::new(81)));
    /// assert_eq!(KeyCode::from_char('['), Some(KeyCode::new(219)));
    /// assert_eq!(KeyCode::from_char('~'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        if c.is_ascii_alphabetic() {
            return Some(Self(c.to_ascii_uppercase() as u16));
        }
        if c.is_ascii_digit() {
            return Some(Self(c as u16));
        }
        PUNCTUATION
            .iter()
            .find(|(p, _)| *p == c)
            .map(|(_, code)| Self(*code))
    }

    /// Returns the character printed on the key, if it is a known key.
    pub fn to_char(self) -> Option<char> {
        let c = char::from_u32(self.0 as u32)?;
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(c);
        }
        PUNCTUATION
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(p, _)| *p)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_char() {
            Some(c) => write!(f, "{} ({})", self.0, c),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_are_case_insensitive() {
        assert_eq!(KeyCode::from_char('a'), KeyCode::from_char('A'));
        assert_eq!(KeyCode::from_char('a'), Some(KeyCode::new(65)));
    }

    #[test]
    fn test_char_round_trip_for_mapped_keys() {
        for c in ['Q', '2', '[', ']', ',', '.', '='] {
            let key = KeyCode::from_char(c).unwrap();
            assert_eq!(key.to_char(), Some(c));
        }
    }

    #[test]
    fn test_display_includes_character() {
        assert_eq!(KeyCode::new(89).to_string(), "89 (Y)");
        assert_eq!(KeyCode::new(1).to_string(), "1");
    }
}
