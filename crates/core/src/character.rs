//! The value record reported for each incompatible character.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::position::utf16_len;

/// A character that does not survive a lossy round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompatibleCharacter {
    character: String,
    converted_character: Option<String>,
    location: usize,
    line_number: usize,
}

impl IncompatibleCharacter {
    pub fn new(
        character: impl Into<String>,
        converted_character: Option<String>,
        location: usize,
        line_number: usize,
    ) -> Self {
        Self {
            character: character.into(),
            converted_character,
            location,
            line_number,
        }
    }

    /// The original character, exactly one grapheme cluster.
    pub fn character(&self) -> &str {
        &self.character
    }

    /// The codec's substitute for the character, if it produced one.
    pub fn converted_character(&self) -> Option<&str> {
        self.converted_character.as_deref()
    }

    /// Start of the character in the original text, in UTF-16 code units.
    pub fn location(&self) -> usize {
        self.location
    }

    /// 1-based line of [`location`](Self::location) in the original text.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// UTF-16 range covered by the character.
    pub fn range(&self) -> Range<usize> {
        self.location..self.location + utf16_len(&self.character)
    }
}

impl fmt::Display for IncompatibleCharacter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<IncompatibleCharacter: {} -{}>", self.character, self.location)
    }
}
