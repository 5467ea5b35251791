//! Mapping from character indices to UTF-16 offsets and line numbers.

/// Resolved position of a character within the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Offset in UTF-16 code units.
    pub utf16_offset: usize,
    /// 1-based line number.
    pub line_number: usize,
}

/// Whether a character ends a line.
///
/// `"\r\n"` is a single grapheme cluster, so it counts once.
pub fn is_line_break(character: &str) -> bool {
    matches!(
        character,
        "\n" | "\r" | "\r\n" | "\u{0085}" | "\u{2028}" | "\u{2029}"
    )
}

/// Forward cursor over a segmented text.
///
/// The resolver holds only its cursor; every call must pass the same
/// character slice. Queries in ascending order cost O(n) in total. A query
/// behind the cursor restarts from the beginning.
#[derive(Debug, Clone)]
pub struct PositionResolver {
    index: usize,
    position: Position,
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionResolver {
    pub fn new() -> Self {
        Self {
            index: 0,
            position: Position {
                utf16_offset: 0,
                line_number: 1,
            },
        }
    }

    /// Resolve the character at `index` of `characters`.
    ///
    /// The line number counts the breaks strictly before the character, so a
    /// line break reports the line it terminates.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end of `characters`.
    pub fn resolve<S: AsRef<str>>(&mut self, characters: &[S], index: usize) -> Position {
        assert!(
            index <= characters.len(),
            "character index {} out of bounds ({} characters)",
            index,
            characters.len()
        );

        if index < self.index {
            *self = Self::new();
        }

        for character in &characters[self.index..index] {
            let character = character.as_ref();
            self.position.utf16_offset += utf16_len(character);
            if is_line_break(character) {
                self.position.line_number += 1;
            }
        }
        self.index = index;

        self.position
    }
}

/// Number of UTF-16 code units needed to encode `s`.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}
