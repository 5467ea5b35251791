//! Incompatible character scanning for legacy text encodings.
//!
//! Before an editor saves a document in an encoding such as Shift_JIS or
//! windows-1252, it needs to know which characters would be lost or
//! altered. [`scan_incompatible_characters`] answers that by round-tripping
//! the text through the encoding lossily and locating every character that
//! did not survive. Each finding carries its substitute, its UTF-16 offset,
//! and its line number.
//!
//! Characters are extended grapheme clusters. Offsets use UTF-16 code units
//! so they can be handed directly to range-based text APIs.

/// Trait for the text encoding collaborator.
///
/// Implementors answer whether a text fits an encoding and provide the
/// encoding's lossy round trip.
pub trait Codec {
    /// Human-readable encoding name, used in logs and reports.
    fn name(&self) -> &str;

    /// Whether every character of `text` can be encoded without loss.
    fn can_represent(&self, text: &str) -> bool;

    /// Encode `text` with the codec's lossy substitution policy and decode
    /// the bytes back.
    ///
    /// A conforming codec always succeeds; an `Err` is a contract violation.
    fn lossy_round_trip(&self, text: &str) -> Result<String, CodecError>;
}

// Blanket implementation for references to Codecs
impl<T: Codec + ?Sized> Codec for &T {
    fn name(&self) -> &str {
        (*self).name()
    }

    fn can_represent(&self, text: &str) -> bool {
        (*self).can_represent(text)
    }

    fn lossy_round_trip(&self, text: &str) -> Result<String, CodecError> {
        (*self).lossy_round_trip(text)
    }
}

mod character;
mod codec;
pub mod diff;
mod error;
pub mod position;
mod scan;

pub use character::IncompatibleCharacter;
pub use codec::TextEncoding;
pub use error::{CodecError, ScanError};
pub use position::{Position, PositionResolver};
pub use scan::{
    scan, scan_incompatible_characters, CancellationToken, Findings, LocatorKind, ScanConfig,
    ScanPhase,
};

/// Default character count above which equal-length texts are compared
/// pairwise instead of diffed.
pub const QUICK_FIND_THRESHOLD: usize = 10_000;
