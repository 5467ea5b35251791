//! Scan orchestration: compatibility check, lossy round trip, and the two
//! locators that turn the round trip into findings.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::character::IncompatibleCharacter;
use crate::diff;
use crate::error::ScanError;
use crate::position::PositionResolver;
use crate::{Codec, QUICK_FIND_THRESHOLD};

/// Configuration for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Character count above which equal-length texts take the pairwise path.
    pub quick_find_threshold: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            quick_find_threshold: QUICK_FIND_THRESHOLD,
        }
    }
}

/// Cooperative cancellation flag shared between a scan and its owner.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Which algorithm locates the incompatible characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    /// Minimal edit-script diff between original and converted characters.
    Exact,
    /// Index-by-index comparison of equal-length texts.
    ///
    /// This is an approximation. If the codec both drops and inserts
    /// characters while keeping the count unchanged, findings after the
    /// first shift may be misplaced or missed.
    Pairwise,
}

impl LocatorKind {
    /// Pick the locator for texts of the given character counts.
    pub fn select(original_len: usize, converted_len: usize, config: &ScanConfig) -> Self {
        if original_len == converted_len && original_len > config.quick_find_threshold {
            Self::Pairwise
        } else {
            Self::Exact
        }
    }
}

/// Lifecycle of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    NotStarted,
    Checking,
    /// The text fits the encoding; there is nothing to locate.
    Compatible,
    RoundTripping,
    Locating,
    Done,
    Cancelled,
}

enum Locator {
    Exact {
        removals: std::vec::IntoIter<usize>,
    },
    Pairwise {
        converted: String,
        bounds: Vec<Range<usize>>,
        index: usize,
    },
}

/// Lazily produced findings of one scan, in ascending location order.
///
/// Cancellation is checked before each finding. Once cancelled, the iterator
/// yields a single `Err(ScanError::Cancelled)` and then ends.
pub struct Findings<'a, C: ?Sized> {
    codec: &'a C,
    cancel: CancellationToken,
    original: Vec<&'a str>,
    locator: Option<Locator>,
    resolver: PositionResolver,
    phase: ScanPhase,
    found: usize,
}

impl<'a, C: Codec + ?Sized> Findings<'a, C> {
    fn finished(codec: &'a C, cancel: &CancellationToken, phase: ScanPhase) -> Self {
        Self {
            codec,
            cancel: cancel.clone(),
            original: Vec::new(),
            locator: None,
            resolver: PositionResolver::new(),
            phase,
            found: 0,
        }
    }

    /// The locator in use, or `None` when there was nothing to locate.
    pub fn locator(&self) -> Option<LocatorKind> {
        match self.locator {
            Some(Locator::Exact { .. }) => Some(LocatorKind::Exact),
            Some(Locator::Pairwise { .. }) => Some(LocatorKind::Pairwise),
            None => None,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Next incompatible character as (index, substitute).
    fn next_candidate(&mut self) -> Option<Result<(usize, Option<String>), ScanError>> {
        let cancel = &self.cancel;
        let original = &self.original;
        let codec = self.codec;

        match self.locator.as_mut()? {
            Locator::Exact { removals } => {
                let index = removals.next()?;
                if cancel.is_cancelled() {
                    return Some(Err(ScanError::Cancelled));
                }
                let converted = codec
                    .lossy_round_trip(original[index])
                    .ok()
                    .filter(|s| !s.is_empty());
                Some(Ok((index, converted)))
            }
            Locator::Pairwise {
                converted,
                bounds,
                index,
            } => {
                while *index < original.len() {
                    if cancel.is_cancelled() {
                        return Some(Err(ScanError::Cancelled));
                    }
                    let i = *index;
                    *index += 1;
                    let substitute = &converted[bounds[i].clone()];
                    if original[i] != substitute {
                        return Some(Ok((i, Some(substitute.to_string()))));
                    }
                }
                None
            }
        }
    }
}

impl<C: Codec + ?Sized> Iterator for Findings<'_, C> {
    type Item = Result<IncompatibleCharacter, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase != ScanPhase::Locating {
            return None;
        }

        match self.next_candidate() {
            Some(Ok((index, converted))) => {
                let position = self.resolver.resolve(&self.original, index);
                self.found += 1;
                Some(Ok(IncompatibleCharacter::new(
                    self.original[index],
                    converted,
                    position.utf16_offset,
                    position.line_number,
                )))
            }
            Some(Err(err)) => {
                warn!(encoding = self.codec.name(), found = self.found, "scan cancelled");
                self.phase = ScanPhase::Cancelled;
                Some(Err(err))
            }
            None => {
                info!(encoding = self.codec.name(), found = self.found, "scan finished");
                self.phase = ScanPhase::Done;
                None
            }
        }
    }
}

impl<C: Codec + ?Sized> std::iter::FusedIterator for Findings<'_, C> {}

/// Start a scan of `text` against `codec`.
///
/// The compatibility check and the lossy round trip run eagerly; findings
/// are produced as the returned iterator is pulled.
pub fn scan<'a, C: Codec + ?Sized>(
    text: &'a str,
    codec: &'a C,
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> Result<Findings<'a, C>, ScanError> {
    if codec.can_represent(text) {
        debug!(encoding = codec.name(), "text is fully representable");
        return Ok(Findings::finished(codec, cancel, ScanPhase::Compatible));
    }

    let converted = match codec.lossy_round_trip(text) {
        Ok(converted) => converted,
        Err(err) => {
            error!(
                encoding = codec.name(),
                text_len = text.len(),
                %err,
                "lossy round trip broke the codec contract; reporting no incompatible characters"
            );
            return Ok(Findings::finished(codec, cancel, ScanPhase::Done));
        }
    };

    if cancel.is_cancelled() {
        warn!(encoding = codec.name(), "scan cancelled before locating");
        return Err(ScanError::Cancelled);
    }

    let original: Vec<&str> = text.graphemes(true).collect();
    let bounds: Vec<Range<usize>> = converted
        .grapheme_indices(true)
        .map(|(start, g)| start..start + g.len())
        .collect();

    let kind = LocatorKind::select(original.len(), bounds.len(), config);
    debug!(
        encoding = codec.name(),
        original_len = original.len(),
        converted_len = bounds.len(),
        locator = ?kind,
        "locating incompatible characters"
    );

    let locator = match kind {
        LocatorKind::Pairwise => Locator::Pairwise {
            converted,
            bounds,
            index: 0,
        },
        LocatorKind::Exact => {
            let converted_chars: Vec<&str> =
                bounds.iter().map(|r| &converted[r.clone()]).collect();
            let removals = diff::removals(&original, &converted_chars, &|| cancel.is_cancelled())
                .map_err(|_| {
                    warn!(encoding = codec.name(), "scan cancelled while diffing");
                    ScanError::Cancelled
                })?;
            Locator::Exact {
                removals: removals.into_iter(),
            }
        }
    };

    Ok(Findings {
        codec,
        cancel: cancel.clone(),
        original,
        locator: Some(locator),
        resolver: PositionResolver::new(),
        phase: ScanPhase::Locating,
        found: 0,
    })
}

/// List the characters of `text` that `codec` cannot preserve.
///
/// Returns an empty list when the text fits the encoding. Findings are
/// ordered by ascending location. A cancelled scan returns
/// [`ScanError::Cancelled`], never a partial list.
pub fn scan_incompatible_characters<C: Codec + ?Sized>(
    text: &str,
    codec: &C,
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> Result<Vec<IncompatibleCharacter>, ScanError> {
    scan(text, codec, config, cancel)?.collect()
}
