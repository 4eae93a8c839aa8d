//! Scrub slider quantization.
//!
//! A scrub slider reports positions continuously while it is dragged. The
//! controller maps each position onto a ledger entry and only emits a request
//! when that changes what the ledger should be showing.

use crate::ledger::DisplayIndex;
use tracing::trace;

/// A navigation request produced by scrubbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubRequest {
    /// View the ledger entry at this zero-based index.
    Seek(usize),
    /// Go back to the live state.
    ReturnToTip,
}

/// Map a slider fraction onto a one-based ledger position in `[1, count]`.
///
/// `round(0.5 + fraction * count)`, rounding halves up, so every entry owns a
/// full slider step. Returns `None` for an empty ledger or a NaN input;
/// fractions outside `[0, 1]` are clamped.
pub fn quantize(fraction: f64, count: usize) -> Option<usize> {
    if count == 0 || fraction.is_nan() {
        return None;
    }

    let fraction = fraction.clamp(0.0, 1.0);
    let target = (0.5 + fraction * count as f64).round() as usize;
    Some(target.clamp(1, count))
}

/// Turns slider input into de-duplicated [`ScrubRequest`]s.
#[derive(Debug, Default)]
pub struct ScrubController {
    /// Last emitted request and the ledger view it was computed against.
    last: Option<(ScrubRequest, DisplayIndex)>,
}

impl ScrubController {
    /// Create a controller that has emitted nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one slider position.
    ///
    /// Returns a request only when the quantized target differs from what the
    /// ledger is already showing, and never repeats the previous request while
    /// the ledger view is unchanged.
    pub fn input(&mut self, fraction: f64, display: DisplayIndex) -> Option<ScrubRequest> {
        let target = quantize(fraction, display.count)?;

        let request = if target >= display.count {
            if display.is_tip() {
                return None;
            }
            ScrubRequest::ReturnToTip
        } else {
            let index = target - 1;
            if display.position == index {
                return None;
            }
            ScrubRequest::Seek(index)
        };

        if self.last == Some((request, display)) {
            trace!(?request, "Duplicate scrub request suppressed");
            return None;
        }

        self.last = Some((request, display));
        trace!(?request, fraction, "Scrub request");
        Some(request)
    }

    /// Forget the last emitted request.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
