use crate::constants::{ACCEPTABLE_QUALITY_RANGE, FALLBACK_QUALITY, HIGH_QUALITY_RANGE};
use crate::error::Result;
use crate::probe::SizeProbe;
use image::DynamicImage;

/// Inclusive range of JPEG quality levels searched in one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub low: u8,
    pub high: u8,
}

impl SearchRange {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }
}

/// Phases in search order. A hit in an earlier phase always beats anything a
/// later phase could find.
pub const QUALITY_RANGES: [SearchRange; 2] = [
    SearchRange::new(HIGH_QUALITY_RANGE.0, HIGH_QUALITY_RANGE.1),
    SearchRange::new(ACCEPTABLE_QUALITY_RANGE.0, ACCEPTABLE_QUALITY_RANGE.1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub quality: u8,
    /// Probed size at `quality`, or the last probe taken when nothing fit.
    pub achieved_bytes: u64,
    pub found: bool,
}

/// Finds the highest quality whose encoded size fits in `budget_bytes`.
///
/// Binary-searches 91..=100 first and only falls back to 50..=90 when no
/// quality in the high range fits. Relies on encoded size never increasing as
/// quality goes down. When nothing fits, returns quality 50 with
/// `found == false`.
pub fn search_quality<P: SizeProbe + ?Sized>(
    probe: &P,
    img: &DynamicImage,
    budget_bytes: u64,
) -> Result<SearchOutcome> {
    let mut outcome = SearchOutcome {
        quality: FALLBACK_QUALITY,
        achieved_bytes: 0,
        found: false,
    };

    for range in QUALITY_RANGES {
        let mut low = i32::from(range.low);
        let mut high = i32::from(range.high);

        while low <= high {
            let mid = (low + high) / 2;
            let quality = mid as u8;
            let size = probe.probe_size(img, quality)?;

            if size <= budget_bytes {
                outcome = SearchOutcome {
                    quality,
                    achieved_bytes: size,
                    found: true,
                };
                low = mid + 1;
            } else {
                if !outcome.found {
                    outcome.achieved_bytes = size;
                }
                high = mid - 1;
            }
        }

        if outcome.found {
            break;
        }
        tracing::debug!(low = range.low, high = range.high, "no quality in range fits budget");
    }

    Ok(outcome)
}
