//! # Confidence Binning
//!
//! Extraction pipelines report mention confidence as a score in `[0.0, 1.0]`.
//! The wire format has three bits for it, so the score is quantized into
//! eight bins at tag-creation time and only the bin travels.

use crate::types::MAX_CONFIDENCE_BIN;

/// Quantize a confidence score into the 3-bit wire bin.
///
/// `bin = clamp(floor(confidence * 7), 0, 7)`. Out-of-range scores clamp to
/// the nearest bin; NaN maps to bin 0 (no evidence is better than invented
/// evidence).
#[must_use]
pub fn bin_confidence(confidence: f64) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    let binned = (confidence * f64::from(MAX_CONFIDENCE_BIN)).floor();
    binned.clamp(0.0, f64::from(MAX_CONFIDENCE_BIN)) as u8
}

/// Approximate score a bin represents (`bin / 7`), for display only.
#[must_use]
pub fn approximate_confidence(bin: u8) -> f64 {
    f64::from(bin.min(MAX_CONFIDENCE_BIN)) / f64::from(MAX_CONFIDENCE_BIN)
}

// =============================================================================
// TESTS
// =============================================================================
