//! Conversion between exported grade tokens and numeric scores.
//!
//! Exports use a comma as the decimal separator (`"7,50"`), and the
//! consolidated roster is written back in the same notation.

use crate::error::{MergeError, Result};

/// Parses a raw grade token.
///
/// `ungraded_marker` maps to `0.0`. Anything else must be a finite decimal
/// number once the comma separator is swapped for a dot.
///
/// # Errors
///
/// Returns [`MergeError::Format`] for any other token.
pub fn normalize(raw_token: &str, ungraded_marker: &str) -> Result<f64> {
    if raw_token.trim() == ungraded_marker {
        return Ok(0.0);
    }

    let dotted = raw_token.trim().replace(',', ".");
    match dotted.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MergeError::Format {
            token: raw_token.to_string(),
        }),
    }
}

/// Formats a score with exactly two fractional digits and a comma separator.
pub fn format_grade(score: f64) -> String {
    format!("{score:.2}").replace('.', ",")
}
