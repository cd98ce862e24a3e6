use crate::error::{MergeError, Result};
use serde::Serialize;
use std::fmt;

/// How an attempt list turns into one published grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Policy {
    /// Only the best attempt counts.
    BestOnly,
    /// The best attempt weighs `high_pct`; the other submitted attempts share
    /// the remaining `1 - high_pct` equally.
    Weighted { high_pct: f64 },
}

impl Policy {
    /// Selects the weighted policy.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] unless `0.0 <= high_pct <= 1.0`.
    pub fn weighted(high_pct: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&high_pct) {
            return Err(MergeError::Config(format!(
                "high_pct must be within [0, 1], got {high_pct}"
            )));
        }
        Ok(Policy::Weighted { high_pct })
    }

    pub fn from_high_pct(high_pct: Option<f64>) -> Result<Self> {
        match high_pct {
            Some(p) => Self::weighted(p),
            None => Ok(Policy::BestOnly),
        }
    }

    pub fn is_multi_attempt(&self) -> bool {
        matches!(self, Policy::Weighted { .. })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::BestOnly => write!(f, "best_only"),
            Policy::Weighted { high_pct } => write!(f, "weighted({high_pct})"),
        }
    }
}

/// Index of the first occurrence of the largest value.
fn first_max(attempts: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in attempts.iter().enumerate() {
        match best {
            Some(b) if *v <= attempts[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Reduces an attempt list to its published grade. An empty list is `0.0`.
///
/// Under [`Policy::Weighted`] a zero means "nothing submitted for that slot"
/// and never dilutes the average. If the best attempt is the only nonzero
/// entry it is published unweighted.
pub fn reduce(attempts: &[f64], policy: Policy) -> f64 {
    let Some(top) = first_max(attempts) else {
        return 0.0;
    };
    let m = attempts[top];

    let high_pct = match policy {
        Policy::BestOnly => return m,
        Policy::Weighted { high_pct } => high_pct,
    };

    let rest: Vec<f64> = attempts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != top)
        .map(|(_, v)| *v)
        .filter(|v| *v != 0.0)
        .collect();

    if rest.is_empty() {
        return m;
    }

    let k = rest.len() as f64;
    let share = (1.0 - high_pct) / k;
    m * high_pct + rest.iter().map(|v| v * share).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weighted_distributes_remainder() {
        let g = reduce(&[8.0, 6.0, 4.0], Policy::Weighted { high_pct: 0.6 });
        assert!(close(g, 6.8), "got {g}");
    }

    #[test]
    fn test_weighted_order_of_attempts_irrelevant_for_max() {
        let g = reduce(&[4.0, 8.0, 6.0], Policy::Weighted { high_pct: 0.6 });
        assert!(close(g, 6.8), "got {g}");
    }

    #[test]
    fn test_weighted_single_attempt() {
        for high_pct in [0.0, 0.3, 1.0] {
            assert_eq!(reduce(&[7.0], Policy::Weighted { high_pct }), 7.0);
        }
    }

    #[test]
    fn test_weighted_others_zero() {
        for high_pct in [0.0, 0.5, 0.9] {
            assert_eq!(reduce(&[9.0, 0.0, 0.0], Policy::Weighted { high_pct }), 9.0);
            assert_eq!(reduce(&[0.0, 9.0, 0.0], Policy::Weighted { high_pct }), 9.0);
        }
    }

    #[test]
    fn test_weighted_zeros_do_not_dilute() {
        // Same as [8, 6] on its own.
        let with_gap = reduce(&[8.0, 0.0, 6.0], Policy::Weighted { high_pct: 0.5 });
        let without = reduce(&[8.0, 6.0], Policy::Weighted { high_pct: 0.5 });
        assert!(close(with_gap, 7.0));
        assert!(close(with_gap, without));
    }

    #[test]
    fn test_weighted_tied_max_removes_one_occurrence() {
        // m = 5, rest = [5], 5*0.7 + 5*0.3 = 5
        let g = reduce(&[5.0, 5.0], Policy::Weighted { high_pct: 0.7 });
        assert!(close(g, 5.0));
        // m = 6, rest = [6, 3] → 6*0.5 + 6*0.25 + 3*0.25 = 5.25
        let g = reduce(&[6.0, 3.0, 6.0], Policy::Weighted { high_pct: 0.5 });
        assert!(close(g, 5.25), "got {g}");
    }

    #[test]
    fn test_all_zero_list() {
        assert_eq!(reduce(&[0.0, 0.0, 0.0], Policy::Weighted { high_pct: 0.6 }), 0.0);
    }

    #[test]
    fn test_empty_list_is_zero() {
        assert_eq!(reduce(&[], Policy::BestOnly), 0.0);
        assert_eq!(reduce(&[], Policy::Weighted { high_pct: 0.6 }), 0.0);
    }

    #[test]
    fn test_best_only_is_max() {
        assert_eq!(reduce(&[7.5], Policy::BestOnly), 7.5);
        assert_eq!(reduce(&[3.0, 9.0, 1.0], Policy::BestOnly), 9.0);
    }

    #[test]
    fn test_weighted_rejects_out_of_range() {
        assert!(Policy::weighted(1.5).is_err());
        assert!(Policy::weighted(-0.1).is_err());
        assert!(Policy::weighted(f64::NAN).is_err());
        assert_eq!(
            Policy::weighted(0.6).unwrap(),
            Policy::Weighted { high_pct: 0.6 }
        );
    }

    #[test]
    fn test_from_high_pct_defaults_to_best_only() {
        assert_eq!(Policy::from_high_pct(None).unwrap(), Policy::BestOnly);
    }
}
