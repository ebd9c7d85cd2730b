/// Confidence arithmetic shared by the aggregator, the strategy scorers and
/// the DSC calculator. All outputs are in [0.0, 1.0].

/// Clamp a value to the unit interval, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Aggregate confidence from multiple independent evidence sources
/// using the noisy-OR model: p = 1 - Π(1 - p_i)
pub fn aggregate_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let product: f64 = confidences.iter().map(|&p| 1.0 - clamp_unit(p)).product();
    1.0 - product
}

/// Noisy-OR with geometric decay by rank: the strongest item counts in full,
/// the k-th strongest is scaled by `decay^k` before combining.
/// Input order does not matter.
pub fn diminishing_confidence(scores: &[f64], decay: f64) -> f64 {
    let mut sorted: Vec<f64> = scores.iter().copied().map(clamp_unit).collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let decayed: Vec<f64> = sorted
        .iter()
        .enumerate()
        .map(|(rank, s)| s * decay.powi(rank as i32))
        .collect();
    aggregate_confidence(&decayed)
}

/// Weighted mean of (value, weight) pairs. Returns `None` when the total
/// weight is zero.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let total_weight: f64 = pairs.iter().map(|(_, w)| w.max(0.0)).sum();
    if total_weight <= f64::EPSILON {
        return None;
    }
    let sum: f64 = pairs.iter().map(|(v, w)| v * w.max(0.0)).sum();
    Some(sum / total_weight)
}

/// Handle contradictory evidence: net signed confidence with a
/// contradiction penalty (×0.70).
/// signed_confidences: positive = supporting, negative = contradicting
pub fn contradictory_confidence(signed_confidences: &[f64]) -> f64 {
    let net: f64 = signed_confidences.iter().sum::<f64>().abs();
    (net * 0.70).min(1.0)
}

/// Logistic function, used to turn summed log-odds into a probability.
pub fn sigmoid(log_odds: f64) -> f64 {
    1.0 / (1.0 + (-log_odds).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_noisy_or() {
        // Two independent pieces of evidence at 0.7 each
        // Expected: 1 - (0.3 * 0.3) = 0.91
        let agg = aggregate_confidence(&[0.7, 0.7]);
        assert!((agg - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_diminishing_strongest_dominates() {
        let single = diminishing_confidence(&[0.8], 0.25);
        let with_weak = diminishing_confidence(&[0.2, 0.8, 0.2], 0.25);
        assert!((single - 0.8).abs() < 1e-9);
        assert!(with_weak > single);
        // 1 - 0.2 * (1 - 0.05) * (1 - 0.0125)
        assert!((with_weak - 0.812375).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_mean() {
        assert_eq!(weighted_mean(&[]), None);
        let m = weighted_mean(&[(1.0, 3.0), (0.0, 1.0)]).unwrap();
        assert!((m - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_contradiction_penalty() {
        let c = contradictory_confidence(&[0.9, -0.5]);
        assert!((c - 0.28).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(1.4), 1.0);
    }
}
