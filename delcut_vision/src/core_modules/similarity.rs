// THEORY:
// The similarity comparator scores how alike two color signatures are. It is a plain
// Pearson correlation over corresponding bins: 1.0 when the two distributions rise and
// fall together, 0 when unrelated, negative when one is busy where the other is empty.
//
// Correlation ignores the absolute scale of each histogram, which is exactly why the
// histograms are min-max normalized instead of normalized to unit mass: only the
// relative shape of the distribution matters.
//
// A histogram with zero variance (every bin equal, including the all-zero histogram of
// a flat input) carries no shape to correlate with. The comparator reports 0.0 for it
// instead of dividing by zero.

use crate::core_modules::signature::FeatureSignature;

/// Pearson correlation of two equally sized slices, clamped to [-1, 1].
///
/// Returns 0.0 when either side has zero variance or the slices are empty.
pub fn correlation(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let count = a.len().min(b.len());
    if count == 0 {
        return 0.0;
    }

    let mean_a = a[..count].iter().map(|v| *v as f64).sum::<f64>() / count as f64;
    let mean_b = b[..count].iter().map(|v| *v as f64).sum::<f64>() / count as f64;

    let mut numerator = 0.0f64;
    let mut spread_a = 0.0f64;
    let mut spread_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = *x as f64 - mean_a;
        let dy = *y as f64 - mean_b;
        numerator += dx * dy;
        spread_a += dx * dx;
        spread_b += dy * dy;
    }

    let denominator = spread_a.sqrt() * spread_b.sqrt();
    if denominator <= f64::EPSILON {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Color similarity between two signatures. Texture scores are not involved.
///
/// Signatures with different histogram shapes are not comparable; they score 0.0.
/// Callers that need to surface that as an error use `ColorHistogram::correlation`.
pub fn compare_signatures(a: &FeatureSignature, b: &FeatureSignature) -> f64 {
    match a.color_histogram().correlation(b.color_histogram()) {
        Ok(similarity) => similarity,
        Err(err) => {
            log::warn!("{err}; treating similarity as 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::histogram::ColorHistogram;

    fn signature(values: Vec<f32>) -> FeatureSignature {
        let len = values.len();
        FeatureSignature::new(10.0, ColorHistogram::from_counts(1, len, values).unwrap())
    }

    #[test]
    fn identical_distributions_correlate_fully() {
        let a = signature(vec![0.0, 3.0, 1.0, 7.0, 2.0]);
        assert!((compare_signatures(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mirrored_distributions_anti_correlate() {
        let a = signature(vec![0.0, 1.0, 2.0, 3.0]);
        let b = signature(vec![3.0, 2.0, 1.0, 0.0]);
        assert!((compare_signatures(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn comparison_is_commutative() {
        let a = signature(vec![0.0, 5.0, 1.0, 4.0, 9.0, 2.0]);
        let b = signature(vec![1.0, 4.0, 0.0, 6.0, 3.0, 3.0]);
        assert_eq!(compare_signatures(&a, &b), compare_signatures(&b, &a));
    }

    #[test]
    fn zero_variance_scores_exactly_zero() {
        let flat = signature(vec![4.0; 6]);
        let busy = signature(vec![0.0, 5.0, 1.0, 4.0, 9.0, 2.0]);
        let similarity = compare_signatures(&flat, &busy);
        assert_eq!(similarity, 0.0);
        assert!(!similarity.is_nan());
        assert_eq!(compare_signatures(&flat, &flat), 0.0);
    }

    #[test]
    fn known_correlation_value() {
        // Orthogonal zero-mean components mixed at 0.5 / sqrt(0.75).
        let a = [1.0f32, -1.0, 0.0, 0.0];
        let mix = 0.75f32.sqrt();
        let b = [0.5f32, -0.5, mix, -mix];
        assert!((correlation(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mismatched_shapes_score_zero() {
        let a = signature(vec![0.0, 1.0, 2.0]);
        let b = signature(vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(compare_signatures(&a, &b), 0.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(correlation(&[], &[]), 0.0);
    }
}
