//! Utility functions for the library.

/// Computes the log-softmax of `scores` into a freshly allocated vector.
///
/// The computation subtracts the maximum score before exponentiating, so finite
/// inputs cannot overflow. A buffer that is entirely negative infinity maps to
/// itself.
pub fn log_softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return vec![f32::NEG_INFINITY; scores.len()];
    }
    let sum: f32 = scores.iter().map(|&score| (score - max).exp()).sum();
    let log_sum = max + sum.ln();
    scores.iter().map(|&score| score - log_sum).collect()
}

/// Computes `ln(sum(exp(scores)))`, the total probability mass of `scores` in
/// log-space.
///
/// Returns negative infinity for an empty slice or a slice of negative infinities,
/// matching the empty-sum convention.
pub fn log_sum_exp(scores: &[f32]) -> f32 {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    let sum: f32 = scores.iter().map(|&score| (score - max).exp()).sum();
    max + sum.ln()
}
