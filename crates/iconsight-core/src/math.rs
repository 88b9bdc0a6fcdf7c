//! Shared math utilities.

/// Convert raw logits into a probability distribution.
///
/// Subtracts the maximum logit before exponentiating so large logits do not
/// overflow. An empty slice yields an empty distribution.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Indices of `values` ordered by value, highest first.
///
/// Exact ties keep ascending index order.
pub fn rank_descending(values: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}
