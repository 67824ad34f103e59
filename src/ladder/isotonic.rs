//! Monotone repair of quoted probabilities

/// Weighted Pool Adjacent Violators Algorithm.
///
/// Returns the non-decreasing sequence closest to `y` in weighted least
/// squares. Adjacent blocks that violate the ordering are pooled into their
/// weighted mean until no violation remains.
pub fn pava(y: &[f64], weights: &[f64]) -> Vec<f64> {
    debug_assert_eq!(y.len(), weights.len());
    if y.is_empty() {
        return vec![];
    }

    // (pooled value, pooled weight, number of points)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(y.len());

    for (&value, &weight) in y.iter().zip(weights.iter()) {
        blocks.push((value, weight.max(f64::MIN_POSITIVE), 1));

        while blocks.len() > 1 {
            let last = blocks[blocks.len() - 1];
            let prev = blocks[blocks.len() - 2];
            if prev.0 <= last.0 {
                break;
            }
            let total_weight = prev.1 + last.1;
            let merged_value = (prev.0 * prev.1 + last.0 * last.1) / total_weight;
            blocks.pop();
            if let Some(tail) = blocks.last_mut() {
                *tail = (merged_value, total_weight, prev.2 + last.2);
            }
        }
    }

    blocks
        .into_iter()
        .flat_map(|(value, _, count)| std::iter::repeat(value).take(count))
        .collect()
}

/// Whether a sequence is already non-decreasing
pub fn is_monotone(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}
