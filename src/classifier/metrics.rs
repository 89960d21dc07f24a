//! Evaluation metrics for fitted models

/// Fraction of predictions on the correct side of 0.5.
///
/// Returns `None` for an empty evaluation set.
pub fn accuracy(probabilities: &[f64], targets: &[f64]) -> Option<f64> {
    if probabilities.is_empty() || probabilities.len() != targets.len() {
        return None;
    }
    let correct = probabilities
        .iter()
        .zip(targets)
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count();
    Some(correct as f64 / probabilities.len() as f64)
}

/// Area under the ROC curve via the rank-sum formulation, ties averaged.
///
/// Returns `None` unless both classes are present.
pub fn roc_auc(probabilities: &[f64], targets: &[f64]) -> Option<f64> {
    if probabilities.len() != targets.len() {
        return None;
    }
    let positives = targets.iter().filter(|t| **t >= 0.5).count();
    let negatives = targets.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|a, b| probabilities[*a].total_cmp(&probabilities[*b]));

    // Average 1-based ranks across tied scores
    let mut ranks = vec![0.0; order.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && probabilities[order[end]] == probabilities[order[start]] {
            end += 1;
        }
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for idx in &order[start..end] {
            ranks[*idx] = avg_rank;
        }
        start = end;
    }

    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(targets)
        .filter(|(_, t)| **t >= 0.5)
        .map(|(r, _)| *r)
        .sum();
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}
