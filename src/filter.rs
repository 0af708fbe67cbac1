/// Indices of scores strictly above `threshold`, highest score first.
///
/// Equal scores keep their original index order, so the output is fully
/// determined by the input. `top_k` caps the result after sorting.
pub fn score_filter(scores: &[f32], threshold: f32, top_k: Option<usize>) -> Vec<usize> {
    let mut order: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score > threshold)
        .map(|(idx, _)| idx)
        .collect();

    // stable sort: ties stay in ascending index order
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    if let Some(k) = top_k {
        order.truncate(k);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_above_threshold() {
        let scores = [0.5, 0.51, 0.2, 0.9];
        assert_eq!(score_filter(&scores, 0.5, None), vec![3, 1]);
    }

    #[test]
    fn ties_by_index() {
        let scores = [0.7, 0.9, 0.7, 0.9, 0.7];
        assert_eq!(score_filter(&scores, 0.0, None), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn top_k_caps() {
        let scores = [0.1, 0.4, 0.3, 0.2];
        assert_eq!(score_filter(&scores, 0.0, Some(2)), vec![1, 2]);
        assert_eq!(score_filter(&scores, 0.0, Some(10)).len(), 4);
    }

    #[test]
    fn nan_never_passes() {
        let scores = [f32::NAN, 0.6];
        assert_eq!(score_filter(&scores, 0.5, None), vec![1]);
    }

    #[test]
    fn empty() {
        assert!(score_filter(&[], 0.5, None).is_empty());
    }
}
