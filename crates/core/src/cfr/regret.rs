/// Converts cumulative regrets to a strategy using regret matching.
///
/// Positive regrets are normalized to sum to 1; if no regret is positive,
/// the strategy is uniform over all actions.
#[must_use]
pub fn regret_match(regrets: &[f64]) -> Vec<f64> {
    let positive_sum: f64 = regrets.iter().filter(|&&r| r > 0.0).sum();

    if positive_sum > 0.0 {
        regrets
            .iter()
            .map(|&r| if r > 0.0 { r / positive_sum } else { 0.0 })
            .collect()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / regrets.len() as f64;
        vec![uniform; regrets.len()]
    }
}
