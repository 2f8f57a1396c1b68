/// Percentage that `part` represents of `total`, 0 when the total is not positive
pub fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Arithmetic mean, `None` for an empty series
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Consecutive differences `values[i] - values[i - 1]`
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Round half away from zero to a fixed number of decimals
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Gini coefficient of a distribution of non-negative amounts
///
/// Uses the rank-weighted form `(2 * sum(i * x_i)) / (n * sum(x)) - (n + 1) / n`
/// over the ascending-sorted values with 1-indexed ranks. Returns 0 for an empty
/// series or one that sums to zero; the result is clamped to `[0, 1]` to absorb
/// rounding on perfectly equal inputs.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let total: f64 = sorted.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let n = sorted.len() as f64;
    let rank_weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, value)| (i + 1) as f64 * value)
        .sum();

    let gini = (2.0 * rank_weighted) / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

/// Herfindahl-Hirschman Index on the 0-10000 scale
///
/// Each share is expressed in percent (0-100) of the series total before squaring.
pub fn herfindahl_index(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return 0.0;
    }

    values
        .iter()
        .map(|value| {
            let share = value / total * 100.0;
            share * share
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_zero_total() {
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert_eq!(percent_of(5.0, 20.0), 25.0);
    }

    #[test]
    fn test_first_differences() {
        let diffs = first_differences(&[0.0, 10.0, 25.0]);
        assert_eq!(diffs, vec![10.0, 15.0]);
        assert!(first_differences(&[1.0]).is_empty());
    }

    #[test]
    fn test_gini_single_value_is_zero() {
        assert_eq!(gini_coefficient(&[42_000.0]), 0.0);
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_gini_concentrated() {
        let mut values = vec![0.0; 99];
        values.push(1_000_000.0);
        let gini = gini_coefficient(&values);
        assert!(gini > 0.98 && gini <= 1.0);
    }

    #[test]
    fn test_herfindahl_single_and_equal() {
        assert_eq!(herfindahl_index(&[500.0]), 10_000.0);

        let hhi = herfindahl_index(&[10.0, 10.0, 10.0, 10.0]);
        assert!((hhi - 2_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(-1.005, 0), -1.0);
    }
}
