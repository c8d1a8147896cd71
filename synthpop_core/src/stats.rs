//! Aggregate statistics over generated entities.

/// Arithmetic mean, or `None` for an empty sample.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n > 0 {
        Some(sum / n as f64)
    } else {
        None
    }
}

/// Share of `total` that `hits` represents. Zero when `total` is zero.
pub fn proportion(hits: usize, total: usize) -> f64 {
    if total > 0 {
        hits as f64 / total as f64
    } else {
        0.0
    }
}

/// `|actual - target| / |target|`.
///
/// Infinite when the target is zero and the actual is not; zero when both are.
pub fn relative_error(actual: f64, target: f64) -> f64 {
    if target == 0.0 {
        if actual == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (actual - target).abs() / target.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_relative_eq!(mean([1.0, 2.0, 6.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_proportion() {
        assert_eq!(proportion(0, 0), 0.0);
        assert_relative_eq!(proportion(1, 4), 0.25);
    }

    #[test]
    fn test_relative_error() {
        assert_relative_eq!(relative_error(47.25, 45.0), 0.05, epsilon = 1e-12);
        assert_eq!(relative_error(0.0, 0.0), 0.0);
        assert!(relative_error(0.1, 0.0).is_infinite());
    }
}
