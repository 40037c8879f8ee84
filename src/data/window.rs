use super::model::{Sample, Sequence};

/// Fewest non-missing samples a window must hold to yield a mean.
pub fn min_samples(window: usize) -> usize {
    window.div_ceil(3).max(1)
}

/// Half-open bounds of the centered window around `i`, clamped to `len`.
///
/// The window spans `[i - floor(w/2), i + ceil(w/2))`, the same split as a
/// centered pandas rolling window.
fn window_bounds(i: usize, window: usize, len: usize) -> (usize, usize) {
    let before = window / 2;
    let after = window - before;
    (i.saturating_sub(before), (i + after).min(len))
}

/// Centered rolling mean of `values`.
///
/// Missing samples count neither towards the sum nor towards the sample
/// count. Positions whose window holds fewer than [`min_samples`] present
/// samples come out missing. A window longer than the sequence simply uses
/// whatever is available.
///
/// Runs in a single pass: the window's sum and count are updated as samples
/// enter on the right and leave on the left.
pub fn rolling_mean(values: &[Sample], window: usize) -> Sequence {
    let floor = min_samples(window);
    let len = values.len();
    let mut means = Vec::with_capacity(len);
    let (mut sum, mut count) = (0.0, 0usize);
    let (mut start, mut end) = (0, 0);

    for i in 0..len {
        let (lo, hi) = window_bounds(i, window, len);
        for v in values[end..hi].iter().flatten().filter(|v| v.is_finite()) {
            sum += v;
            count += 1;
        }
        for v in values[start..lo].iter().flatten().filter(|v| v.is_finite()) {
            sum -= v;
            count -= 1;
        }
        (start, end) = (lo, hi);
        if count == 0 {
            // Drop accumulated rounding error once the window empties.
            sum = 0.0;
        }
        means.push((count >= floor).then(|| sum / count as f64));
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn present(values: &[f64]) -> Sequence {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_min_samples() {
        assert_eq!(min_samples(1), 1);
        assert_eq!(min_samples(2), 1);
        assert_eq!(min_samples(3), 1);
        assert_eq!(min_samples(4), 2);
        assert_eq!(min_samples(9), 3);
        assert_eq!(min_samples(60), 20);
    }

    #[test]
    fn test_window_bounds_odd_and_even() {
        assert_eq!(window_bounds(4, 5, 9), (2, 7));
        assert_eq!(window_bounds(4, 4, 9), (2, 6));
        assert_eq!(window_bounds(0, 5, 9), (0, 3));
        assert_eq!(window_bounds(8, 5, 9), (6, 9));
    }

    #[test]
    fn test_rolling_mean_centered() {
        let mean = rolling_mean(&present(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert_relative_eq!(mean[0].unwrap(), 1.5);
        assert_relative_eq!(mean[1].unwrap(), 2.0);
        assert_relative_eq!(mean[2].unwrap(), 3.0);
        assert_relative_eq!(mean[3].unwrap(), 4.0);
        assert_relative_eq!(mean[4].unwrap(), 4.5);
    }

    #[test]
    fn test_rolling_mean_skips_missing() {
        let values = vec![Some(1.0), None, Some(3.0)];
        let mean = rolling_mean(&values, 3);
        assert_relative_eq!(mean[1].unwrap(), 2.0);
        assert_eq!(mean.len(), 3);
    }

    #[test]
    fn test_rolling_mean_sample_floor() {
        // Window 9 needs at least three present samples.
        let mut values: Sequence = vec![None; 12];
        values[0] = Some(1.0);
        values[1] = Some(2.0);
        values[11] = Some(5.0);
        let mean = rolling_mean(&values, 9);
        // Row 0 sees rows 0..5: only two samples.
        assert_eq!(mean[0], None);
        // Row 6 sees rows 2..11: nothing at all.
        assert_eq!(mean[6], None);

        values[2] = Some(3.0);
        let mean = rolling_mean(&values, 9);
        assert_relative_eq!(mean[0].unwrap(), 2.0);
    }

    #[test]
    fn test_window_longer_than_sequence() {
        let mean = rolling_mean(&present(&[2.0, 4.0, 6.0]), 50);
        // ceil(50 / 3) = 17 samples required, only three exist.
        assert!(mean.iter().all(Option::is_none));

        let mean = rolling_mean(&present(&[2.0, 4.0, 6.0]), 8);
        for m in mean {
            assert_relative_eq!(m.unwrap(), 4.0);
        }
    }

    #[test]
    fn test_running_sum_matches_direct_mean() {
        let values: Sequence = (0..500)
            .map(|i| {
                let spike = if i % 53 == 0 { 90.0 } else { 0.0 };
                (i % 7 != 3).then(|| (i as f64 * 0.37).sin() * 4.0 + spike)
            })
            .collect();
        for window in [1, 2, 5, 60, 501] {
            let mean = rolling_mean(&values, window);
            for (i, m) in mean.iter().enumerate() {
                let (start, end) = window_bounds(i, window, values.len());
                let present: Vec<f64> = values[start..end].iter().flatten().copied().collect();
                if present.len() >= min_samples(window) {
                    let direct = present.iter().sum::<f64>() / present.len() as f64;
                    assert_relative_eq!(m.unwrap(), direct, epsilon = 1e-9);
                } else {
                    assert_eq!(*m, None);
                }
            }
        }
    }

    #[test]
    fn test_infinite_sample_does_not_poison_mean() {
        let values = vec![Some(1.0), Some(f64::INFINITY), Some(3.0), Some(5.0)];
        let mean = rolling_mean(&values, 3);
        assert_relative_eq!(mean[0].unwrap(), 1.0);
        assert_relative_eq!(mean[3].unwrap(), 4.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(rolling_mean(&[], 5).is_empty());
    }
}
