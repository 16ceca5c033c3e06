//! Sliding window median / MAD outlier rejection
use crate::prelude::Error;

/// Dispersion used in place of a null MAD
const MAD_EPSILON: f64 = 1.0E-9;

/// Median of given values, which are reordered in place.
/// `values` must not be empty.
fn median_mut(values: &mut [f64]) -> f64 {
    let len = values.len();
    let (lower, median, _) = values.select_nth_unstable_by(len / 2, f64::total_cmp);
    let median = *median;
    if len % 2 == 1 {
        median
    } else {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + median) / 2.0
    }
}

/// Sliding window median filter with MAD based rejection.
///
/// For each sample, the centered window (edge padded by repeating boundary
/// values) gives a median and a median absolute deviation (MAD). When
/// the sample deviates from the median by more than `threshold` x MAD, it
/// is replaced by the median. Windows are always formed on the original
/// data: replacements never feed back into following windows.
///
/// ```
/// use sp3_clock::prelude::*;
/// let data = [1.0, 1.0, 1.0, 100.0, 1.0, 1.0, 1.0];
/// let filtered = outlier_filter(&data, 5, 5.0).unwrap();
/// assert_eq!(filtered, vec![1.0; 7]);
/// assert!(outlier_filter(&data, 4, 5.0).is_err());
/// ```
pub fn outlier_filter(data: &[f64], window_size: usize, threshold: f64) -> Result<Vec<f64>, Error> {
    if window_size % 2 == 0 {
        return Err(Error::InvalidWindowSize(window_size));
    }
    if threshold.is_nan() || threshold <= 0.0 {
        return Err(Error::InvalidThreshold);
    }

    let (first, last) = match (data.first(), data.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(Vec::new()),
    };

    let half = window_size / 2;

    let mut padded = Vec::with_capacity(data.len() + 2 * half);
    padded.extend(std::iter::repeat(first).take(half));
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat(last).take(half));

    let mut filtered = data.to_vec();
    let mut window = Vec::with_capacity(window_size);
    let mut deviations = Vec::with_capacity(window_size);

    for (i, value) in data.iter().enumerate() {
        window.clear();
        window.extend_from_slice(&padded[i..i + window_size]);
        let median = median_mut(&mut window);

        deviations.clear();
        deviations.extend(window.iter().map(|w| (w - median).abs()));
        let mut mad = median_mut(&mut deviations);
        if mad == 0.0 {
            mad = MAD_EPSILON;
        }

        if (value - median).abs() > threshold * mad {
            filtered[i] = median;
        }
    }
    Ok(filtered)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn median() {
        assert_eq!(median_mut(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_mut(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median_mut(&mut [7.0]), 7.0);
        assert_eq!(median_mut(&mut [5.0, -1.0, 3.0, 2.0, 8.0, 0.0]), 2.5);
    }

    #[test]
    fn even_window_is_rejected() {
        for window in [0, 2, 4, 6, 8, 10] {
            assert!(matches!(
                outlier_filter(&[1.0, 2.0, 3.0], window, 5.0),
                Err(Error::InvalidWindowSize(w)) if w == window
            ));
        }
        assert!(matches!(
            outlier_filter(&[1.0, 2.0, 3.0], 3, 0.0),
            Err(Error::InvalidThreshold)
        ));
    }

    #[test]
    fn constant_input_is_preserved() {
        for window in [1, 3, 5, 7, 9, 11, 13, 15] {
            for constant in [0.0, 1.0E-6, -3.5, 42.0] {
                let data = vec![constant; 25];
                assert_eq!(outlier_filter(&data, window, 5.0).unwrap(), data);
            }
        }
    }

    #[test]
    fn spike_replacement() {
        let mut data = (0..50).map(|i| (i as f64 * 0.7).sin() * 1.0E-10).collect::<Vec<_>>();
        data[20] = 1.0E-6;
        data[33] = -1.0E-6;
        let filtered = outlier_filter(&data, 7, 5.0).unwrap();
        assert_eq!(filtered.len(), data.len());
        assert!(filtered[20].abs() < 1.0E-9);
        assert!(filtered[33].abs() < 1.0E-9);
        assert_eq!(filtered[10], data[10]);
    }

    #[test]
    fn no_feedback() {
        // two adjacent spikes: with 3 sample windows, each one is
        // judged against the original neighbourhood
        let data = [0.0, 0.0, 10.0, 10.0, 0.0, 0.0];
        let filtered = outlier_filter(&data, 3, 5.0).unwrap();
        assert_eq!(filtered, vec![0.0, 0.0, 10.0, 10.0, 0.0, 0.0]);

        let data = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0];
        let filtered = outlier_filter(&data, 3, 5.0).unwrap();
        assert_eq!(filtered, vec![0.0; 7]);
    }

    #[test]
    fn deterministic() {
        let data = (0..200)
            .map(|i| ((i * 7919) % 113) as f64 * 1.0E-12)
            .collect::<Vec<_>>();
        let a = outlier_filter(&data, 9, 3.0).unwrap();
        let b = outlier_filter(&data, 9, 3.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_and_short_input() {
        assert!(outlier_filter(&[], 7, 5.0).unwrap().is_empty());
        assert_eq!(outlier_filter(&[1.0], 7, 5.0).unwrap(), vec![1.0]);
        assert_eq!(outlier_filter(&[1.0, 2.0], 1, 5.0).unwrap(), vec![1.0, 2.0]);
    }
}
