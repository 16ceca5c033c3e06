//! Allan deviation (ADEV) and overlapping Allan deviation (OADEV),
//! from phase data.
use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default upper bound of the [TauGrid::Dense] grid, in seconds
pub const DEFAULT_MAX_TAU: u32 = 300_000;

/// Headline averaging intervals, in seconds
pub const ONE_HOUR: f64 = 3_600.0;
pub const ONE_DAY: f64 = 86_400.0;

/// Averaging intervals (tau) to evaluate
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TauGrid {
    /// Every integer tau from 1 second up to (excluded) `max_tau`
    Dense { max_tau: u32 },
    /// 1..9, 10..90, 100..900 .. up to 1E7, plus one hour and one day
    Decade,
}

impl Default for TauGrid {
    fn default() -> Self {
        Self::Dense {
            max_tau: DEFAULT_MAX_TAU,
        }
    }
}

impl TauGrid {
    /// Requested averaging intervals in seconds, sorted
    pub fn taus(&self) -> Vec<f64> {
        match self {
            Self::Dense { max_tau } => (1..*max_tau).map(|tau| tau as f64).collect(),
            Self::Decade => {
                let mut taus = Vec::with_capacity(66);
                let mut decade = 1.0_f64;
                for _ in 0..7 {
                    taus.extend((1..10).map(|k| k as f64 * decade));
                    decade *= 10.0;
                }
                taus.push(decade);
                taus.push(ONE_HOUR);
                taus.push(ONE_DAY);
                taus.sort_by(f64::total_cmp);
                taus.dedup();
                taus
            },
        }
    }
}

/// Allan deviation curve
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllanDeviation {
    /// Averaging intervals actually used (multiple of the sampling interval), in seconds
    pub taus: Vec<f64>,
    /// Deviations
    pub deviations: Vec<f64>,
    /// Statistical errors (deviation / sqrt(count))
    pub errors: Vec<f64>,
    /// Number of second differences averaged, per tau
    pub counts: Vec<usize>,
    /// Overlapping estimator
    pub overlapping: bool,
}

impl AllanDeviation {
    pub fn len(&self) -> usize {
        self.taus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taus.is_empty()
    }

    /// Iterates (tau, deviation, error, count)
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64, usize)> + '_ {
        self.taus
            .iter()
            .zip(self.deviations.iter())
            .zip(self.errors.iter())
            .zip(self.counts.iter())
            .map(|(((tau, dev), err), n)| (*tau, *dev, *err, *n))
    }

    /// Deviation at given tau (seconds), when it was produced
    pub fn at(&self, tau: f64) -> Option<f64> {
        let index = self
            .taus
            .iter()
            .position(|t| (t - tau).abs() < 1.0E-6)?;
        self.deviations.get(index).copied()
    }

    /// Deviation at tau = 1 hour
    pub fn one_hour(&self) -> Option<f64> {
        self.at(ONE_HOUR)
    }

    /// Deviation at tau = 1 day
    pub fn one_day(&self) -> Option<f64> {
        self.at(ONE_DAY)
    }
}

/// Averaging factors m (in samples) reachable from requested taus:
/// m = floor(tau / dt), zero and duplicates dropped, tau < N.dt.
fn averaging_factors(taus: &[f64], sampling_interval_s: f64, len: usize) -> Vec<usize> {
    let span = sampling_interval_s * len as f64;
    let mut factors = taus
        .iter()
        .filter(|tau| **tau > 0.0 && **tau < span)
        .map(|tau| (tau / sampling_interval_s).floor() as usize)
        .filter(|m| *m > 0)
        .collect::<Vec<_>>();
    factors.sort_unstable();
    factors.dedup();
    factors
}

/// Computes the Allan deviation of phase data `x` (seconds), evenly sampled
/// every `sampling_interval_s`, at the requested averaging intervals.
///
/// Each tau is rounded down to a multiple m of the sampling interval.
/// Second differences x[i+2m] - 2x[i+m] + x[i] are formed every sample
/// (overlapping estimator) or every m samples (non overlapping estimator).
/// Taus that can't be formed with at least two second differences are not produced.
pub fn allan_deviation(
    x: &[f64],
    sampling_interval_s: f64,
    taus: &[f64],
    overlapping: bool,
) -> Result<AllanDeviation, Error> {
    if sampling_interval_s.is_nan() || sampling_interval_s <= 0.0 {
        return Err(Error::InvalidSamplingInterval);
    }

    let mut adev = AllanDeviation {
        overlapping,
        ..Default::default()
    };

    let len = x.len();

    for m in averaging_factors(taus, sampling_interval_s, len) {
        if 2 * m >= len {
            break;
        }
        let stride = if overlapping { 1 } else { m };
        let n = (len - 2 * m).div_ceil(stride);
        if n < 2 {
            continue;
        }

        let sum = (0..n)
            .map(|j| {
                let i = j * stride;
                let v = x[i + 2 * m] - 2.0 * x[i + m] + x[i];
                v * v
            })
            .sum::<f64>();

        let tau = m as f64 * sampling_interval_s;
        let dev = (sum / (2.0 * n as f64)).sqrt() / tau;

        adev.taus.push(tau);
        adev.deviations.push(dev);
        adev.errors.push(dev / (n as f64).sqrt());
        adev.counts.push(n);
    }
    Ok(adev)
}

/// [allan_deviation] over a [TauGrid]
pub fn allan(
    x: &[f64],
    sampling_interval_s: f64,
    grid: &TauGrid,
    overlapping: bool,
) -> Result<AllanDeviation, Error> {
    allan_deviation(x, sampling_interval_s, &grid.taus(), overlapping)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn white_phase_noise(n: usize, sigma: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sigma).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn decade_grid() {
        let taus = TauGrid::Decade.taus();
        assert_eq!(taus.len(), 66);
        assert_eq!(&taus[..10], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(taus.last(), Some(&1.0E7));
        assert!(taus.contains(&3600.0));
        assert!(taus.contains(&86400.0));
        assert!(taus.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn dense_grid() {
        let taus = TauGrid::Dense { max_tau: 5 }.taus();
        assert_eq!(taus, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(TauGrid::default().taus().len(), DEFAULT_MAX_TAU as usize - 1);
    }

    #[test]
    fn factors() {
        // 30s sampling: sub-sampling taus are dropped, others are rounded down
        let m = averaging_factors(&[1.0, 29.0, 30.0, 59.0, 60.0, 3600.0], 30.0, 1000);
        assert_eq!(m, vec![1, 2, 120]);
        // tau must remain within the span
        let m = averaging_factors(&[1.0, 2.0, 3.0, 4.0, 5.0], 1.0, 4);
        assert_eq!(m, vec![1, 2, 3]);
    }

    #[test]
    fn white_phase_noise_level() {
        let sigma = 1.0E-11;
        let x = white_phase_noise(10_000, sigma, 0x5EED);
        let adev = allan(&x, 1.0, &TauGrid::Decade, false).unwrap();
        let expected = 3.0_f64.sqrt() * sigma;
        let got = adev.at(1.0).unwrap();
        assert!((got - expected).abs() / expected < 0.1, "adev(1)={:e}", got);

        // white PM: ADEV decreases with tau
        assert!(adev.at(100.0).unwrap() < adev.at(1.0).unwrap());
    }

    #[test]
    fn estimators_agree() {
        let x = white_phase_noise(10_000, 1.0E-10, 1234);
        let taus = [1.0, 2.0, 5.0, 10.0];
        let adev = allan_deviation(&x, 1.0, &taus, false).unwrap();
        let oadev = allan_deviation(&x, 1.0, &taus, true).unwrap();
        assert_eq!(adev.taus, taus.to_vec());
        assert_eq!(oadev.taus, taus.to_vec());
        for i in 0..taus.len() {
            let tolerance = 3.0 * (adev.errors[i] + oadev.errors[i]);
            assert!(
                (adev.deviations[i] - oadev.deviations[i]).abs() < tolerance,
                "tau={}: adev={:e} oadev={:e}",
                taus[i],
                adev.deviations[i],
                oadev.deviations[i]
            );
        }
        assert_eq!(oadev.counts[3], 10_000 - 20);
        assert_eq!(adev.counts[3], (10_000 - 20) / 10);
        assert!(oadev.overlapping);
    }

    #[test]
    fn degenerate_inputs() {
        let adev = allan(&[], 30.0, &TauGrid::Decade, true).unwrap();
        assert!(adev.is_empty());

        let adev = allan(&[0.0, 1.0, 0.0, 1.0, 0.0], 1.0, &TauGrid::default(), true).unwrap();
        assert_eq!(adev.taus, vec![1.0]);
        assert_eq!(adev.counts, vec![3]);
        assert!(adev.one_hour().is_none());
        assert!(adev.one_day().is_none());

        assert!(matches!(
            allan(&[0.0; 10], 0.0, &TauGrid::Decade, true),
            Err(Error::InvalidSamplingInterval)
        ));
    }

    #[test]
    fn headline_figures() {
        let x = white_phase_noise(2880 * 3, 1.0E-11, 42);
        let adev = allan(&x, 30.0, &TauGrid::Decade, true).unwrap();
        assert!(adev.one_hour().is_some());
        assert!(adev.one_day().is_some());
        assert!(adev.one_day().unwrap() < adev.one_hour().unwrap());
    }
}
