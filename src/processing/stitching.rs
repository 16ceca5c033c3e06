//! Phase step ("glue") removal.
#[cfg(feature = "log")]
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [GapStitcher] removes phase steps caused by clock resets or rephasing.
/// Whenever two consecutive offsets differ by more than the threshold,
/// the jump is accumulated into a running correction that applies to all
/// following samples. The correction is never reset within a series.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GapStitcher {
    /// Jump detection threshold, in seconds
    pub threshold_s: f64,
    /// Pass through when disabled
    pub enabled: bool,
}

impl GapStitcher {
    /// Builds an enabled [GapStitcher] from a threshold
    /// expressed in picoseconds.
    pub fn from_picoseconds(threshold_ps: f64) -> Self {
        Self {
            threshold_s: threshold_ps * 1.0E-12,
            enabled: true,
        }
    }

    /// Copies and returns [Self] with given activation
    pub fn with_enabled(&self, enabled: bool) -> Self {
        let mut s = *self;
        s.enabled = enabled;
        s
    }

    /// Applies [Self] to raw offsets
    pub fn apply(&self, offsets: &[f64]) -> Vec<f64> {
        if self.enabled {
            stitch(offsets, self.threshold_s)
        } else {
            offsets.to_vec()
        }
    }
}

/// Single pass step removal, see [GapStitcher].
pub fn stitch(offsets: &[f64], threshold_s: f64) -> Vec<f64> {
    let mut correction = 0.0_f64;
    let mut _jumps = 0_usize;

    let mut stitched = Vec::with_capacity(offsets.len());
    let mut previous = Option::<f64>::None;

    for offset in offsets.iter() {
        if let Some(previous) = previous {
            let delta = offset - previous;
            if delta.abs() > threshold_s {
                correction += delta;
                _jumps += 1;
            }
        }
        stitched.push(offset - correction);
        previous = Some(*offset);
    }

    #[cfg(feature = "log")]
    {
        if _jumps > 0 {
            debug!(
                "stitched {} phase jump(s), total correction {:e}s",
                _jumps, correction
            );
        }
    }

    stitched
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_step_removal() {
        let threshold = 100.0E-12;
        let slope = 10.0E-12;
        let step = 5.0E-9;

        let raw = (0..100)
            .map(|i| {
                let smooth = slope * i as f64;
                if i >= 50 {
                    smooth + step
                } else {
                    smooth
                }
            })
            .collect::<Vec<_>>();

        let stitched = stitch(&raw, threshold);
        assert_eq!(stitched.len(), raw.len());

        // untouched before the step
        assert_eq!(&stitched[..50], &raw[..50]);

        // no residual discontinuity
        assert!((stitched[50] - stitched[49]).abs() <= threshold);

        // smooth continuation is preserved after the step
        for i in 51..100 {
            let expected = raw[i] - raw[i - 1];
            let got = stitched[i] - stitched[i - 1];
            assert!((expected - got).abs() < 1.0E-20);
        }
    }

    #[test]
    fn corrections_accumulate() {
        let raw = [0.0, 0.0, 1.0E-9, 1.0E-9, 3.0E-9, 3.0E-9, -2.0E-9];
        let stitched = stitch(&raw, 100.0E-12);
        for value in stitched.iter() {
            assert!(value.abs() < 1.0E-20, "residual step: {:?}", stitched);
        }
    }

    #[test]
    fn below_threshold_is_preserved() {
        let raw = [0.0, 50.0E-12, 100.0E-12, 150.0E-12];
        assert_eq!(stitch(&raw, 100.0E-12), raw.to_vec());
    }

    #[test]
    fn disabled_is_passthrough() {
        let raw = [0.0, 1.0, 2.0, 50.0];
        let stitcher = GapStitcher::from_picoseconds(100.0).with_enabled(false);
        assert_eq!(stitcher.apply(&raw), raw.to_vec());

        let stitcher = stitcher.with_enabled(true);
        assert!((stitcher.threshold_s - 100.0E-12).abs() < 1.0E-24);
        assert_eq!(stitcher.apply(&raw), vec![0.0; 4]);
    }

    #[test]
    fn empty_series() {
        assert!(stitch(&[], 1.0).is_empty());
    }
}
