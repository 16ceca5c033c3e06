//! Fractional frequency offset, from clock phase
use crate::{
    prelude::{Duration, Epoch, Error},
    processing::detrend::polyfit,
    series::elapsed_seconds,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Phase differences are formed over one hour (in seconds)
pub const FREQUENCY_LOOKBACK_S: f64 = 3600.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fractional frequency offset series, derived from phase
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyOffset {
    /// Each point is tagged with the start of its look-back interval
    pub epochs: Vec<Epoch>,
    /// Fractional frequency offset (s/s)
    pub values: Vec<f64>,
    /// Look-back, in samples
    pub lookback: usize,
    /// Linear frequency drift, per day. None when
    /// less than two points were formed.
    pub drift_per_day: Option<f64>,
}

impl FrequencyOffset {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Number of samples spanning [FREQUENCY_LOOKBACK_S] at given sampling interval
pub fn lookback_samples(sampling_interval: Duration) -> Result<usize, Error> {
    let dt = sampling_interval.to_seconds();
    if dt.is_nan() || dt <= 0.0 {
        return Err(Error::InvalidSamplingInterval);
    }
    let k = (FREQUENCY_LOOKBACK_S / dt).round() as usize;
    Ok(k.max(1))
}

/// Derives the fractional frequency offset from phase (seconds):
/// y = (x[i] - x[i-k]) / (t[i] - t[i-k]), k spanning one hour at the
/// given sampling interval. Evenly spaced samples are expected.
/// Series shorter than k samples produce an empty result.
pub fn frequency_offset(
    epochs: &[Epoch],
    phase: &[f64],
    sampling_interval: Duration,
) -> Result<FrequencyOffset, Error> {
    let k = lookback_samples(sampling_interval)?;
    frequency_offset_lookback(epochs, phase, k)
}

/// [frequency_offset] with explicit look-back, in samples.
pub fn frequency_offset_lookback(
    epochs: &[Epoch],
    phase: &[f64],
    lookback: usize,
) -> Result<FrequencyOffset, Error> {
    if epochs.len() != phase.len() {
        return Err(Error::LengthMismatch);
    }
    if lookback == 0 {
        return Err(Error::InvalidSamplingInterval);
    }

    let mut ret = FrequencyOffset {
        lookback,
        ..Default::default()
    };

    for i in lookback..phase.len() {
        let dt = (epochs[i] - epochs[i - lookback]).to_seconds();
        if dt > 0.0 {
            ret.epochs.push(epochs[i - lookback]);
            ret.values.push((phase[i] - phase[i - lookback]) / dt);
        }
    }

    if ret.values.len() > 1 {
        let t = elapsed_seconds(&ret.epochs);
        let fit = polyfit(&t, &ret.values, 1)?;
        ret.drift_per_day = Some(fit.slope() * SECONDS_PER_DAY);
    }
    Ok(ret)
}
