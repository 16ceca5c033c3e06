//! Per satellite clock offset time series
use crate::prelude::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Converts [Epoch]s to seconds elapsed since the first one.
pub fn elapsed_seconds(epochs: &[Epoch]) -> Vec<f64> {
    match epochs.first() {
        Some(t0) => epochs.iter().map(|t| (*t - *t0).to_seconds()).collect(),
        None => Vec::new(),
    }
}

/// [ClockSeries] is the list of (epoch, offset) samples
/// of a single satellite, in ascending chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockSeries {
    /// Sampling [Epoch]s
    pub epochs: Vec<Epoch>,
    /// Clock offsets in seconds
    pub offsets: Vec<f64>,
}

impl ClockSeries {
    /// Appends a new sample. Caller is responsible for
    /// preserving the chronological order.
    pub fn push(&mut self, epoch: Epoch, offset: f64) {
        self.epochs.push(epoch);
        self.offsets.push(offset);
    }

    /// Appends all samples of `other`, that should follow `self` in time.
    pub fn append(&mut self, mut other: Self) {
        self.epochs.append(&mut other.epochs);
        self.offsets.append(&mut other.offsets);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Returns first [Epoch] in time
    pub fn first_epoch(&self) -> Option<Epoch> {
        self.epochs.first().copied()
    }

    /// Returns last [Epoch] in time
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.epochs.last().copied()
    }

    /// Returns total [Duration] of this series
    pub fn duration(&self) -> Option<Duration> {
        let start = self.first_epoch()?;
        let end = self.last_epoch()?;
        Some(end - start)
    }

    /// Iterates over (epoch, offset) samples
    pub fn iter(&self) -> impl Iterator<Item = (Epoch, f64)> + '_ {
        self.epochs.iter().copied().zip(self.offsets.iter().copied())
    }

    /// Seconds elapsed since the first sample, for each sample
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        elapsed_seconds(&self.epochs)
    }

    /// Histogram analysis of the sampling interval,
    /// as a list of (interval, population), unsorted.
    pub fn sampling_histogram(&self) -> Vec<(Duration, usize)> {
        // compute dt = |e_k+1 - e_k| : instantaneous epoch delta
        //              then compute an histogram on these intervals
        self.epochs
            .iter()
            .zip(self.epochs.iter().skip(1))
            .map(|(ek, ekp1)| *ekp1 - *ek)
            .fold(vec![], |mut list, dt| {
                match list.iter_mut().find(|(delta, _)| *delta == dt) {
                    Some((_, pop)) => *pop += 1,
                    None => list.push((dt, 1)),
                }
                list
            })
    }

    /// Returns dominant sampling period, by actual data analysis.
    pub fn dominant_sampling_interval(&self) -> Option<Duration> {
        self.sampling_histogram()
            .into_iter()
            .max_by(|(_, pop_i), (_, pop_j)| pop_i.cmp(pop_j))
            .map(|dominant| dominant.0)
    }

    /// Returns true if all samples are evenly spaced in time
    pub fn steady_sampling(&self) -> bool {
        self.sampling_histogram().len() == 1
    }

    /// Returns the list of unexpected data gaps, in the form
    /// ([Epoch], [Duration]), where epoch is the last sample preceding
    /// the gap. When tolerance is None, any interval exceeding the
    /// dominant sampling interval is a gap.
    pub fn data_gaps(&self, tolerance: Option<Duration>) -> Vec<(Epoch, Duration)> {
        let tolerance = match tolerance.or_else(|| self.dominant_sampling_interval()) {
            Some(tolerance) => tolerance,
            None => return Vec::new(),
        };
        self.epochs
            .iter()
            .zip(self.epochs.iter().skip(1))
            .filter_map(|(ek, ekp1)| {
                let dt = *ekp1 - *ek;
                if dt > tolerance {
                    Some((*ek, dt))
                } else {
                    None
                }
            })
            .collect()
    }
}
