//! Processing configuration
use crate::prelude::{Error, FilenameDialect, GapStitcher, TauGrid};
use crate::processing::{DEFAULT_CARRIER_HZ, DEFAULT_SEGMENT_LENGTH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Processing [Config]uration. [Config::default] gives the
/// standard setup: 7 sample median window, 5 MAD rejection threshold,
/// no phase step removal, Allan deviation of the dedrifted residual
/// using the overlapping estimator over a dense tau grid.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Outlier filter window, in samples. Must be odd.
    pub window_size: usize,
    /// Outlier rejection threshold, in MAD units
    pub outlier_threshold: f64,
    /// Phase step ("glue") detection threshold, in picoseconds
    pub glue_threshold_ps: f64,
    /// Enables phase step removal
    pub stitching: bool,
    /// Allan deviation is computed on the dedrifted (quadratic)
    /// residual when true, on the detrended (linear) one otherwise.
    pub remove_drift: bool,
    /// Selects the overlapping Allan deviation estimator
    pub overlapping: bool,
    /// Averaging intervals
    pub tau_grid: TauGrid,
    /// Day boundary markers, for presentation layers
    pub day_markers: bool,
    /// Filename convention
    pub dialect: FilenameDialect,
    /// PSD segment length, in samples
    pub psd_segment_length: usize,
    /// Nominal carrier frequency (Hz), used in phase noise conversion
    pub carrier_hz: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: 7,
            outlier_threshold: 5.0,
            glue_threshold_ps: 100.0,
            stitching: false,
            remove_drift: true,
            overlapping: true,
            tau_grid: TauGrid::default(),
            day_markers: false,
            dialect: FilenameDialect::default(),
            psd_segment_length: DEFAULT_SEGMENT_LENGTH,
            carrier_hz: DEFAULT_CARRIER_HZ,
        }
    }
}

impl Config {
    /// Checks this setup prior any processing.
    pub fn validate(&self) -> Result<(), Error> {
        if self.window_size % 2 == 0 {
            return Err(Error::InvalidWindowSize(self.window_size));
        }
        if self.outlier_threshold.is_nan() || self.outlier_threshold <= 0.0 {
            return Err(Error::InvalidThreshold);
        }
        if self.glue_threshold_ps.is_nan() || self.glue_threshold_ps <= 0.0 {
            return Err(Error::InvalidThreshold);
        }
        if self.psd_segment_length < 2 {
            return Err(Error::InvalidSegmentLength);
        }
        Ok(())
    }

    /// [GapStitcher] described by this setup
    pub fn stitcher(&self) -> GapStitcher {
        GapStitcher::from_picoseconds(self.glue_threshold_ps).with_enabled(self.stitching)
    }

    /// Copies and returns [Config] with given outlier filter window
    pub fn with_window_size(&self, window_size: usize) -> Self {
        let mut s = *self;
        s.window_size = window_size;
        s
    }

    /// Copies and returns [Config] with given outlier rejection threshold
    pub fn with_outlier_threshold(&self, threshold: f64) -> Self {
        let mut s = *self;
        s.outlier_threshold = threshold;
        s
    }

    /// Copies and returns [Config] with phase step removal enabled,
    /// using given threshold in picoseconds.
    pub fn with_stitching(&self, threshold_ps: f64) -> Self {
        let mut s = *self;
        s.stitching = true;
        s.glue_threshold_ps = threshold_ps;
        s
    }

    /// Copies and returns [Config] with Allan deviation
    /// computed on the dedrifted residual or not.
    pub fn with_drift_removal(&self, remove_drift: bool) -> Self {
        let mut s = *self;
        s.remove_drift = remove_drift;
        s
    }

    pub fn with_overlapping(&self, overlapping: bool) -> Self {
        let mut s = *self;
        s.overlapping = overlapping;
        s
    }

    pub fn with_tau_grid(&self, grid: TauGrid) -> Self {
        let mut s = *self;
        s.tau_grid = grid;
        s
    }

    pub fn with_day_markers(&self, day_markers: bool) -> Self {
        let mut s = *self;
        s.day_markers = day_markers;
        s
    }

    pub fn with_dialect(&self, dialect: FilenameDialect) -> Self {
        let mut s = *self;
        s.dialect = dialect;
        s
    }

    /// Copies and returns [Config] with given PSD segment length
    /// and nominal carrier frequency.
    pub fn with_psd(&self, segment_length: usize, carrier_hz: f64) -> Self {
        let mut s = *self;
        s.psd_segment_length = segment_length;
        s.carrier_hz = carrier_hz;
        s
    }
}
