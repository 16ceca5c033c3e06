//! Processing session: file selection, parsing and per satellite pipeline
use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    config::Config,
    prelude::{
        allan_deviation, detrend, frequency_offset, gpst_origin, outlier_filter, parse_file, psd,
        select_files, AllanDeviation, ClockData, ClockSeries, Duration, Epoch, Error,
        FrequencyOffset, PowerSpectrum, TimeRange, Trend, SV,
    },
    processing::{ONE_DAY, ONE_HOUR},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "log")]
use log::{debug, error, warn};

/// Processing [Request]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// SP3 files, in any order
    pub files: Vec<PathBuf>,
    /// Only files published within this inclusive range are parsed
    pub range: Option<TimeRange>,
    /// Satellites of interest
    pub satellites: Vec<SV>,
}

impl Request {
    pub fn new(files: Vec<PathBuf>, satellites: Vec<SV>) -> Self {
        Self {
            files,
            satellites,
            range: None,
        }
    }

    /// Copies and returns [Request] restricted to given [TimeRange]
    pub fn with_range(&self, range: TimeRange) -> Self {
        let mut s = self.clone();
        s.range = Some(range);
        s
    }
}

/// Non fatal conditions met while processing
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Warning {
    /// File could not be read: it does not contribute any data
    FileError { path: PathBuf, reason: String },
    /// Filename does not follow the selected convention: file is ignored
    UnrecognizedFilename(PathBuf),
    /// Requested satellite has no data
    NoData(SV),
    /// Polynomial fit could not be solved: related residual is empty
    InfeasibleFit {
        sv: SV,
        degree: usize,
        reason: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FileError { path, reason } => {
                write!(f, "failed to read \"{}\": {}", path.display(), reason)
            },
            Self::UnrecognizedFilename(path) => {
                write!(f, "unrecognized filename \"{}\"", path.display())
            },
            Self::NoData(sv) => write!(f, "{}: no data", sv),
            Self::InfeasibleFit { sv, degree, reason } => {
                write!(f, "{}: degree {} fit failed: {}", sv, degree, reason)
            },
        }
    }
}

/// Headline stability figures
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StabilitySummary {
    /// Number of samples
    pub samples: usize,
    /// Allan deviation at tau = 1 hour
    pub adev_1h: Option<f64>,
    /// Allan deviation at tau = 1 day
    pub adev_1d: Option<f64>,
    /// Mean fractional frequency offset (linear trend)
    pub frequency_offset: Option<f64>,
    /// Fractional frequency drift per day (quadratic trend)
    pub frequency_drift_per_day: Option<f64>,
}

/// Processed clock of a single satellite. All series share
/// the `times` axis, except residuals of infeasible fits which are empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteClock {
    pub sv: SV,
    /// Sampling [Epoch]s
    pub times: Vec<Epoch>,
    /// Raw clock offsets (s)
    pub offsets: Vec<f64>,
    /// After phase step removal (s)
    pub stitched: Vec<f64>,
    /// After outlier rejection (s)
    pub filtered: Vec<f64>,
    /// Filtered minus linear trend (s)
    pub detrended: Vec<f64>,
    /// Filtered minus quadratic trend (s)
    pub dedrifted: Vec<f64>,
    /// Linear trend
    pub linear: Option<Trend>,
    /// Quadratic trend
    pub quadratic: Option<Trend>,
    /// Dominant sampling interval
    pub sampling_interval: Option<Duration>,
}

impl SatelliteClock {
    /// Builds an empty [SatelliteClock]
    pub fn empty(sv: SV) -> Self {
        Self {
            sv,
            times: Vec::new(),
            offsets: Vec::new(),
            stitched: Vec::new(),
            filtered: Vec::new(),
            detrended: Vec::new(),
            dedrifted: Vec::new(),
            linear: None,
            quadratic: None,
            sampling_interval: None,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Residual used in stability analysis
    fn residual(&self, cfg: &Config) -> &[f64] {
        if cfg.remove_drift {
            &self.dedrifted
        } else {
            &self.detrended
        }
    }

    fn sampling_interval_s(&self) -> Option<f64> {
        self.sampling_interval.map(|dt| dt.to_seconds())
    }

    /// Fractional frequency offset, over one hour phase differences
    /// of the filtered series.
    pub fn frequency(&self) -> Result<FrequencyOffset, Error> {
        match self.sampling_interval {
            Some(dt) if !self.filtered.is_empty() => {
                frequency_offset(&self.times, &self.filtered, dt)
            },
            _ => Ok(FrequencyOffset::default()),
        }
    }

    /// Allan deviation of the residual selected by [Config],
    /// over its [crate::prelude::TauGrid].
    pub fn allan(&self, cfg: &Config) -> Result<AllanDeviation, Error> {
        let residual = self.residual(cfg);
        match self.sampling_interval_s() {
            Some(dt) if !residual.is_empty() => {
                allan_deviation(residual, dt, &cfg.tau_grid.taus(), cfg.overlapping)
            },
            _ => Ok(AllanDeviation {
                overlapping: cfg.overlapping,
                ..Default::default()
            }),
        }
    }

    /// Phase noise PSD of the residual selected by [Config]
    pub fn psd(&self, cfg: &Config) -> Result<PowerSpectrum, Error> {
        let residual = self.residual(cfg);
        match self.sampling_interval_s() {
            Some(dt) if !residual.is_empty() => {
                psd(residual, dt, cfg.psd_segment_length, cfg.carrier_hz)
            },
            _ => Ok(PowerSpectrum::default()),
        }
    }

    /// One hour / one day stability figures, and trends
    pub fn stability_summary(&self, cfg: &Config) -> Result<StabilitySummary, Error> {
        let mut summary = StabilitySummary {
            samples: self.len(),
            frequency_offset: self.linear.as_ref().map(|trend| trend.slope()),
            frequency_drift_per_day: self
                .quadratic
                .as_ref()
                .and_then(|trend| trend.frequency_drift_per_day()),
            ..Default::default()
        };
        let residual = self.residual(cfg);
        if let Some(dt) = self.sampling_interval_s() {
            let adev = allan_deviation(residual, dt, &[ONE_HOUR, ONE_DAY], cfg.overlapping)?;
            summary.adev_1h = adev.one_hour();
            summary.adev_1d = adev.one_day();
        }
        Ok(summary)
    }

    /// Midnight (GPST) crossings within this series
    pub fn day_boundaries(&self) -> Vec<Epoch> {
        let (first, last) = match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };
        let origin = gpst_origin();
        let mut day = ((first - origin).to_seconds() / ONE_DAY).floor() + 1.0;
        let mut boundaries = Vec::new();
        loop {
            let midnight = origin + Duration::from_days(day);
            if midnight > last {
                break;
            }
            boundaries.push(midnight);
            day += 1.0;
        }
        boundaries
    }
}

/// Processing [Report]
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Every requested satellite, possibly empty
    pub satellites: BTreeMap<SV, SatelliteClock>,
    /// Files that were parsed, in processing order
    pub files: Vec<PathBuf>,
    /// Non fatal conditions
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn get(&self, sv: &SV) -> Option<&SatelliteClock> {
        self.satellites.get(sv)
    }
}

/// [Processor] runs the complete pipeline for a [Request]:
/// files are selected and sorted by publication date, then parsed in order
/// (each file only contributes epochs newer than anything previously parsed).
/// Each satellite is then processed independently: phase step removal,
/// outlier rejection, linear and quadratic trend removal.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    cfg: Config,
}

impl Processor {
    /// Builds a new [Processor], rejecting invalid [Config]urations.
    pub fn new(cfg: Config) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs the complete pipeline, see [Self::run_interruptible].
    pub fn run(&self, request: &Request) -> Result<Report, Error> {
        self.run_interruptible(request, &AtomicBool::new(false))
    }

    /// Runs the complete pipeline. `interrupt` is checked between files
    /// and between satellites: when raised, processing stops with [Error::Interrupted].
    pub fn run_interruptible(
        &self,
        request: &Request,
        interrupt: &AtomicBool,
    ) -> Result<Report, Error> {
        self.cfg.validate()?;
        if request.satellites.is_empty() {
            return Err(Error::NoSatellites);
        }
        if let Some(range) = &request.range {
            if range.end < range.start {
                return Err(Error::InvertedRange);
            }
        }

        let mut report = Report::default();

        let selection = select_files(&request.files, request.range.as_ref(), self.cfg.dialect);
        for path in selection.unrecognized {
            report.warnings.push(Warning::UnrecognizedFilename(path));
        }

        let mut data = ClockData::new();
        let mut last_epoch = gpst_origin();

        for (_, path) in selection.files {
            if interrupt.load(Ordering::Relaxed) {
                return Err(Error::Interrupted);
            }
            match parse_file(&path, last_epoch) {
                Ok((content, newest)) => {
                    #[cfg(feature = "log")]
                    debug!("{}: {} satellite(s)", path.display(), content.len());

                    for (sv, series) in content {
                        if request.satellites.contains(&sv) {
                            data.entry(sv).or_default().append(series);
                        }
                    }
                    last_epoch = newest;
                    report.files.push(path);
                },
                Err(e) => {
                    #[cfg(feature = "log")]
                    error!("{}: {}", path.display(), e);
                    report.warnings.push(Warning::FileError {
                        path,
                        reason: e.to_string(),
                    });
                },
            }
        }

        for sv in request.satellites.iter() {
            if report.satellites.contains_key(sv) {
                continue;
            }
            if interrupt.load(Ordering::Relaxed) {
                return Err(Error::Interrupted);
            }
            let series = data.remove(sv).unwrap_or_default();
            let (clock, warnings) = self.process(*sv, series)?;
            report.warnings.extend(warnings);
            report.satellites.insert(*sv, clock);
        }

        #[cfg(feature = "log")]
        for warning in report.warnings.iter() {
            warn!("{}", warning);
        }

        Ok(report)
    }

    /// Runs the per satellite pipeline on a [ClockSeries].
    pub fn process(
        &self,
        sv: SV,
        series: ClockSeries,
    ) -> Result<(SatelliteClock, Vec<Warning>), Error> {
        let mut warnings = Vec::new();
        if series.is_empty() {
            warnings.push(Warning::NoData(sv));
            return Ok((SatelliteClock::empty(sv), warnings));
        }

        let sampling_interval = series.dominant_sampling_interval();

        let stitched = self.cfg.stitcher().apply(&series.offsets);
        let filtered = outlier_filter(
            &stitched,
            self.cfg.window_size,
            self.cfg.outlier_threshold,
        )?;

        let mut clock = SatelliteClock {
            sv,
            sampling_interval,
            stitched,
            filtered,
            ..SatelliteClock::empty(sv)
        };

        // both fits run on the filtered series
        for degree in [1, 2] {
            match detrend(&series.epochs, &clock.filtered, degree) {
                Ok(fit) => {
                    if degree == 1 {
                        clock.detrended = fit.residual;
                        clock.linear = Some(fit.trend);
                    } else {
                        clock.dedrifted = fit.residual;
                        clock.quadratic = Some(fit.trend);
                    }
                },
                Err(e) => warnings.push(Warning::InfeasibleFit {
                    sv,
                    degree,
                    reason: e.to_string(),
                }),
            }
        }

        #[cfg(feature = "log")]
        debug!("{}: processed {} samples", sv, series.len());

        clock.times = series.epochs;
        clock.offsets = series.offsets;
        Ok((clock, warnings))
    }
}
