//! Command line tool to analyze satellite clocks from SP3 files.
//! Refer to README for command line arguments.

mod cli;

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use cli::{Cli, Unit};
use walkdir::WalkDir;

extern crate gnss_rs as gnss;

use gnss::prelude::SV;
use hifitime::Epoch;
use serde::Serialize;

use sp3_clock::prelude::{
    AllanDeviation, Config, FrequencyOffset, Processor, Report, Request, SatelliteClock,
    StabilitySummary, Trend, Warning,
};

use env_logger::{Builder, Target};

#[macro_use]
extern crate log;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error")]
    StdioError(#[from] std::io::Error),
    #[error("processing error: {0}")]
    ProcessingError(#[from] sp3_clock::prelude::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid satellite \"{0}\"")]
    InvalidSatellite(String),
    #[error("invalid date \"{0}\", expecting YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid unit \"{0}\"")]
    InvalidUnit(String),
}

/// Exported results, for a single satellite
#[derive(Debug, Serialize)]
struct SatelliteOutput {
    samples: usize,
    unit: String,
    times: Vec<Epoch>,
    offsets: Vec<f64>,
    stitched: Vec<f64>,
    filtered: Vec<f64>,
    detrended: Vec<f64>,
    dedrifted: Vec<f64>,
    linear: Option<Trend>,
    quadratic: Option<Trend>,
    summary: StabilitySummary,
    frequency: FrequencyOffset,
    allan: AllanDeviation,
    #[serde(skip_serializing_if = "Option::is_none")]
    psd: Option<Vec<(f64, f64)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day_boundaries: Option<Vec<Epoch>>,
}

/// Exported session
#[derive(Debug, Serialize)]
struct Output {
    config: Config,
    files: Vec<PathBuf>,
    warnings: Vec<Warning>,
    satellites: BTreeMap<String, SatelliteOutput>,
}

fn scaled(values: &[f64], unit: Unit) -> Vec<f64> {
    values.iter().map(|v| v * unit.scaling()).collect()
}

impl SatelliteOutput {
    fn new(clock: &SatelliteClock, cfg: &Config, unit: Unit, psd: bool) -> Result<Self, Error> {
        let spectrum = if psd {
            Some(clock.psd(cfg)?.composite())
        } else {
            None
        };
        let day_boundaries = if cfg.day_markers {
            Some(clock.day_boundaries())
        } else {
            None
        };
        Ok(Self {
            samples: clock.len(),
            unit: unit.to_string(),
            times: clock.times.clone(),
            offsets: scaled(&clock.offsets, unit),
            stitched: scaled(&clock.stitched, unit),
            filtered: scaled(&clock.filtered, unit),
            detrended: scaled(&clock.detrended, unit),
            dedrifted: scaled(&clock.dedrifted, unit),
            linear: clock.linear.clone(),
            quadratic: clock.quadratic.clone(),
            summary: clock.stability_summary(cfg)?,
            frequency: clock.frequency()?,
            allan: clock.allan(cfg)?,
            psd: spectrum,
            day_boundaries,
        })
    }
}

/*
 * Gathers all files passed by User
 */
fn user_files(cli: &Cli) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let max_depth = cli.recursive_depth();

    // recursive dir loader
    for dir in cli.directories().iter() {
        let walkdir = WalkDir::new(dir).max_depth(max_depth);
        for entry in walkdir.into_iter().filter_map(|e| e.ok()) {
            if !entry.path().is_dir() {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    // individual files
    for fp in cli.files().iter() {
        files.push(PathBuf::from(fp));
    }
    debug!("{} input file(s)", files.len());
    files
}

fn print_summary(sv: &SV, clock: &SatelliteClock, summary: &StabilitySummary) {
    println!("{}: {} samples", sv, summary.samples);
    if let (Some(first), Some(last)) = (clock.times.first(), clock.times.last()) {
        println!("  span: {} - {}", first, last);
    }
    if let Some(dt) = clock.sampling_interval {
        println!("  sampling: {}", dt);
    }
    if let Some(offset) = summary.frequency_offset {
        println!("  frequency offset: {:.3E}", offset);
    }
    if let Some(drift) = summary.frequency_drift_per_day {
        println!("  frequency drift: {:.3E} /day", drift);
    }
    match summary.adev_1h {
        Some(adev) => println!("  adev(1h): {:.3E}", adev),
        None => println!("  adev(1h): n/a"),
    }
    match summary.adev_1d {
        Some(adev) => println!("  adev(1d): {:.3E}", adev),
        None => println!("  adev(1d): n/a"),
    }
}

fn export(
    report: &Report,
    cfg: &Config,
    unit: Unit,
    psd: bool,
    path: &Path,
) -> Result<(), Error> {
    let mut satellites = BTreeMap::new();
    for (sv, clock) in report.satellites.iter() {
        satellites.insert(sv.to_string(), SatelliteOutput::new(clock, cfg, unit, psd)?);
    }
    let output = Output {
        config: *cfg,
        files: report.files.clone(),
        warnings: report.warnings.clone(),
        satellites,
    };
    let fd = File::create(path)?;
    let mut writer = BufWriter::new(fd);
    serde_json::to_writer_pretty(&mut writer, &output)?;
    writer.flush()?;
    info!("results exported to \"{}\"", path.display());
    Ok(())
}

pub fn main() -> Result<(), Error> {
    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::new();
    let cfg = cli.config()?;
    let unit = cli.unit()?;

    let mut request = Request::new(user_files(&cli), cli.satellites()?);
    if let Some(range) = cli.time_range()? {
        request = request.with_range(range);
    }

    let processor = Processor::new(cfg)?;
    let report = processor.run(&request)?;

    info!("processed {} file(s)", report.files.len());

    if let Some(path) = cli.output() {
        export(&report, &cfg, unit, cli.psd(), path)?;
    }

    if !cli.quiet() {
        for warning in report.warnings.iter() {
            println!("warning: {}", warning);
        }
        for (sv, clock) in report.satellites.iter() {
            let summary = clock.stability_summary(&cfg)?;
            print_summary(sv, clock, &summary);
        }
    }
    Ok(())
}
