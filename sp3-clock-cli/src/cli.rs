use std::{fs::read_to_string, path::PathBuf, str::FromStr};

use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};
use itertools::Itertools;

use sp3_clock::prelude::{Config, FilenameDialect, TauGrid, TimeRange, SV};

use crate::Error;

/// Unit used when exporting clock offsets
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum Unit {
    #[default]
    Seconds,
    Microseconds,
    Nanoseconds,
}

impl Unit {
    /// Scaling from seconds
    pub fn scaling(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Microseconds => 1.0E6,
            Self::Nanoseconds => 1.0E9,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Seconds => write!(f, "s"),
            Self::Microseconds => write!(f, "us"),
            Self::Nanoseconds => write!(f, "ns"),
        }
    }
}

impl FromStr for Unit {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "s" => Ok(Self::Seconds),
            "us" => Ok(Self::Microseconds),
            "ns" => Ok(Self::Nanoseconds),
            _ => Err(Error::InvalidUnit(s.to_string())),
        }
    }
}

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    fn command() -> Command {
        Command::new("sp3-clock")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Satellite clock analysis from SP3 files")
            .long_about("sp3-clock concatenates the clock offsets of selected satellites
over a series of SP3 files, cleans them up (phase step removal, outlier rejection),
removes linear and quadratic trends and characterizes the residual
(frequency offset, Allan deviation, phase noise PSD).")
            .arg_required_else_help(true)
            .color(ColorChoice::Always)
            .next_help_heading("Context (Data selection)")
            .arg(Arg::new("filepath")
                .long("fp")
                .short('f')
                .value_name("FILE")
                .action(ArgAction::Append)
                .required_unless_present("directory")
                .help("Load a single SP3 file. Use as many times as needed."))
            .arg(Arg::new("directory")
                .short('d')
                .long("dir")
                .value_name("DIRECTORY")
                .action(ArgAction::Append)
                .required_unless_present("filepath")
                .help("Load all files contained in given directory. See --help.")
                .long_help("Use --dir,-d as many times as you need.
The default recursive depth is 5, use --depth to modify it.
Files that do not follow the filename convention are reported and ignored."))
            .arg(Arg::new("depth")
                .long("depth")
                .action(ArgAction::Set)
                .required(false)
                .help("Custom --dir,-d maximal recursive depth")
                .value_parser(value_parser!(u8)))
            .arg(Arg::new("start")
                .long("start")
                .value_name("YYYY-MM-DD")
                .requires("end")
                .help("Only process files published from that day (included)"))
            .arg(Arg::new("end")
                .long("end")
                .value_name("YYYY-MM-DD")
                .requires("start")
                .help("Only process files published up to that day (included)"))
            .arg(Arg::new("generic")
                .long("generic")
                .action(ArgAction::SetTrue)
                .help("Accept any 3 letter filename prefix (like igsWWWWD.sp3),
instead of the literal \"Ref\" prefix."))
            .arg(Arg::new("sv")
                .long("sv")
                .value_name("SV")
                .required(true)
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Satellites to process, comma separated. For example --sv G01,E05"))
            .next_help_heading("Processing")
            .arg(Arg::new("cfg")
                .long("cfg")
                .short('c')
                .value_name("FILE")
                .help("Load processing configuration from a JSON file.
Options passed on the command line always prevail."))
            .arg(Arg::new("window")
                .short('w')
                .long("window")
                .value_name("SAMPLES")
                .value_parser(value_parser!(usize))
                .help("Outlier filter window, must be odd (default: 7)"))
            .arg(Arg::new("threshold")
                .long("threshold")
                .value_name("MAD")
                .value_parser(value_parser!(f64))
                .help("Outlier rejection threshold, in MAD units (default: 5)"))
            .arg(Arg::new("glue")
                .long("glue")
                .value_name("PICOSECONDS")
                .value_parser(value_parser!(f64))
                .help("Enable phase step removal, with given detection threshold"))
            .arg(Arg::new("keep-drift")
                .long("keep-drift")
                .action(ArgAction::SetTrue)
                .help("Characterize the linear (detrended) residual, not the quadratic one."))
            .next_help_heading("Stability")
            .arg(Arg::new("non-overlapping")
                .long("non-overlapping")
                .action(ArgAction::SetTrue)
                .help("Use the non overlapping Allan deviation estimator"))
            .arg(Arg::new("decade")
                .long("decade")
                .action(ArgAction::SetTrue)
                .conflicts_with("max-tau")
                .help("Use a 1-2-3-...-9 per decade tau grid, instead of a dense one"))
            .arg(Arg::new("max-tau")
                .long("max-tau")
                .value_name("SECONDS")
                .value_parser(value_parser!(u32))
                .help("Dense tau grid upper bound (default: 300000)"))
            .arg(Arg::new("psd")
                .long("psd")
                .action(ArgAction::SetTrue)
                .help("Export the phase noise PSD"))
            .arg(Arg::new("segment")
                .long("segment")
                .value_name("SAMPLES")
                .value_parser(value_parser!(usize))
                .help("PSD segment length (default: 512)"))
            .arg(Arg::new("carrier")
                .long("carrier")
                .value_name("HZ")
                .value_parser(value_parser!(f64))
                .help("Nominal carrier frequency, used in phase noise conversion (default: 5 MHz)"))
            .next_help_heading("Output")
            .arg(Arg::new("day-markers")
                .long("day-markers")
                .action(ArgAction::SetTrue)
                .help("Export day boundaries (midnight crossings)"))
            .arg(Arg::new("unit")
                .long("unit")
                .value_name("UNIT")
                .value_parser(["s", "us", "ns"])
                .help("Unit of exported clock offsets (default: s)"))
            .arg(Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Export results as JSON"))
            .arg(Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Disable all terminal output"))
    }

    /// Recursive browser depth
    pub fn recursive_depth(&self) -> usize {
        if let Some(depth) = self.matches.get_one::<u8>("depth") {
            *depth as usize
        } else {
            5
        }
    }

    /// True when -q (quiet) option is active
    pub fn quiet(&self) -> bool {
        self.matches.get_flag("quiet")
    }

    /// Returns individual input directories
    pub fn directories(&self) -> Vec<&String> {
        if let Some(dirs) = self.matches.get_many::<String>("directory") {
            dirs.collect()
        } else {
            Vec::new()
        }
    }

    /// Returns individual input files
    pub fn files(&self) -> Vec<&String> {
        if let Some(fp) = self.matches.get_many::<String>("filepath") {
            fp.collect()
        } else {
            Vec::new()
        }
    }

    /// Requested satellites, in order of appearance
    pub fn satellites(&self) -> Result<Vec<SV>, Error> {
        let mut ret = Vec::new();
        if let Some(descriptors) = self.matches.get_many::<String>("sv") {
            for desc in descriptors.map(|s| s.trim()).filter(|s| !s.is_empty()).unique() {
                let sv = SV::from_str(desc).map_err(|_| Error::InvalidSatellite(desc.to_string()))?;
                ret.push(sv);
            }
        }
        Ok(ret)
    }

    fn parse_date(desc: &str) -> Result<(i32, u8, u8), Error> {
        let items = desc.trim().split('-').collect::<Vec<_>>();
        if items.len() != 3 {
            return Err(Error::InvalidDate(desc.to_string()));
        }
        let y = items[0]
            .parse::<i32>()
            .map_err(|_| Error::InvalidDate(desc.to_string()))?;
        let m = items[1]
            .parse::<u8>()
            .map_err(|_| Error::InvalidDate(desc.to_string()))?;
        let d = items[2]
            .parse::<u8>()
            .map_err(|_| Error::InvalidDate(desc.to_string()))?;
        if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
            return Err(Error::InvalidDate(desc.to_string()));
        }
        Ok((y, m, d))
    }

    /// Publication date range, when both --start and --end are defined
    pub fn time_range(&self) -> Result<Option<TimeRange>, Error> {
        match (
            self.matches.get_one::<String>("start"),
            self.matches.get_one::<String>("end"),
        ) {
            (Some(start), Some(end)) => {
                let start = Self::parse_date(start)?;
                let end = Self::parse_date(end)?;
                Ok(Some(TimeRange::from_dates(start, end)?))
            },
            _ => Ok(None),
        }
    }

    /// True when PSD export is requested
    pub fn psd(&self) -> bool {
        self.matches.get_flag("psd")
    }

    pub fn unit(&self) -> Result<Unit, Error> {
        match self.matches.get_one::<String>("unit") {
            Some(unit) => Unit::from_str(unit),
            None => Ok(Unit::default()),
        }
    }

    /// Custom output file
    pub fn output(&self) -> Option<&PathBuf> {
        self.matches.get_one::<PathBuf>("output")
    }

    /// Returns [Config] from command line: the JSON configuration (if any)
    /// is loaded first, then command line options are applied.
    pub fn config(&self) -> Result<Config, Error> {
        let mut cfg = match self.matches.get_one::<String>("cfg") {
            Some(fp) => {
                let content = read_to_string(fp)?;
                let cfg: Config = serde_json::from_str(&content)?;
                info!("Using custom configuration: {:#?}", cfg);
                cfg
            },
            None => Config::default(),
        };

        if let Some(window) = self.matches.get_one::<usize>("window") {
            cfg = cfg.with_window_size(*window);
        }
        if let Some(threshold) = self.matches.get_one::<f64>("threshold") {
            cfg = cfg.with_outlier_threshold(*threshold);
        }
        if let Some(glue) = self.matches.get_one::<f64>("glue") {
            cfg = cfg.with_stitching(*glue);
        }
        if self.matches.get_flag("keep-drift") {
            cfg = cfg.with_drift_removal(false);
        }
        if self.matches.get_flag("non-overlapping") {
            cfg = cfg.with_overlapping(false);
        }
        if self.matches.get_flag("decade") {
            cfg = cfg.with_tau_grid(TauGrid::Decade);
        }
        if let Some(max_tau) = self.matches.get_one::<u32>("max-tau") {
            cfg = cfg.with_tau_grid(TauGrid::Dense { max_tau: *max_tau });
        }
        if self.matches.get_flag("day-markers") {
            cfg = cfg.with_day_markers(true);
        }
        if self.matches.get_flag("generic") {
            cfg = cfg.with_dialect(FilenameDialect::Generic);
        }

        let segment = self
            .matches
            .get_one::<usize>("segment")
            .copied()
            .unwrap_or(cfg.psd_segment_length);
        let carrier = self
            .matches
            .get_one::<f64>("carrier")
            .copied()
            .unwrap_or(cfg.carrier_hz);
        cfg = cfg.with_psd(segment, carrier);

        cfg.validate()?;
        Ok(cfg)
    }
}
