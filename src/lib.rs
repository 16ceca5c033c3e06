//! Satellite clock offset extraction from SP3 files, and frequency stability analysis.
//!
//! Clock offsets are gathered over a series of daily SP3 files, sorted by publication
//! date, then processed per satellite: phase step removal, sliding median outlier
//! rejection, linear and quadratic trend removal. Processed series expose their
//! fractional frequency offset, Allan deviation and phase noise PSD.
//!
//! ```no_run
//! use std::{path::PathBuf, str::FromStr};
//! use sp3_clock::prelude::*;
//!
//! let processor = Processor::new(Config::default()).unwrap();
//! let request = Request::new(
//!     vec![PathBuf::from("Ref23450.sp3"), PathBuf::from("Ref23451.sp3")],
//!     vec![SV::from_str("G01").unwrap()],
//! );
//! let report = processor.run(&request).unwrap();
//! for (sv, clock) in report.satellites.iter() {
//!     let adev = clock.allan(processor.config()).unwrap();
//!     println!("{}: adev(1h)={:?}", sv, adev.one_hour());
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
extern crate gnss_rs as gnss;

pub mod config;
pub mod error;
pub mod filename;
pub mod parsing;
pub mod processing;
pub mod processor;
pub mod series;

mod reader;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::{
        config::Config,
        error::{Error, ParsingError},
        filename::{
            filename_date, gpst_origin, select_files, FileSelection, FilenameDialect, TimeRange,
        },
        parsing::{parse_file, parse_reader, ClockData, ClockEntry},
        processing::{
            allan, allan_deviation, detrend, detrend_seconds, frequency_offset, outlier_filter,
            polyfit, psd, stitch, AllanDeviation, Detrended, FrequencyOffset, GapStitcher, Octave,
            PowerSpectrum, TauGrid, Trend,
        },
        processor::{Processor, Report, Request, SatelliteClock, StabilitySummary, Warning},
        series::ClockSeries,
    };
    // Pub re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
