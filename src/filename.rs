//! SP3 file selection: publication date is encoded in the filename
//! as GPS week and day of week.
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::prelude::{Duration, Epoch, Error, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "log")]
use log::debug;

lazy_static! {
    /// "Ref" literal prefix, for example "Ref23450.sp3"
    static ref REFERENCE_NAME: Regex = Regex::new(r"(?i)Ref(\d{4})(\d)\.sp3(\.gz)?$").unwrap();
    /// Any 3 letter prefix, for example "igs23450.sp3"
    static ref GENERIC_NAME: Regex =
        Regex::new(r"(?i)^[a-z]{3}(\d{4})(\d)\.sp3(\.gz)?$").unwrap();
}

/// Supported filename conventions
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilenameDialect {
    /// Literal "Ref" prefix followed by WWWWD
    #[default]
    Reference,
    /// Any 3 letter (agency) prefix followed by WWWWD
    Generic,
}

impl FilenameDialect {
    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Reference => &REFERENCE_NAME,
            Self::Generic => &GENERIC_NAME,
        }
    }
}

/// GPST origin: 1980-01-06 at midnight
pub fn gpst_origin() -> Epoch {
    Epoch::from_gregorian_at_midnight(1980, 1, 6, TimeScale::GPST)
}

/// Returns the publication date (midnight GPST) encoded in given filename,
/// or None when the name does not follow the [FilenameDialect].
/// ```
/// use sp3_clock::prelude::*;
/// let date = filename_date("Ref23450.sp3", FilenameDialect::Reference).unwrap();
/// assert_eq!(date, Epoch::from_gregorian_at_midnight(2024, 12, 15, TimeScale::GPST));
/// ```
pub fn filename_date(name: &str, dialect: FilenameDialect) -> Option<Epoch> {
    let captures = dialect.pattern().captures(name)?;
    let week = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let day = captures.get(2)?.as_str().parse::<u32>().ok()?;
    if day > 6 {
        return None;
    }
    let days = week * 7 + day;
    Some(gpst_origin() + Duration::from_days(days as f64))
}

/// Inclusive [Epoch] range, used to select files by publication date.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    pub start: Epoch,
    pub end: Epoch,
}

impl TimeRange {
    /// Builds a new [TimeRange], fails when end precedes start.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvertedRange);
        }
        Ok(Self { start, end })
    }

    /// Builds a [TimeRange] spanning calendar days (midnight GPST), inclusive.
    pub fn from_dates(start: (i32, u8, u8), end: (i32, u8, u8)) -> Result<Self, Error> {
        Self::new(
            Epoch::from_gregorian_at_midnight(start.0, start.1, start.2, TimeScale::GPST),
            Epoch::from_gregorian_at_midnight(end.0, end.1, end.2, TimeScale::GPST),
        )
    }

    pub fn contains(&self, t: Epoch) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Result of [select_files]
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    /// Files to parse, with their publication date, in ascending order
    pub files: Vec<(Epoch, PathBuf)>,
    /// Files that do not follow the filename convention
    pub unrecognized: Vec<PathBuf>,
}

/// Selects files within the (optional) inclusive [TimeRange] and sorts
/// them by publication date. Files sharing a date keep their input order.
pub fn select_files<P: AsRef<Path>>(
    paths: &[P],
    range: Option<&TimeRange>,
    dialect: FilenameDialect,
) -> FileSelection {
    let mut selection = FileSelection::default();
    for path in paths.iter() {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        match filename_date(&name, dialect) {
            Some(date) => {
                if range.map_or(true, |range| range.contains(date)) {
                    selection.files.push((date, path.to_path_buf()));
                } else {
                    #[cfg(feature = "log")]
                    debug!("\"{}\" out of range", path.display());
                }
            },
            None => selection.unrecognized.push(path.to_path_buf()),
        }
    }
    selection.files.sort_by(|(a, _), (b, _)| a.cmp(b));
    selection
}
