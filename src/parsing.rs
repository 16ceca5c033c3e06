//! SP3 clock offset extraction.
//!
//! Only epoch descriptors and position/clock records are of interest,
//! every other line (header, comments, velocities) is ignored.
use std::{collections::BTreeMap, io::BufRead, path::Path, str::FromStr};

use crate::{
    prelude::{ClockSeries, Epoch, Error, ParsingError, TimeScale, SV},
    reader::BufferedReader,
};

#[cfg(feature = "log")]
use log::{debug, error};

/// Clock offsets extracted from SP3 data, per satellite
pub type ClockData = BTreeMap<SV, ClockSeries>;

/// Clock values at or above this level (microseconds)
/// mark a bad or absent clock estimate.
const BAD_CLOCK_US: f64 = 999999.0;

fn new_epoch(content: &str) -> bool {
    content.starts_with('*')
}

fn clock_entry(content: &str) -> bool {
    content.starts_with('P')
}

fn end_of_file(content: &str) -> bool {
    content.eq("EOF")
}

/// Parses [Epoch] from an epoch descriptor, for example
/// "*  2023 12 31 23 45  0.00000000". Fractional seconds are truncated.
pub(crate) fn parse_epoch(content: &str) -> Result<Epoch, ParsingError> {
    let mut items = content
        .strip_prefix('*')
        .ok_or(ParsingError::EpochFormat)?
        .split_ascii_whitespace();

    let y = items.next().ok_or(ParsingError::EpochFormat)?;
    let y = i32::from_str(y).or(Err(ParsingError::EpochYear(y.to_string())))?;

    let m = items.next().ok_or(ParsingError::EpochFormat)?;
    let m = u8::from_str(m).or(Err(ParsingError::EpochMonth(m.to_string())))?;

    let d = items.next().ok_or(ParsingError::EpochFormat)?;
    let d = u8::from_str(d).or(Err(ParsingError::EpochDay(d.to_string())))?;

    let hh = items.next().ok_or(ParsingError::EpochFormat)?;
    let hh = u8::from_str(hh).or(Err(ParsingError::EpochHours(hh.to_string())))?;

    let mm = items.next().ok_or(ParsingError::EpochFormat)?;
    let mm = u8::from_str(mm).or(Err(ParsingError::EpochMinutes(mm.to_string())))?;

    let ss_str = items.next().ok_or(ParsingError::EpochFormat)?;
    let ss = f64::from_str(ss_str).or(Err(ParsingError::EpochSeconds(ss_str.to_string())))?;
    if !(0.0..61.0).contains(&ss) {
        return Err(ParsingError::EpochSeconds(ss_str.to_string()));
    }
    let ss = ss.trunc() as u8;

    let datetime = format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02} {}",
        y,
        m,
        d,
        hh,
        mm,
        ss,
        TimeScale::GPST,
    );
    Epoch::from_str(&datetime).or(Err(ParsingError::Epoch(datetime)))
}

/// Satellite clock record, extracted from a position/clock line like
/// "PG01 -22335.782004 -14656.280389  -1218.238499   -176.397152".
#[derive(Debug, Clone, PartialEq)]
pub struct ClockEntry {
    pub sv: SV,
    /// Clock offset in microseconds
    pub clock_us: f64,
}

impl ClockEntry {
    /// Clock offset in seconds
    pub fn clock_s(&self) -> f64 {
        self.clock_us * 1.0E-6
    }
}

impl FromStr for ClockEntry {
    type Err = ParsingError;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut items = line.split_ascii_whitespace();

        let descriptor = items.next().unwrap_or_default();
        let sv = descriptor
            .strip_prefix('P')
            .ok_or(ParsingError::SV(descriptor.to_string()))?;
        let sv = SV::from_str(sv).or(Err(ParsingError::SV(sv.to_string())))?;

        // x, y, z coordinates then clock
        let clock = items.nth(3).ok_or(ParsingError::MissingClock)?;
        let clock_us = f64::from_str(clock).or(Err(ParsingError::Clock(clock.to_string())))?;

        if !clock_us.is_finite() {
            return Err(ParsingError::Clock(clock.to_string()));
        }
        if clock_us >= BAD_CLOCK_US {
            return Err(ParsingError::BadClock);
        }

        Ok(Self { sv, clock_us })
    }
}

/// Extracts all clock offsets from readable SP3 content.
///
/// `last_epoch` is the final [Epoch] of previously parsed data: records
/// are only accepted when their epoch is strictly greater, which prevents
/// reprocessing of overlapping windows. Returns extracted data and the
/// [Epoch] to pass on to the next file, which never regresses.
///
/// Faulty lines are dropped. I/O errors abort and discard this content.
pub fn parse_reader<R: BufRead>(reader: R, last_epoch: Epoch) -> Result<(ClockData, Epoch), Error> {
    let mut data = ClockData::new();
    let mut epoch = Option::<Epoch>::None;
    let mut newest = last_epoch;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();

        if new_epoch(line) {
            match parse_epoch(line) {
                Ok(t) => {
                    epoch = Some(t);
                    newest = newest.max(t);
                },
                Err(_e) => {
                    // following records can't be attributed
                    epoch = None;
                    #[cfg(feature = "log")]
                    error!("epoch descriptor \"{}\": {}", line, _e);
                },
            }
        } else if clock_entry(line) {
            let t = match epoch {
                Some(t) if t > last_epoch => t,
                _ => continue,
            };
            match ClockEntry::from_str(line) {
                Ok(entry) => {
                    data.entry(entry.sv).or_default().push(t, entry.clock_s());
                },
                Err(_e) => {
                    #[cfg(feature = "log")]
                    debug!("{}: dropping \"{}\": {}", t, line, _e);
                },
            }
        } else if end_of_file(line) {
            break;
        }
    }
    Ok((data, newest))
}

/// Extracts all clock offsets from given SP3 file,
/// with seamless .gz decompression if compiled with the "flate2" feature.
/// See [parse_reader] for the `last_epoch` semantics.
pub fn parse_file(path: impl AsRef<Path>, last_epoch: Epoch) -> Result<(ClockData, Epoch), Error> {
    let reader = BufferedReader::new(path.as_ref())?;
    parse_reader(reader, last_epoch)
}
