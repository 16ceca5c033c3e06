//! Clock offset processing: phase step removal, outlier rejection,
//! trend removal and frequency stability analysis.
mod allan;
mod detrend;
mod fir;
mod frequency;
mod outlier;
mod psd;
mod stitching;

pub use allan::{
    allan, allan_deviation, AllanDeviation, TauGrid, DEFAULT_MAX_TAU, ONE_DAY, ONE_HOUR,
};
pub use detrend::{detrend, detrend_seconds, polyfit, Detrended, Trend};
pub use fir::{decimate, kaiser_beta, kaiser_length, kaiser_window, FirFilter};
pub use frequency::{
    frequency_offset, frequency_offset_lookback, lookback_samples, FrequencyOffset,
    FREQUENCY_LOOKBACK_S,
};
pub use outlier::outlier_filter;
pub use psd::{psd, Octave, PowerSpectrum, DECIMATION, DEFAULT_CARRIER_HZ, DEFAULT_SEGMENT_LENGTH};
pub use stitching::{stitch, GapStitcher};
