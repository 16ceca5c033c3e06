use thiserror::Error;

/// Line level parsing errors. These never abort a file:
/// the faulty line is dropped and parsing moves on.
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("failed to parse epoch year from \"{0}\"")]
    EpochYear(String),
    #[error("failed to parse epoch month from \"{0}\"")]
    EpochMonth(String),
    #[error("failed to parse epoch day from \"{0}\"")]
    EpochDay(String),
    #[error("failed to parse epoch hours from \"{0}\"")]
    EpochHours(String),
    #[error("failed to parse epoch minutes from \"{0}\"")]
    EpochMinutes(String),
    #[error("failed to parse epoch seconds from \"{0}\"")]
    EpochSeconds(String),
    #[error("invalid calendar date \"{0}\"")]
    Epoch(String),
    #[error("truncated epoch descriptor")]
    EpochFormat,
    #[error("failed to parse sv from \"{0}\"")]
    SV(String),
    #[error("missing clock field")]
    MissingClock,
    #[error("failed to parse clock data from \"{0}\"")]
    Clock(String),
    #[error("clock data flagged as bad or absent")]
    BadClock,
}

/// Errors surfaced to the caller
#[derive(Debug, Error)]
pub enum Error {
    #[error("file i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing error: {0}")]
    Parsing(#[from] ParsingError),
    #[error("outlier filter window must be odd, got {0}")]
    InvalidWindowSize(usize),
    #[error("outlier threshold must be strictly positive")]
    InvalidThreshold,
    #[error("at least one satellite must be selected")]
    NoSatellites,
    #[error("end of time range precedes its start")]
    InvertedRange,
    #[error("sampling interval must be strictly positive")]
    InvalidSamplingInterval,
    #[error("psd segment length must be at least 2")]
    InvalidSegmentLength,
    #[error("polynomial degree must be 1 or 2, got {0}")]
    InvalidDegree(usize),
    #[error("fit of degree {degree} requires at least one sample, got {samples}")]
    NotEnoughSamples { degree: usize, samples: usize },
    #[error("times and values do not share the same length")]
    LengthMismatch,
    #[error("failed to solve least squares problem: {0}")]
    LeastSquares(&'static str),
    #[error("processing interrupted")]
    Interrupted,
}
