//! Power spectral density over several decades of offset frequency,
//! by cascaded low pass filtering and decimation.
use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::{
    prelude::Error,
    processing::fir::{decimate, FirFilter},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "log")]
use log::debug;

/// Default FFT segment length
pub const DEFAULT_SEGMENT_LENGTH: usize = 512;

/// Default nominal carrier frequency (Hz)
pub const DEFAULT_CARRIER_HZ: f64 = 5.0E6;

/// Decimation factor between two octaves
pub const DECIMATION: usize = 10;

/// Anti aliasing filter: cutoff (cycles/sample), stop band attenuation (dB)
/// and transition width (cycles/sample).
const CUTOFF: f64 = 0.01;
const ATTENUATION_DB: f64 = 40.0;
const TRANSITION_WIDTH: f64 = 0.01;

/// Bins below segment_length / [LOW_BIN_DIVISOR] sit in the
/// transition band of the anti aliasing filter.
const LOW_BIN_DIVISOR: usize = 30;

/// PSD of one decimation level
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Octave {
    /// Decimation level (0 = input resolution)
    pub index: usize,
    /// Local sampling interval in seconds
    pub sampling_interval: f64,
    /// Offset frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Phase noise (dBc/Hz)
    pub powers_db: Vec<f64>,
    /// Number of averaged segments
    pub segments: usize,
}

/// Cascaded PSD estimate
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerSpectrum {
    pub octaves: Vec<Octave>,
}

impl PowerSpectrum {
    pub fn is_empty(&self) -> bool {
        self.octaves.iter().all(|octave| octave.frequencies.is_empty())
    }

    /// All (frequency, power) points sorted by ascending frequency.
    /// Points of neighboring octaves sharing a frequency are all kept.
    pub fn composite(&self) -> Vec<(f64, f64)> {
        let mut points = self
            .octaves
            .iter()
            .flat_map(|octave| {
                octave
                    .frequencies
                    .iter()
                    .copied()
                    .zip(octave.powers_db.iter().copied())
            })
            .collect::<Vec<_>>();
        points.sort_by(|(f1, _), (f2, _)| f1.total_cmp(f2));
        points
    }
}

/// Periodic Hann window
fn hann(length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / length as f64).cos())
        .collect()
}

/// Removes the least squares line from the segment
fn remove_line(segment: &mut [f64]) {
    let n = segment.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let x_mean = segment.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (t, x) in segment.iter().enumerate() {
        let dt = t as f64 - t_mean;
        sxy += dt * (x - x_mean);
        sxx += dt * dt;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    for (t, x) in segment.iter_mut().enumerate() {
        *x -= x_mean + slope * (t as f64 - t_mean);
    }
}

/// Estimates the phase noise PSD of phase residual `x` (seconds),
/// evenly sampled every `sampling_interval_s`.
///
/// At each octave, the series is cut into complete, non overlapping segments
/// which are linearly detrended, Hann windowed and transformed. Periodograms
/// are averaged then converted to phase noise of a `carrier_hz` oscillator:
/// L(f) = 10 log10(10 pi^2 f0^2 / segment_length . S(f) . dt).
/// The series is then low pass filtered and decimated by [DECIMATION],
/// until less than one segment remains. Series shorter than one segment
/// give an empty [PowerSpectrum].
///
/// The anti aliasing filter cuts off at 0.01 cycles/sample: in octaves
/// past the first one, points above about 0.1 x the local Nyquist frequency
/// are attenuated. Where neighboring octaves overlap, prefer the point
/// of the lower [Octave] index (finer sampling).
pub fn psd(
    x: &[f64],
    sampling_interval_s: f64,
    segment_length: usize,
    carrier_hz: f64,
) -> Result<PowerSpectrum, Error> {
    if segment_length < 2 {
        return Err(Error::InvalidSegmentLength);
    }
    if sampling_interval_s.is_nan() || sampling_interval_s <= 0.0 {
        return Err(Error::InvalidSamplingInterval);
    }
    if x.len() < segment_length {
        return Ok(PowerSpectrum::default());
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(segment_length);
    let window = hann(segment_length);
    let lowpass = FirFilter::lowpass_kaiser(CUTOFF, ATTENUATION_DB, TRANSITION_WIDTH);

    let low_bin = (segment_length / LOW_BIN_DIVISOR).max(1);
    let high_bin = segment_length / 2;
    let scaling = 10.0 * PI * PI * carrier_hz * carrier_hz / segment_length as f64;

    let mut spectrum = PowerSpectrum::default();
    let mut series = x.to_vec();
    let mut dt = sampling_interval_s;
    let mut index = 0;

    let mut segment = Vec::with_capacity(segment_length);
    let mut buffer = vec![Complex::new(0.0, 0.0); segment_length];

    while series.len() >= segment_length {
        let mut periodogram = vec![0.0_f64; segment_length];
        let mut segments = 0;

        for chunk in series.chunks_exact(segment_length) {
            segment.clear();
            segment.extend_from_slice(chunk);
            remove_line(&mut segment);

            for (b, (s, w)) in buffer.iter_mut().zip(segment.iter().zip(window.iter())) {
                *b = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);

            for (p, b) in periodogram.iter_mut().zip(buffer.iter()) {
                *p += b.norm_sqr();
            }
            segments += 1;
        }

        let mut octave = Octave {
            index,
            sampling_interval: dt,
            segments,
            ..Default::default()
        };

        for bin in low_bin..high_bin {
            let s = periodogram[bin] / segments as f64;
            octave
                .frequencies
                .push(bin as f64 / (segment_length as f64 * dt));
            octave.powers_db.push(10.0 * (scaling * s * dt).log10());
        }

        #[cfg(feature = "log")]
        debug!(
            "psd octave #{}: dt={}s, {} segment(s), {} bins",
            index,
            dt,
            segments,
            octave.frequencies.len()
        );

        spectrum.octaves.push(octave);

        series = decimate(&lowpass.filter(&series), DECIMATION);
        dt *= DECIMATION as f64;
        index += 1;
    }

    Ok(spectrum)
}
