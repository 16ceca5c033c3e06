//! Least squares polynomial detrending
use nalgebra::{DMatrix, DVector};

use crate::{
    prelude::{Epoch, Error},
    series::elapsed_seconds,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Singular values below this level are considered null
const SVD_EPSILON: f64 = 1.0E-12;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Polynomial [Trend] fitted to a series, expressed against
/// seconds elapsed since the first sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trend {
    /// Coefficients in ascending order: c0 + c1.t + c2.t^2 ..
    pub coefficients: Vec<f64>,
}

impl Trend {
    /// Polynomial degree
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates the polynomial at `t` seconds
    pub fn evaluate(&self, t: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c)
    }

    /// Constant term
    pub fn intercept(&self) -> f64 {
        self.coefficients.first().copied().unwrap_or_default()
    }

    /// First order term. On phase data, this is the mean
    /// fractional frequency offset.
    pub fn slope(&self) -> f64 {
        self.coefficients.get(1).copied().unwrap_or_default()
    }

    /// Second order term, if any
    pub fn quadratic(&self) -> Option<f64> {
        self.coefficients.get(2).copied()
    }

    /// Returns the two highest order coefficients:
    /// (slope, intercept) for a line, (quadratic, slope) for a parabola.
    pub fn leading_pair(&self) -> (f64, f64) {
        let n = self.coefficients.len();
        match n {
            0 => (0.0, 0.0),
            1 => (self.coefficients[0], 0.0),
            _ => (self.coefficients[n - 1], self.coefficients[n - 2]),
        }
    }

    /// Fractional frequency drift per day, when fitted to phase data
    /// with a parabola.
    pub fn frequency_drift_per_day(&self) -> Option<f64> {
        self.quadratic().map(|c2| 2.0 * c2 * SECONDS_PER_DAY)
    }
}

/// Residual of a [Trend] removal
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Detrended {
    /// Input minus fitted polynomial
    pub residual: Vec<f64>,
    /// Fitted polynomial
    pub trend: Trend,
}

/// Least squares polynomial fit of `values` against `t`.
/// The time axis is normalized prior solving, for numerical stability.
pub fn polyfit(t: &[f64], values: &[f64], degree: usize) -> Result<Trend, Error> {
    let (scale, scaled) = scaled_fit(t, values, degree)?;
    let coefficients = scaled
        .iter()
        .enumerate()
        .map(|(k, c)| c / scale.powi(k as i32))
        .collect();
    Ok(Trend { coefficients })
}

/// Fits in normalized time u = t / scale, returns (scale, coefficients in u).
/// Underdetermined systems (fewer samples than coefficients) resolve
/// to the minimum norm solution.
fn scaled_fit(t: &[f64], values: &[f64], degree: usize) -> Result<(f64, Vec<f64>), Error> {
    if t.len() != values.len() {
        return Err(Error::LengthMismatch);
    }
    if values.is_empty() {
        return Err(Error::NotEnoughSamples {
            degree,
            samples: values.len(),
        });
    }

    let scale = t.iter().fold(0.0_f64, |max, t| max.max(t.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let a = DMatrix::from_fn(t.len(), degree + 1, |i, k| (t[i] / scale).powi(k as i32));
    let b = DVector::from_column_slice(values);

    let c = a
        .svd(true, true)
        .solve(&b, SVD_EPSILON)
        .map_err(Error::LeastSquares)?;

    Ok((scale, c.iter().copied().collect()))
}

/// Fits and removes a polynomial of given degree from `values`,
/// `t` being expressed in seconds.
pub fn detrend_seconds(t: &[f64], values: &[f64], degree: usize) -> Result<Detrended, Error> {
    if !(1..=2).contains(&degree) {
        return Err(Error::InvalidDegree(degree));
    }
    let (scale, scaled) = scaled_fit(t, values, degree)?;
    let scaled_trend = Trend {
        coefficients: scaled,
    };

    let residual = t
        .iter()
        .zip(values.iter())
        .map(|(t, v)| v - scaled_trend.evaluate(t / scale))
        .collect();

    let coefficients = scaled_trend
        .coefficients
        .iter()
        .enumerate()
        .map(|(k, c)| c / scale.powi(k as i32))
        .collect();

    Ok(Detrended {
        residual,
        trend: Trend { coefficients },
    })
}

/// Fits and removes a polynomial of degree 1 (linear trend) or 2 (drift)
/// from `values`, sampled at given [Epoch]s. Time is expressed in seconds
/// elapsed since the first [Epoch].
pub fn detrend(epochs: &[Epoch], values: &[f64], degree: usize) -> Result<Detrended, Error> {
    detrend_seconds(&elapsed_seconds(epochs), values, degree)
}
