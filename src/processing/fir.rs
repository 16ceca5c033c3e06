//! Kaiser windowed FIR low pass, used ahead of decimation
use std::f64::consts::PI;

/// Modified Bessel function of the first kind, order 0 (power series)
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0_f64;
    let mut sum = 1.0_f64;
    let mut k = 1.0_f64;
    while term > sum * 1.0E-16 {
        term *= (half / k) * (half / k);
        sum += term;
        k += 1.0;
    }
    sum
}

/// Kaiser shape parameter achieving given stop band attenuation
pub fn kaiser_beta(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        let a = attenuation_db - 21.0;
        0.5842 * a.powf(0.4) + 0.07886 * a
    } else {
        0.0
    }
}

/// Minimal (odd) number of taps achieving given stop band attenuation
/// over given transition width (cycles/sample).
pub fn kaiser_length(transition_width: f64, attenuation_db: f64) -> usize {
    let order = ((attenuation_db - 7.95) / (14.36 * transition_width)).ceil() as usize;
    let order = order.max(1);
    if order % 2 == 0 {
        order + 1
    } else {
        order
    }
}

/// Kaiser window of given length
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length < 2 {
        return vec![1.0; length];
    }
    let half = (length - 1) as f64 / 2.0;
    let norm = bessel_i0(beta);
    (0..length)
        .map(|n| {
            let r = (n as f64 - half) / half;
            bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / norm
        })
        .collect()
}

/// Linear phase (symmetric) FIR filter
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    taps: Vec<f64>,
}

impl FirFilter {
    /// Windowed sinc low pass with unity DC gain.
    /// `cutoff` and `transition_width` are expressed in cycles/sample (0 to 0.5).
    pub fn lowpass_kaiser(cutoff: f64, attenuation_db: f64, transition_width: f64) -> Self {
        let length = kaiser_length(transition_width, attenuation_db);
        let window = kaiser_window(length, kaiser_beta(attenuation_db));
        let center = (length - 1) as f64 / 2.0;

        let mut taps = window
            .iter()
            .enumerate()
            .map(|(n, w)| {
                let k = n as f64 - center;
                let sinc = if k == 0.0 {
                    2.0 * cutoff
                } else {
                    (2.0 * PI * cutoff * k).sin() / (PI * k)
                };
                sinc * w
            })
            .collect::<Vec<_>>();

        let gain = taps.iter().sum::<f64>();
        if gain.abs() > 0.0 {
            taps.iter_mut().for_each(|t| *t /= gain);
        }
        Self { taps }
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Zero phase filtering: output is aligned with, and has the same length as,
    /// the input. Samples outside the input are considered null.
    pub fn filter(&self, x: &[f64]) -> Vec<f64> {
        let center = self.taps.len() / 2;
        (0..x.len())
            .map(|i| {
                self.taps
                    .iter()
                    .enumerate()
                    .filter_map(|(j, h)| {
                        (i + center).checked_sub(j).and_then(|k| x.get(k)).map(|x| h * x)
                    })
                    .sum()
            })
            .collect()
    }
}

/// Keeps one sample out of `factor`
pub fn decimate(x: &[f64], factor: usize) -> Vec<f64> {
    x.iter().step_by(factor.max(1)).copied().collect()
}
