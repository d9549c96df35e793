//! Butterworth bandpass design and second-order-section filtering.
//!
//! The design follows the classic zpk pipeline: analog prototype poles,
//! band-edge pre-warping, lowpass-to-bandpass transform, bilinear transform,
//! then pairing into cascaded biquads. Cascading second-order sections keeps
//! higher orders numerically stable where a flat transfer-function
//! polynomial would not be.

use std::f64::consts::PI;

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bandpass filter specification; fully determines the design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Analog prototype order. The digital bandpass has twice this order,
    /// realized as `order` biquad sections.
    pub order: usize,
    /// Lower -3 dB edge in Hz.
    pub low_cut: f64,
    /// Upper -3 dB edge in Hz.
    pub high_cut: f64,
    /// Rate of the signal the filter will run at, in Hz.
    pub sample_rate: u32,
}

impl FilterSpec {
    pub fn new(order: usize, low_cut: f64, high_cut: f64, sample_rate: u32) -> Result<Self> {
        let spec = Self {
            order,
            low_cut,
            high_cut,
            sample_rate,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::ZeroSampleRate);
        }
        if self.order == 0 {
            return Err(Error::InvalidFilterOrder(self.order));
        }
        let nyquist = self.nyquist();
        let ordered = self.low_cut > 0.0 && self.low_cut < self.high_cut && self.high_cut < nyquist;
        if !ordered || !self.low_cut.is_finite() || !self.high_cut.is_finite() {
            return Err(Error::InvalidPassband {
                low_cut: self.low_cut,
                high_cut: self.high_cut,
                nyquist,
            });
        }
        Ok(())
    }
}

/// One biquad, coefficients normalized so `a[0] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sos {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

struct ScoredSection {
    /// Pole radius; sections are cascaded farthest-from-unit-circle first.
    radius: f64,
    section: Sos,
}

/// Design a Butterworth bandpass as cascaded second-order sections.
///
/// Returns `spec.order` sections. Every section carries the bandpass zeros
/// at z = +1 and z = -1; the overall gain rides on the first section.
pub fn butter_bandpass(spec: &FilterSpec) -> Result<Vec<Sos>> {
    spec.validate()?;

    // Pre-warp the band edges for the bilinear transform (internal rate 2,
    // so the transform constant is 4).
    let fs2 = 4.0;
    let nyquist = spec.nyquist();
    let warped_low = fs2 * (PI * spec.low_cut / nyquist / 2.0).tan();
    let warped_high = fs2 * (PI * spec.high_cut / nyquist / 2.0).tan();
    let bw = warped_high - warped_low;
    let wo_sq = warped_low * warped_high;

    let order = spec.order;
    let n = order as f64;
    let c = Complex::new(fs2, 0.0);

    let mut sections: Vec<ScoredSection> = Vec::with_capacity(order);
    // Running product of (4 - s) over all analog bandpass poles, for the
    // bilinear gain correction.
    let mut pole_product = 1.0f64;

    // Upper-half prototype poles; each lowpass-to-bandpass split yields two
    // conjugate pole pairs, so two sections.
    for k in 0..order / 2 {
        let theta = PI * (2.0 * k as f64 + 1.0 - n) / (2.0 * n);
        let proto = -Complex::new(theta.cos(), theta.sin());

        let s = proto * (bw / 2.0);
        let split = (s * s - wo_sq).sqrt();
        for q in [s + split, s - split] {
            let digital = (c + q) / (c - q);
            pole_product *= (c - q).norm_sqr();
            sections.push(conjugate_section(digital));
        }
    }

    // Odd orders add the real prototype pole at -1.
    if order % 2 == 1 {
        let s = -bw / 2.0;
        let disc = s * s - wo_sq;
        if disc < 0.0 {
            let q = Complex::new(s, (-disc).sqrt());
            let digital = (c + q) / (c - q);
            pole_product *= (c - q).norm_sqr();
            sections.push(conjugate_section(digital));
        } else {
            // Band wide enough that the pair splits into two real poles.
            let root = disc.sqrt();
            let (q1, q2) = (s + root, s - root);
            let (d1, d2) = ((fs2 + q1) / (fs2 - q1), (fs2 + q2) / (fs2 - q2));
            pole_product *= (fs2 - q1) * (fs2 - q2);
            sections.push(ScoredSection {
                radius: d1.abs().max(d2.abs()),
                section: Sos {
                    b: [1.0, 0.0, -1.0],
                    a: [1.0, -(d1 + d2), d1 * d2],
                },
            });
        }
    }

    let gain = bw.powi(order as i32) * fs2.powi(order as i32) / pole_product;

    sections.sort_by(|x, y| x.radius.total_cmp(&y.radius));
    let mut sos: Vec<Sos> = sections.into_iter().map(|s| s.section).collect();
    sos[0].b = [gain, 0.0, -gain];
    Ok(sos)
}

fn conjugate_section(pole: Complex<f64>) -> ScoredSection {
    ScoredSection {
        radius: pole.norm(),
        section: Sos {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -2.0 * pole.re, pole.norm_sqr()],
        },
    }
}

/// Run a section cascade over the signal causally: one forward pass in
/// direct-form II transposed, so the group delay stays in the output.
pub fn sosfilt(sections: &[Sos], data: &[f64]) -> Vec<f64> {
    let mut state = vec![[0.0f64; 2]; sections.len()];
    let mut out = Vec::with_capacity(data.len());

    for &sample in data {
        let mut x = sample;
        for (sec, st) in sections.iter().zip(state.iter_mut()) {
            let y = sec.b[0] * x + st[0];
            st[0] = sec.b[1] * x - sec.a[1] * y + st[1];
            st[1] = sec.b[2] * x - sec.a[2] * y;
            x = y;
        }
        out.push(x);
    }
    out
}

/// Design an order-`order` Butterworth bandpass and apply it causally.
pub fn butter_bandpass_filter(
    data: &[f64],
    order: usize,
    low_cut: f64,
    high_cut: f64,
    sample_rate: u32,
) -> Result<Vec<f64>> {
    if data.is_empty() {
        return Err(Error::EmptyInput("filter input"));
    }
    let spec = FilterSpec::new(order, low_cut, high_cut, sample_rate)?;
    let sos = butter_bandpass(&spec)?;
    Ok(sosfilt(&sos, data))
}
