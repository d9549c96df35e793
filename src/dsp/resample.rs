//! Rate conversion: Fourier-domain resampling and FIR decimation.
//!
//! Three strategies with different exactness/cost trade-offs. `resample`
//! hits the requested rate exactly via the frequency domain,
//! `decimate_and_interpolate` decimates first to limit aliasing and then
//! resamples up to the exact rate, and `almost_decimate` only decimates by
//! an integer factor and reports the rate it actually achieved.

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Error, Result};

/// Fourier-domain resampling to a lower rate.
///
/// Returns the new rate and exactly `round(duration * new_fs)` samples.
/// Frequency content below the new Nyquist is preserved; everything above
/// it is cut, so a tone at an exact bin survives bit-for-bit.
pub fn resample(data: &[f64], fs: u32, new_fs: u32) -> Result<(u32, Vec<f64>)> {
    validate_rates(fs, new_fs)?;
    if data.is_empty() {
        return Err(Error::EmptyInput("resample input"));
    }

    let duration = data.len() as f64 / fs as f64;
    let num = (duration * new_fs as f64).round() as usize;
    if num == 0 {
        let required = (fs as u64).div_ceil(2 * new_fs as u64) as usize;
        return Err(Error::SignalTooShort {
            len: data.len(),
            required,
        });
    }

    debug!(
        "resample: {} samples at {} Hz -> {} samples at {} Hz",
        data.len(),
        fs,
        num,
        new_fs
    );

    Ok((new_fs, fourier_resample(data, num)))
}

/// Decimate by `fs / gcd(fs, new_fs)` with a FIR anti-alias filter, then
/// Fourier-resample up by `new_fs / gcd(fs, new_fs)` to land on `new_fs`
/// exactly.
pub fn decimate_and_interpolate(data: &[f64], fs: u32, new_fs: u32) -> Result<(u32, Vec<f64>)> {
    validate_rates(fs, new_fs)?;
    if data.is_empty() {
        return Err(Error::EmptyInput("decimation input"));
    }

    let gcd = gcd(fs, new_fs);
    let decimation_factor = (fs / gcd) as usize;
    let interpolation_factor = (new_fs / gcd) as usize;

    let decimated = fir_decimate(data, decimation_factor);
    let final_len = decimated.len() * interpolation_factor;

    debug!(
        "decimate_and_interpolate: factors {}:{}, {} -> {} -> {} samples",
        decimation_factor,
        interpolation_factor,
        data.len(),
        decimated.len(),
        final_len
    );

    Ok((new_fs, fourier_resample(&decimated, final_len)))
}

/// Integer decimation by `floor(fs / new_fs)` only.
///
/// Cheaper than the exact converters but generally misses the requested
/// rate; the rate actually achieved is computed from the decimated length
/// and the original duration and returned in its place.
pub fn almost_decimate(data: &[f64], fs: u32, new_fs: u32) -> Result<(u32, Vec<f64>)> {
    validate_rates(fs, new_fs)?;
    if data.is_empty() {
        return Err(Error::EmptyInput("decimation input"));
    }

    let factor = (fs / new_fs) as usize;
    let decimated = fir_decimate(data, factor);

    let duration = data.len() as f64 / fs as f64;
    let actual_fs = (decimated.len() as f64 / duration) as u32;

    debug!(
        "almost_decimate: factor {}, requested {} Hz, achieved {} Hz",
        factor, new_fs, actual_fs
    );

    Ok((actual_fs, decimated))
}

fn validate_rates(fs: u32, new_fs: u32) -> Result<()> {
    if fs == 0 || new_fs == 0 {
        return Err(Error::ZeroSampleRate);
    }
    if new_fs >= fs {
        return Err(Error::InvalidRate { fs, new_fs });
    }
    Ok(())
}

fn gcd(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Resample a real sequence to `num` samples through the frequency domain:
/// forward FFT, truncate or extend the spectrum with Nyquist-bin handling,
/// inverse FFT.
fn fourier_resample(data: &[f64], num: usize) -> Vec<f64> {
    let n = data.len();
    if num == n {
        return data.to_vec();
    }

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(n);
    let mut buf: Vec<Complex<f64>> = data.iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut buf);

    let nkeep = num.min(n);
    let nyq = nkeep / 2 + 1;
    let mut spec = vec![Complex::new(0.0, 0.0); num];
    spec[..nyq].copy_from_slice(&buf[..nyq]);
    if nkeep > 2 {
        let neg = nkeep - nyq;
        spec[num - neg..].copy_from_slice(&buf[n - neg..]);
    }
    if nkeep % 2 == 0 {
        let half = nkeep / 2;
        if num < n {
            // Fold the mirrored Nyquist component into the kept one.
            spec[num - half] += buf[n - half];
        } else {
            // Split the Nyquist component across both halves.
            spec[half] *= 0.5;
            spec[num - half] = spec[half];
        }
    }

    let inverse = planner.plan_fft_inverse(num);
    inverse.process(&mut spec);

    // rustfft leaves the inverse unnormalized; combined with the num/n
    // amplitude correction this reduces to dividing by the input length.
    spec.iter().map(|c| c.re / n as f64).collect()
}

/// Zero-phase FIR decimation by an integer factor.
///
/// Hamming-windowed sinc lowpass with `20q + 1` taps and cutoff at `1/q` of
/// Nyquist, evaluated at every `q`-th input position with the group delay
/// compensated. Output holds `ceil(len / q)` samples; the input is treated
/// as zero outside its bounds.
fn fir_decimate(data: &[f64], q: usize) -> Vec<f64> {
    if q <= 1 {
        return data.to_vec();
    }

    let ntaps = 20 * q + 1;
    let delay = 10 * q;
    let cutoff = 1.0 / q as f64;

    let mut taps: Vec<f64> = (0..ntaps)
        .map(|k| {
            let m = k as f64 - delay as f64;
            let window = 0.54 - 0.46 * (2.0 * PI * k as f64 / (ntaps - 1) as f64).cos();
            cutoff * sinc(cutoff * m) * window
        })
        .collect();
    let scale: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= scale;
    }

    let out_len = data.len().div_ceil(q);
    let mut out = Vec::with_capacity(out_len);
    for j in 0..out_len {
        let center = j * q + delay;
        let mut acc = 0.0;
        for (k, &tap) in taps.iter().enumerate() {
            if let Some(&x) = center.checked_sub(k).and_then(|idx| data.get(idx)) {
                acc += tap * x;
            }
        }
        out.push(acc);
    }
    out
}

/// Normalized sinc, `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}
