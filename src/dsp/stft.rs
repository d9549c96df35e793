//! Short-time Fourier transform tuned for grid-frequency tracking.

use log::debug;
use num_complex::Complex;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

use crate::dsp::hann_periodic;
use crate::error::{Error, Result};

/// STFT parameters.
///
/// The window length is given in seconds so the hop stays at exactly one
/// second regardless of rate: `nperseg = fs * window_secs`, `hop = fs`, one
/// output slice per second of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StftParams {
    /// Analysis window length in seconds.
    pub window_secs: u32,
}

impl Default for StftParams {
    fn default() -> Self {
        // Grid frequency drifts sub-Hz over seconds; 64 s windows maximize
        // frequency resolution while the one-second hop still follows the
        // drift.
        Self { window_secs: 64 }
    }
}

/// Complex spectra over time, plus both axes.
///
/// Transient by design: produced and consumed within one extraction call.
#[derive(Debug, Clone)]
pub struct SpectralGrid {
    /// Bin center frequencies in Hz, `frequencies[i] = i * fs / nperseg`.
    pub frequencies: Vec<f64>,
    /// Window-center time of each slice in seconds.
    pub times: Vec<f64>,
    /// One complex spectrum per time slice.
    pub slices: Vec<Vec<Complex<f64>>>,
}

impl SpectralGrid {
    pub fn num_slices(&self) -> usize {
        self.slices.len()
    }

    /// Frequency-bin spacing in Hz.
    pub fn bin_size(&self) -> f64 {
        if self.frequencies.len() > 1 {
            self.frequencies[1] - self.frequencies[0]
        } else {
            0.0
        }
    }
}

/// Short-time Fourier transform with a periodic Hann window and a
/// one-second hop.
///
/// Emits full windows only, `floor((len - nperseg) / hop) + 1` slices with
/// no boundary padding; a signal shorter than one window fails with
/// [`Error::SignalTooShort`].
pub fn stft(data: &[f64], fs: u32, params: &StftParams) -> Result<SpectralGrid> {
    if fs == 0 {
        return Err(Error::ZeroSampleRate);
    }
    if params.window_secs == 0 {
        return Err(Error::EmptyInput("analysis window"));
    }
    if data.is_empty() {
        return Err(Error::EmptyInput("stft input"));
    }

    let nperseg = fs as usize * params.window_secs as usize;
    let hop = fs as usize;
    if data.len() < nperseg {
        return Err(Error::SignalTooShort {
            len: data.len(),
            required: nperseg,
        });
    }

    let num_slices = (data.len() - nperseg) / hop + 1;
    let window = hann_periodic(nperseg);

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    let mut slices = Vec::with_capacity(num_slices);
    let mut times = Vec::with_capacity(num_slices);
    for slice_idx in 0..num_slices {
        let start = slice_idx * hop;
        for (dst, (&x, &w)) in input
            .iter_mut()
            .zip(data[start..start + nperseg].iter().zip(window.iter()))
        {
            *dst = x * w;
        }
        fft.process(&mut input, &mut spectrum)?;
        slices.push(spectrum.clone());
        times.push((start + nperseg / 2) as f64 / fs as f64);
    }

    let frequencies = (0..=nperseg / 2)
        .map(|i| i as f64 * fs as f64 / nperseg as f64)
        .collect();

    debug!(
        "stft: {} samples at {} Hz -> {} slices x {} bins",
        data.len(),
        fs,
        num_slices,
        nperseg / 2 + 1
    );

    Ok(SpectralGrid {
        frequencies,
        times,
        slices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: u32, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / fs as f64).sin())
            .collect()
    }

    #[test]
    fn test_slice_count_formula() {
        // nperseg = 8000 * 64 = 512000, hop = 8000:
        // floor((520123 - 512000) / 8000) + 1 = 2 slices.
        let data = vec![0.0; 520_123];
        let grid = stft(&data, 8000, &StftParams::default()).unwrap();
        assert_eq!(grid.num_slices(), 2);
        assert_eq!(grid.frequencies.len(), 512_000 / 2 + 1);
    }

    #[test]
    fn test_short_signal_fails() {
        let data = vec![0.0; 6399];
        let err = stft(&data, 100, &StftParams::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::SignalTooShort {
                len: 6399,
                required: 6400
            }
        ));
    }

    #[test]
    fn test_axes() {
        let data = vec![0.0; 6600];
        let grid = stft(&data, 100, &StftParams::default()).unwrap();
        assert_eq!(grid.num_slices(), 3);
        assert_eq!(grid.frequencies[0], 0.0);
        assert!((grid.bin_size() - 100.0 / 6400.0).abs() < 1e-12);
        // Window centers, one second apart.
        assert!((grid.times[0] - 32.0).abs() < 1e-12);
        assert!((grid.times[1] - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_sine_lands_on_exact_bin() {
        // 10.5 Hz over a 64 s window is 672 whole cycles: bin 672 exactly.
        let data = sine(10.5, 100, 7000);
        let grid = stft(&data, 100, &StftParams::default()).unwrap();
        assert_eq!(grid.num_slices(), 7);

        for slice in &grid.slices {
            let peak = slice
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(peak, 672);
        }
        assert!((grid.frequencies[672] - 10.5).abs() < 1e-9);
    }
}
