// src/extract.rs
//
// Frequency extraction: collapse the spectral grid to one grid-frequency
// estimate per time slice, and the top-level signal-to-trace orchestration.

use log::info;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::dsp::filter::butter_bandpass_filter;
use crate::dsp::resample::resample;
use crate::dsp::stft::{stft, SpectralGrid, StftParams};
use crate::error::{Error, Result};
use crate::signal::{EnfSeries, Signal};

/// Strategy for collapsing each spectral slice to one frequency value.
///
/// Both start from the same per-slice peak pick and refine it in mutually
/// exclusive ways: median smoothing suppresses transient misdetections
/// across slices, quadratic interpolation resolves each slice below bin
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyEstimator {
    /// Raw peak bin per slice, then a running median over the slice
    /// sequence.
    MedianSmoothed { kernel_size: usize },
    /// Parabolic sub-bin refinement per slice, no smoothing.
    QuadraticInterpolation,
}

impl Default for FrequencyEstimator {
    fn default() -> Self {
        Self::MedianSmoothed { kernel_size: 29 }
    }
}

/// Extraction pipeline configuration.
///
/// Defaults target a 50 Hz grid: a half-Hz band around nominal, order-4
/// bandpass, 64 s analysis windows, and analysis at 300 Hz when the source
/// rate is higher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnfExtractor {
    /// Lower bandpass edge in Hz.
    pub low_cut: f64,
    /// Upper bandpass edge in Hz.
    pub high_cut: f64,
    /// Bandpass order.
    pub filter_order: usize,
    /// STFT window length in seconds.
    pub window_secs: u32,
    /// Analysis rate; the signal is resampled down to this when it is
    /// strictly below the source rate, otherwise left untouched. `None`
    /// always analyzes at the source rate.
    pub target_rate: Option<u32>,
    pub estimator: FrequencyEstimator,
}

impl Default for EnfExtractor {
    fn default() -> Self {
        Self {
            low_cut: 49.5,
            high_cut: 50.5,
            filter_order: 4,
            window_secs: 64,
            target_rate: Some(300),
            estimator: FrequencyEstimator::default(),
        }
    }
}

impl EnfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the passband, e.g. around a harmonic of the grid nominal.
    pub fn band(mut self, low_cut: f64, high_cut: f64) -> Self {
        self.low_cut = low_cut;
        self.high_cut = high_cut;
        self
    }

    /// Analyze at the source rate, skipping the downsampling step.
    pub fn native_rate(mut self) -> Self {
        self.target_rate = None;
        self
    }

    /// Use sub-bin quadratic interpolation instead of median smoothing.
    pub fn interpolated(mut self) -> Self {
        self.estimator = FrequencyEstimator::QuadraticInterpolation;
        self
    }

    /// Run the full pipeline: optional downsample, bandpass, STFT, per-slice
    /// frequency estimation.
    pub fn extract(&self, signal: &Signal) -> Result<EnfSeries> {
        let (fs, samples) = match self.target_rate {
            Some(rate) if rate < signal.sample_rate() => {
                resample(signal.samples(), signal.sample_rate(), rate)?
            }
            _ => (signal.sample_rate(), signal.samples().to_vec()),
        };

        let filtered =
            butter_bandpass_filter(&samples, self.filter_order, self.low_cut, self.high_cut, fs)?;

        let params = StftParams {
            window_secs: self.window_secs,
        };
        let grid = stft(&filtered, fs, &params)?;

        let frequencies = match self.estimator {
            FrequencyEstimator::MedianSmoothed { kernel_size } => {
                median_filter(&peak_frequencies(&grid), kernel_size)?
            }
            FrequencyEstimator::QuadraticInterpolation => interpolate(&grid)?,
        };

        info!(
            "extracted {} frequency estimates at {} Hz analysis rate",
            frequencies.len(),
            fs
        );

        EnfSeries::new(frequencies)
    }
}

/// Extract a grid-frequency trace with the default pipeline shape: one
/// estimate per second of (possibly downsampled) input.
///
/// `target_rate` is applied only when it is strictly below the signal rate.
pub fn enf_series(
    signal: &Signal,
    low_cut: f64,
    high_cut: f64,
    target_rate: Option<u32>,
) -> Result<EnfSeries> {
    EnfExtractor {
        low_cut,
        high_cut,
        target_rate,
        ..EnfExtractor::default()
    }
    .extract(signal)
}

/// Raw peak-bin frequency for every time slice, no sub-bin refinement.
pub fn peak_frequencies(grid: &SpectralGrid) -> Vec<f64> {
    grid.slices
        .iter()
        .map(|slice| grid.frequencies[peak_bin(slice)])
        .collect()
}

/// Per-slice peak with parabolic sub-bin refinement.
///
/// Fits a parabola through the magnitudes at `max_idx - 1, max_idx,
/// max_idx + 1`; the refined estimate is `(max_idx + p) * bin_size` with
/// `p = 0.5 (left - right) / (left - 2 center + right)`. A peak on the
/// first or last bin leaves no neighborhood to fit and fails with
/// [`Error::DegenerateSpectrum`].
pub fn interpolate(grid: &SpectralGrid) -> Result<Vec<f64>> {
    let bin_size = grid.bin_size();
    let mut estimates = Vec::with_capacity(grid.slices.len());

    for (slice_idx, slice) in grid.slices.iter().enumerate() {
        let max_idx = peak_bin(slice);
        if max_idx == 0 || max_idx + 1 == slice.len() {
            return Err(Error::DegenerateSpectrum {
                slice: slice_idx,
                reason: "peak at spectrum edge",
            });
        }

        let left = slice[max_idx - 1].norm();
        let center = slice[max_idx].norm();
        let right = slice[max_idx + 1].norm();
        let denom = left - 2.0 * center + right;
        if denom == 0.0 {
            return Err(Error::DegenerateSpectrum {
                slice: slice_idx,
                reason: "flat peak neighborhood",
            });
        }

        let p = 0.5 * (left - right) / denom;
        estimates.push((max_idx as f64 + p) * bin_size);
    }

    Ok(estimates)
}

/// Running median with zero-padded edges, `kernel_size` odd.
///
/// Keeps output length equal to input length; a value that spikes for a
/// single slice is replaced by its neighborhood median.
pub fn median_filter(values: &[f64], kernel_size: usize) -> Result<Vec<f64>> {
    if kernel_size % 2 == 0 {
        return Err(Error::EvenMedianKernel(kernel_size));
    }
    if values.is_empty() {
        return Err(Error::EmptyInput("median filter input"));
    }

    let half = kernel_size / 2;
    let mut window = Vec::with_capacity(kernel_size);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        window.clear();
        for j in 0..kernel_size {
            let idx = i as isize + j as isize - half as isize;
            if idx >= 0 && (idx as usize) < values.len() {
                window.push(values[idx as usize]);
            } else {
                window.push(0.0); // zero-padded beyond the ends
            }
        }
        window.sort_by(|a, b| a.total_cmp(b));
        out.push(window[half]);
    }

    Ok(out)
}

fn peak_bin(spectrum: &[Complex<f64>]) -> usize {
    let mut max_idx = 0;
    let mut max_mag = f64::NEG_INFINITY;
    for (i, value) in spectrum.iter().enumerate() {
        let mag = value.norm();
        if mag > max_mag {
            max_mag = mag;
            max_idx = i;
        }
    }
    max_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn grid_from_magnitudes(mags: &[f64], bin_size: f64) -> SpectralGrid {
        SpectralGrid {
            frequencies: (0..mags.len()).map(|i| i as f64 * bin_size).collect(),
            times: vec![0.0],
            slices: vec![mags.iter().map(|&m| Complex::new(m, 0.0)).collect()],
        }
    }

    #[test]
    fn test_quadratic_interpolation() {
        // left 1, center 3, right 2: p = 0.5 * (1 - 2) / (1 - 6 + 2) = 1/6.
        let grid = grid_from_magnitudes(&[0.0, 1.0, 3.0, 2.0, 0.0], 1.0);
        let estimates = interpolate(&grid).unwrap();
        assert!((estimates[0] - (2.0 + 1.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_interpolation_rejects_edge_peaks() {
        let at_start = grid_from_magnitudes(&[5.0, 1.0, 0.5], 1.0);
        assert!(matches!(
            interpolate(&at_start),
            Err(Error::DegenerateSpectrum { slice: 0, .. })
        ));

        let at_end = grid_from_magnitudes(&[0.5, 1.0, 5.0], 1.0);
        assert!(matches!(
            interpolate(&at_end),
            Err(Error::DegenerateSpectrum { slice: 0, .. })
        ));
    }

    #[test]
    fn test_median_filter_suppresses_spike() {
        let mut values = vec![50.0; 61];
        values[30] = 55.0;

        let smoothed = median_filter(&values, 29).unwrap();
        assert_eq!(smoothed.len(), values.len());
        assert_eq!(smoothed[30], 50.0);
        assert!(smoothed.iter().all(|&v| v == 50.0));
    }

    #[test]
    fn test_median_filter_rejects_even_kernel() {
        let values = vec![50.0; 10];
        assert!(matches!(
            median_filter(&values, 4),
            Err(Error::EvenMedianKernel(4))
        ));
    }

    #[test]
    fn test_peak_frequencies_picks_max_bin() {
        let grid = SpectralGrid {
            frequencies: vec![0.0, 1.0, 2.0, 3.0],
            times: vec![0.0, 1.0],
            slices: vec![
                vec![
                    Complex::new(0.1, 0.0),
                    Complex::new(2.0, 0.0),
                    Complex::new(0.3, 0.0),
                    Complex::new(0.2, 0.0),
                ],
                vec![
                    Complex::new(0.1, 0.0),
                    Complex::new(0.4, 0.0),
                    Complex::new(0.2, 0.0),
                    Complex::new(3.0, 0.0),
                ],
            ],
        };
        assert_eq!(peak_frequencies(&grid), vec![1.0, 3.0]);
    }

    #[test]
    fn test_extract_steady_tone() {
        // 100 s of a 50.2 Hz tone at 300 Hz: 37 slices, every estimate on
        // the 50.203125 Hz bin.
        let fs = 300;
        let samples: Vec<f64> = (0..30_000)
            .map(|i| (2.0 * PI * 50.2 * i as f64 / fs as f64).sin())
            .collect();
        let signal = Signal::new(samples, fs).unwrap();

        let trace = EnfExtractor::new().extract(&signal).unwrap();
        assert_eq!(trace.len(), 37);
        for &f in trace.frequencies() {
            assert!((f - 50.2).abs() < 0.02, "estimate {} drifted", f);
        }
    }

    #[test]
    fn test_enf_series_matches_extractor() {
        let fs = 300;
        let samples: Vec<f64> = (0..30_000)
            .map(|i| (2.0 * PI * 50.2 * i as f64 / fs as f64).sin())
            .collect();
        let signal = Signal::new(samples, fs).unwrap();

        let via_fn = enf_series(&signal, 49.5, 50.5, Some(300)).unwrap();
        let via_config = EnfExtractor::new().extract(&signal).unwrap();
        assert_eq!(via_fn, via_config);
    }

    #[test]
    fn test_extract_downsamples_first() {
        // 1500 Hz source drops to the 300 Hz analysis rate; the trace still
        // lands on the tone.
        let fs = 1500;
        let samples: Vec<f64> = (0..150_000)
            .map(|i| (2.0 * PI * 50.25 * i as f64 / fs as f64).sin())
            .collect();
        let signal = Signal::new(samples, fs).unwrap();

        let trace = EnfExtractor::new().extract(&signal).unwrap();
        assert_eq!(trace.len(), 37);
        for &f in trace.frequencies() {
            assert!((f - 50.25).abs() < 0.02);
        }
    }
}
