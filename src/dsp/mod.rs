//! Digital signal processing kernels: rate conversion, Butterworth bandpass
//! filtering, and short-time spectral estimation.

pub mod filter;
pub mod resample;
pub mod stft;

use std::f64::consts::PI;

/// Periodic Hann window of length `size` (denominator `n`, not `n - 1`), the
/// form that keeps overlapping analysis segments complementary.
pub fn hann_periodic(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_periodic() {
        let window = hann_periodic(8);
        assert_eq!(window.len(), 8);
        assert!(window[0].abs() < 1e-12); // zero at the left edge
        assert!((window[4] - 1.0).abs() < 1e-12); // unity mid-window
        assert!((window[1] - window[7]).abs() < 1e-12); // periodic symmetry
    }
}
