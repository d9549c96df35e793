// tests/test_utils/mod.rs
//
// Shared helpers for integration tests: deterministic synthetic hum and
// log capture.

use std::f64::consts::PI;

/// Initialize log capture once per test binary; safe to call repeatedly.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Grid frequency at second `t` of the synthetic drift timeline: a slow
/// swing of +-0.3 Hz around the 50 Hz nominal, period 200 s.
pub fn drift_frequency(t: f64) -> f64 {
    50.0 + 0.3 * (2.0 * PI * t / 200.0).sin()
}

/// Phase-continuous hum following [`drift_frequency`] over seconds
/// `[start_sec, start_sec + duration_secs)`, sampled at `fs`.
pub fn drifting_hum(fs: u32, start_sec: f64, duration_secs: f64) -> Vec<f64> {
    let num_samples = (duration_secs * fs as f64).round() as usize;
    let mut phase = 0.0f64;
    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = start_sec + i as f64 / fs as f64;
        phase += 2.0 * PI * drift_frequency(t) / fs as f64;
        samples.push(0.7 * phase.sin());
    }
    samples
}

/// Deterministic broadband noise in `[-amplitude, amplitude]`.
pub fn noise(len: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let uniform = (state >> 33) as f64 / (1u64 << 31) as f64;
            (uniform * 2.0 - 1.0) * amplitude
        })
        .collect()
}
