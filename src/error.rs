// src/error.rs
//
// Crate-wide error type. Validation failures surface at the point of
// detection; nothing is retried or recovered internally.

use thiserror::Error;

/// Errors produced by extraction, matching, and the provider boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Target sample rate must be strictly below the source rate.
    #[error("target rate {new_fs} Hz is not below the source rate {fs} Hz")]
    InvalidRate { fs: u32, new_fs: u32 },

    #[error("sample rate must be positive")]
    ZeroSampleRate,

    /// Zero-length input where content is required; names the argument.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Input shorter than one analysis window.
    #[error("signal too short: {len} samples, need at least {required}")]
    SignalTooShort { len: usize, required: usize },

    #[error("filter order must be at least 1, got {0}")]
    InvalidFilterOrder(usize),

    /// Cutoffs must satisfy 0 < low < high < Nyquist.
    #[error("invalid passband [{low_cut}, {high_cut}] Hz against Nyquist {nyquist} Hz")]
    InvalidPassband {
        low_cut: f64,
        high_cut: f64,
        nyquist: f64,
    },

    /// Peak at a spectrum edge or a flat three-point neighborhood, where
    /// sub-bin interpolation is undefined.
    #[error("degenerate spectrum in time slice {slice}: {reason}")]
    DegenerateSpectrum { slice: usize, reason: &'static str },

    #[error("median kernel size must be odd, got {0}")]
    EvenMedianKernel(usize),

    #[error("non-finite frequency value at index {index}")]
    NonFiniteFrequency { index: usize },

    #[error("reference timestamps decrease at row {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("unparseable timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Failure surfaced through the reference-provider boundary.
    #[error("reference provider: {0}")]
    Provider(String),

    #[error(transparent)]
    Fft(#[from] realfft::FftError),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
