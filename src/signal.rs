// src/signal.rs
//
// Container types for the two numeric sequences the crate handles: raw
// sampled audio and extracted frequency traces. They stay distinct types so
// raw audio cannot reach a matcher that expects a low-rate trace.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A raw sampled signal at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    /// Wrap samples recorded at `sample_rate` Hz.
    ///
    /// Requires at least one sample and a positive rate.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::ZeroSampleRate);
        }
        if samples.is_empty() {
            return Err(Error::EmptyInput("signal samples"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// A grid-frequency trace, one estimate per analysis slice (one per second
/// in the default pipeline).
///
/// Values cluster near the nominal grid frequency (50 or 60 Hz) within a few
/// hundred millihertz. Produced by the extractor or from reference-provider
/// rows; consumed as query or reference by the matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnfSeries {
    frequencies: Vec<f64>,
}

impl EnfSeries {
    /// Wrap per-slice frequency estimates.
    ///
    /// Requires a non-empty sequence of finite values.
    pub fn new(frequencies: Vec<f64>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::EmptyInput("frequency series"));
        }
        if let Some(index) = frequencies.iter().position(|f| !f.is_finite()) {
            return Err(Error::NonFiniteFrequency { index });
        }
        Ok(Self { frequencies })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn into_frequencies(self) -> Vec<f64> {
        self.frequencies
    }
}
