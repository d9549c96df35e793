//! EnfTrace - Electric Network Frequency forensics
//!
//! Extracts the mains-hum frequency trace buried in an audio recording and
//! matches it against reference grid-frequency data to estimate when the
//! recording was made.
//!
//! ## Features
//!
//! - **Fourier-domain resampling**: Downsample to an analysis rate with an
//!   exact spectrum-truncation resampler, plus FIR decimation variants
//! - **Narrowband isolation**: Butterworth bandpass designed as cascaded
//!   second-order sections around the grid nominal or one of its harmonics
//! - **Per-second trace**: Hann-windowed STFT with one-second hops, peak
//!   picking with median smoothing or quadratic sub-bin interpolation
//! - **Three matchers**: Pearson correlation, raw Euclidean distance, and a
//!   matrix-profile search over z-normalized windows
//! - **Pluggable reference data**: Grid measurements arrive through a small
//!   provider trait; an in-memory provider ships for tests and offline work
//!
//! ## Module Structure
//!
//! - `dsp` - Resampling, filtering, and STFT primitives
//! - `extract` - Spectral peak tracking and the extraction pipeline
//! - `matching` - Query-against-reference similarity search
//! - `provider` - Reference grid-frequency data boundary
//! - `signal` - Sample and frequency-trace containers
//! - `wav` - WAV ingestion
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use enftrace::{enf_series, matching, read_wav, reference_series};
//!
//! // Trace the 50 Hz hum in a recording, one estimate per second.
//! let signal = read_wav("recording.wav")?;
//! let query = enf_series(&signal, 49.5, 50.5, Some(300))?;
//!
//! // Rank alignments against a day of reference data.
//! let reference = reference_series(&rows)?;
//! let ranked = matching::pmcc(&query, &reference);
//!
//! println!("best alignment starts at second {}", ranked[0].offset);
//! ```
//!
//! ## Matchers
//!
//! | Matcher     | Score               | Best   | Robust against          |
//! |-------------|---------------------|--------|-------------------------|
//! | `pmcc`      | Pearson correlation | High   | Level and scale offsets |
//! | `euclidean` | Euclidean distance  | Low    | Nothing (baseline)      |
//! | `stump`     | z-normalized dist.  | Low    | Level and scale offsets |
//!
//! All three score every alignment of the query against the reference;
//! rankings break ties toward earlier offsets.

// DSP primitives: resampling, filtering, STFT
pub mod dsp;

// Error taxonomy
pub mod error;

// Frequency extraction pipeline
pub mod extract;

// Similarity matchers
pub mod matching;

// Reference data boundary
pub mod provider;

// Container types
pub mod signal;

// WAV ingestion
pub mod wav;

// Re-export commonly used types at crate root for convenience
pub use dsp::filter::{butter_bandpass, butter_bandpass_filter, sosfilt, FilterSpec, Sos};
pub use dsp::resample::{almost_decimate, decimate_and_interpolate, resample};
pub use dsp::stft::{stft, SpectralGrid, StftParams};
pub use error::{Error, Result};
pub use extract::{
    enf_series, interpolate, median_filter, peak_frequencies, EnfExtractor, FrequencyEstimator,
};
pub use matching::{euclidean, pmcc, stump, stump_with, MatchCandidate, StumpConfig};
pub use provider::{reference_series, InMemoryProvider, ReferencePoint, ReferenceProvider};
pub use signal::{EnfSeries, Signal};
pub use wav::read_wav;
