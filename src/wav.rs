// src/wav.rs
//
// WAV ingestion. Recordings arrive as PCM or float WAV; decode, normalize,
// and mix down to the mono f64 signal the pipeline works on.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::info;

use crate::error::Result;
use crate::signal::Signal;

/// Read a WAV file into a mono signal.
///
/// Integer PCM is scaled to [-1, 1] by bit depth; float samples pass
/// through. Multi-channel audio is averaged down to one channel.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Signal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = mix_to_mono(&samples, spec.channels as usize);
    info!(
        "read wav: {} Hz, {} channel(s), {} frames",
        spec.sample_rate,
        spec.channels,
        mono.len()
    );

    Signal::new(mono, spec.sample_rate)
}

/// Average interleaved channels into one.
fn mix_to_mono(samples: &[f64], channels: usize) -> Vec<f64> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}
