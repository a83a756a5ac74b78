//! The `Waveform` type and WAV file IO.
//!
//! A waveform is mono 32-bit float PCM tagged with its sample rate. Stages
//! never edit a waveform they received; each stage produces a fresh buffer.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::error::{DubError, Result};

/// Mono PCM audio, samples in `[-1.0, 1.0]` after any normalization step.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// A single near-zero sample; downstream encoders never receive an
    /// empty file.
    pub fn near_silent(sample_rate: u32) -> Self {
        Self::new(vec![0.0], sample_rate)
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Peak absolute amplitude.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Scales the whole buffer down so the peak becomes exactly `ceiling`,
    /// but only if the current peak exceeds it. Quieter audio is left alone.
    pub fn limit_peak(&mut self, ceiling: f32) {
        let peak = self.peak();
        if peak > ceiling {
            let gain = ceiling / peak;
            for sample in &mut self.samples {
                *sample *= gain;
            }
        }
    }

    /// Reads a WAV file into a mono waveform. Multi-channel files keep the
    /// first channel only.
    pub fn read_wav(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            (SampleFormat::Int, bits) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Float, bits) => {
                return Err(DubError::AudioProcessing(format!(
                    "unsupported float WAV bit depth: {bits}"
                )))
            }
        };

        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved.iter().step_by(channels).copied().collect()
        };

        debug!(
            "read {}: {} samples @ {} Hz",
            path.display(),
            samples.len(),
            spec.sample_rate
        );
        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Writes the waveform as mono 16-bit PCM.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        debug!(
            "wrote {}: {} samples @ {} Hz",
            path.display(),
            self.samples.len(),
            self.sample_rate
        );
        Ok(())
    }
}

/// Duration of a WAV file in seconds, without decoding the samples.
pub fn wav_duration_seconds(path: &Path) -> Result<f32> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(reader.duration() as f32 / spec.sample_rate as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wav_round_trip_preserves_length_and_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..2205)
            .map(|i| (i as f32 / 2205.0 * std::f32::consts::TAU * 5.0).sin() * 0.5)
            .collect();
        let wave = Waveform::new(samples, 22_050);
        wave.write_wav(&path).unwrap();

        let back = Waveform::read_wav(&path).unwrap();
        assert_eq!(back.sample_rate, 22_050);
        assert_eq!(back.samples.len(), 2205);
        // 16-bit quantization: values close, not exact.
        assert!((back.samples[100] - wave.samples[100]).abs() < 1e-3);
        assert!((wav_duration_seconds(&path).unwrap() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn limit_peak_only_scales_loud_audio() {
        let mut loud = Waveform::new(vec![0.5, -1.5, 0.2], 22_050);
        loud.limit_peak(0.99);
        assert!((loud.peak() - 0.99).abs() < 1e-6);

        let mut quiet = Waveform::new(vec![0.1, -0.2], 22_050);
        quiet.limit_peak(0.99);
        assert_eq!(quiet.samples, vec![0.1, -0.2]);
    }

    #[test]
    fn near_silent_is_never_empty() {
        assert_eq!(Waveform::near_silent(16_000).samples.len(), 1);
    }
}
