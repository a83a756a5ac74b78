//! Waveform measurements used to validate base voice samples.

use serde::{Deserialize, Serialize};

use crate::audio::waveform::Waveform;

/// Measurements over a decoded mono waveform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStats {
    pub duration_sec: f32,
    pub rms: f32,
    pub peak: f32,
    /// Fraction of samples with |s| > 0.999 (saturation indicator).
    pub clip_ratio: f32,
    /// Fraction of 20 ms frames whose RMS falls below 0.001.
    pub silence_ratio: f32,
    /// Rough loudness estimate, not a full ITU-R BS.1770 measurement.
    pub lufs_est: f32,
    pub sample_rate: u32,
}

/// Root mean square of a sample buffer.
pub fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Computes duration, RMS, peak, clip ratio, silence ratio and estimated
/// loudness for a waveform.
pub fn measure_stats(wave: &Waveform) -> AudioStats {
    let samples = &wave.samples;
    let rms = compute_rms(samples);
    let peak = wave.peak();

    let clip_ratio = if samples.is_empty() {
        0.0
    } else {
        samples.iter().filter(|s| s.abs() > 0.999).count() as f32 / samples.len() as f32
    };

    let frame_len = ((0.02 * wave.sample_rate as f32) as usize).max(1);
    let silence_ratio = if samples.len() >= frame_len {
        let frames: Vec<f32> = samples.chunks(frame_len).map(compute_rms).collect();
        frames.iter().filter(|&&r| r < 0.001).count() as f32 / frames.len() as f32
    } else {
        1.0
    };

    let lufs_est = -0.691 + 10.0 * (rms * rms + 1e-12).log10();

    AudioStats {
        duration_sec: wave.duration_seconds(),
        rms,
        peak,
        clip_ratio,
        silence_ratio,
        lufs_est,
        sample_rate: wave.sample_rate,
    }
}
