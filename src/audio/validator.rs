//! Base voice sample validation.

use serde::{Deserialize, Serialize};

use crate::audio::stats::{measure_stats, AudioStats};
use crate::audio::waveform::Waveform;
use crate::config::DubConfig;

/// Individual checks derived from [`AudioStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationChecks {
    pub duration_ok: bool,
    pub silence_ok: bool,
    pub clipping_ok: bool,
    pub peak_ok: bool,
}

/// Validation verdict for a base voice sample. Derived purely from the
/// measured stats; carries human-readable recording tips on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub stats: AudioStats,
    pub checks: ValidationChecks,
    pub tips: Vec<String>,
}

/// Validates a standardized voice sample against the configured limits.
pub fn validate_voice_sample(clean: &Waveform, config: &DubConfig) -> ValidationReport {
    let stats = measure_stats(clean);

    let checks = ValidationChecks {
        duration_ok: stats.duration_sec >= config.min_voice_seconds
            && stats.duration_sec <= config.max_voice_seconds,
        silence_ok: stats.silence_ratio <= config.max_silence_ratio,
        clipping_ok: stats.clip_ratio <= config.max_clip_ratio,
        peak_ok: stats.peak <= 0.999,
    };

    let mut tips = Vec::new();
    if !checks.duration_ok {
        tips.push(format!(
            "Duration must be between {:.0}s and {:.0}s.",
            config.min_voice_seconds, config.max_voice_seconds
        ));
    }
    if !checks.silence_ok {
        tips.push(
            "Too much silence; record in a quieter room and speak continuously.".to_string(),
        );
    }
    if !checks.clipping_ok || !checks.peak_ok {
        tips.push(
            "Peaks are too hot (clipping); lower the input gain or move away from the mic."
                .to_string(),
        );
    }

    let passed =
        checks.duration_ok && checks.silence_ok && checks.clipping_ok && checks.peak_ok;

    ValidationReport { passed, stats, checks, tips }
}
