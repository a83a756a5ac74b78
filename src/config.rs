//! Crate configuration and the audio constants shared by the pipelines.

use serde::{Deserialize, Serialize};

use crate::error::{DubError, Result};

/// Sample rate expected by the transcription engine (mono 16 kHz).
pub const SAMPLE_RATE_ASR: u32 = 16_000;

/// Native sample rate of the synthesis engine (XTTS works at 22.05 kHz).
pub const SAMPLE_RATE_TTS: u32 = 22_050;

/// Peak ceiling applied after concatenation; headroom against clipping on
/// lossy encode.
pub const PEAK_CEILING: f32 = 0.99;

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubConfig {
    /// Default language code passed to the engines.
    pub language: String,
    /// Pause inserted between synthesized segments (general synthesis).
    pub pause_ms: u32,
    /// Pause used by the user-facing dubbing flows.
    pub dub_pause_ms: u32,
    /// Bitrate for the optional MP3 export.
    pub mp3_bitrate: String,
    /// Minimum accepted duration for a base voice sample, in seconds.
    pub min_voice_seconds: f32,
    /// Maximum accepted duration for a base voice sample, in seconds.
    pub max_voice_seconds: f32,
    /// Maximum fraction of near-silent frames in a base voice sample.
    pub max_silence_ratio: f32,
    /// Maximum fraction of clipped samples in a base voice sample.
    pub max_clip_ratio: f32,
}

impl DubConfig {
    /// Checks the configured limits for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(DubError::Configuration("language must not be empty".into()));
        }
        if self.mp3_bitrate.trim().is_empty() {
            return Err(DubError::Configuration("mp3_bitrate must not be empty".into()));
        }
        if self.min_voice_seconds <= 0.0 || self.max_voice_seconds <= self.min_voice_seconds {
            return Err(DubError::Configuration(format!(
                "voice duration limits invalid: [{}, {}]",
                self.min_voice_seconds, self.max_voice_seconds
            )));
        }
        if !(0.0..=1.0).contains(&self.max_silence_ratio)
            || !(0.0..=1.0).contains(&self.max_clip_ratio)
        {
            return Err(DubError::Configuration(
                "silence/clip ratio limits must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DubConfig {
    fn default() -> Self {
        Self {
            language: "pt".to_string(),
            pause_ms: 120,
            dub_pause_ms: 180,
            mp3_bitrate: "192k".to_string(),
            min_voice_seconds: 3.0,
            max_voice_seconds: 180.0,
            max_silence_ratio: 0.6,
            max_clip_ratio: 0.001,
        }
    }
}
