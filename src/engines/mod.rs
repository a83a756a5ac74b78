//! External neural engine boundaries: synthesis and transcription.
//!
//! The models themselves are opaque collaborators. Construction is expensive
//! (model/server warm-up), so a process typically builds one [`EngineSet`]
//! at startup and shares it; [`global_engines`] serializes the first
//! construction for the shared-process case.

pub mod whisper_api;
pub mod xtts_api;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use whisper_api::WhisperApiTranscriber;
pub use xtts_api::XttsApiSynthesizer;

/// Minimum target duration when fitting a span; guards against degenerate
/// timestamps.
pub const MIN_SPAN_TARGET_SECONDS: f32 = 0.06;

/// A source-audio time interval with its transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSpan {
    pub start: f32,
    pub end: f32,
    pub text: String,
}

impl TimedSpan {
    /// Duration the synthesized replacement must fit, floored at 60 ms.
    pub fn target_duration(&self) -> f32 {
        (self.end - self.start).max(MIN_SPAN_TARGET_SECONDS)
    }

    /// A span is usable when it has text and a positive duration.
    pub fn is_usable(&self) -> bool {
        self.end > self.start && !self.text.trim().is_empty()
    }
}

/// Transcription result with timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub language: Option<String>,
    pub duration: f32,
    pub spans: Vec<TimedSpan>,
    pub full_text: String,
}

/// Options forwarded to the synthesis engine.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Ask the engine to skip its own sentence splitting/normalization so
    /// segment boundaries stay under our control.
    pub disable_internal_splitting: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self { disable_internal_splitting: true }
    }
}

/// Single-shot text-to-waveform synthesis collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Native sample rate of the engine's output.
    fn output_sample_rate(&self) -> u32;

    /// Synthesizes `text` in the voice of `reference_voice` and writes a WAV
    /// file to `out_path`. Must fail (not write an empty file) when the
    /// engine returns no audio.
    async fn synthesize_to_file(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        options: &SynthesisOptions,
        out_path: &Path,
    ) -> Result<()>;
}

/// Timestamped transcription collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes `audio` (mono 16 kHz WAV), returning timestamped spans.
    /// `vad_filter` gates out spurious silence-triggered spans.
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
        vad_filter: bool,
    ) -> Result<Transcription>;
}

/// Handle bundling the engines a pipeline run needs.
#[derive(Clone)]
pub struct EngineSet {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl EngineSet {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self { synthesizer, transcriber }
    }
}

static GLOBAL_ENGINES: OnceCell<Arc<EngineSet>> = OnceCell::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

/// Returns the process-wide engine handle, constructing it on first call.
///
/// Construction is serialized: when several workers race here, exactly one
/// runs `init` and the rest reuse its result. Workers that own their process
/// can skip this and build an [`EngineSet`] directly at startup.
pub fn global_engines<F>(init: F) -> Result<Arc<EngineSet>>
where
    F: FnOnce() -> Result<EngineSet>,
{
    if let Some(engines) = GLOBAL_ENGINES.get() {
        return Ok(engines.clone());
    }
    let _guard = GLOBAL_INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(engines) = GLOBAL_ENGINES.get() {
        return Ok(engines.clone());
    }
    let engines = Arc::new(init()?);
    let _ = GLOBAL_ENGINES.set(engines.clone());
    Ok(engines)
}
