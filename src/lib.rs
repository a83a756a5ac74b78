//! # dubsync
//!
//! Segment-synchronized voice dubbing. Given a base voice sample, the crate
//! synthesizes speech from text (or from a transcribed recording) in the
//! cloned voice, optionally matching the timing of the original recording.
//!
//! Two pipelines are exposed through [`DubbingOrchestrator`]:
//!
//! - **Free-form TTS**: segment the text at sentence boundaries, synthesize
//!   each segment, stitch with short fixed pauses, optionally post-process
//!   speed/pitch and export MP3.
//! - **Timing-matched speech-to-speech**: transcribe the source with
//!   timestamps, re-speak every span in the target voice, time-stretch each
//!   span to fit its original interval, and reproduce the source's own
//!   inter-span silences.
//!
//! The neural engines (synthesis, transcription) and the audio-coding
//! binary are opaque collaborators behind the [`engines`] traits and the
//! [`media::MediaCoder`] trait; ffmpeg-backed and HTTP-backed
//! implementations are provided.

pub mod audio;
pub mod config;
pub mod engines;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod progress;
pub mod synth;
pub mod text;
pub mod voice;

use std::path::Path;
use std::sync::Arc;

pub use config::DubConfig;
pub use engines::{EngineSet, TimedSpan, Transcription};
pub use error::{DubError, Result};
pub use media::{FfmpegTool, MediaCoder};
pub use pipeline::{
    DubbingOrchestrator, JobDir, S2sOptions, S2sOutput, TtsOptions, TtsOutput,
};
pub use progress::ProgressUpdate;
pub use voice::{VoiceLibrary, VoiceSample};

/// Initializes logging for embedding binaries. Honors `RUST_LOG`, defaults
/// to `info`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
}

/// Builds an [`EngineSet`] backed by the bundled HTTP clients.
pub fn http_engines(
    xtts: engines::xtts_api::XttsApiConfig,
    whisper: engines::whisper_api::WhisperApiConfig,
) -> EngineSet {
    EngineSet::new(
        Arc::new(engines::XttsApiSynthesizer::new(xtts)),
        Arc::new(engines::WhisperApiTranscriber::new(whisper)),
    )
}

/// Convenience wrapper bundling the orchestrator with the default ffmpeg
/// coder.
pub struct Dubber {
    orchestrator: DubbingOrchestrator,
}

impl Dubber {
    pub fn new(engines: Arc<EngineSet>, coder: Arc<dyn MediaCoder>, config: DubConfig) -> Self {
        Self {
            orchestrator: DubbingOrchestrator::new(engines, coder, config),
        }
    }

    /// Locates ffmpeg on the PATH and wires in the HTTP engine clients.
    pub fn with_default_stack(config: DubConfig) -> Result<Self> {
        config.validate()?;
        let coder: Arc<dyn MediaCoder> = Arc::new(FfmpegTool::locate()?);
        let engines = Arc::new(http_engines(
            engines::xtts_api::XttsApiConfig::default(),
            engines::whisper_api::WhisperApiConfig::default(),
        ));
        Ok(Self::new(engines, coder, config))
    }

    pub fn with_progress(mut self, sender: tokio::sync::mpsc::Sender<ProgressUpdate>) -> Self {
        self.orchestrator = self.orchestrator.with_progress(sender);
        self
    }

    /// See [`DubbingOrchestrator::synthesize_text`].
    pub async fn dub_text(
        &self,
        text: &str,
        voice: &VoiceSample,
        options: &TtsOptions,
        job: &JobDir,
    ) -> Result<TtsOutput> {
        self.orchestrator.synthesize_text(text, voice, options, job).await
    }

    /// See [`DubbingOrchestrator::dub_speech`].
    pub async fn dub_audio(
        &self,
        source: &Path,
        voice: &VoiceSample,
        options: &S2sOptions,
        job: &JobDir,
    ) -> Result<S2sOutput> {
        self.orchestrator.dub_speech(source, voice, options, job).await
    }

    /// See [`DubbingOrchestrator::transcribe_source`].
    pub async fn transcribe(
        &self,
        source: &Path,
        language: Option<&str>,
        job: &JobDir,
    ) -> Result<Transcription> {
        self.orchestrator.transcribe_source(source, language, job).await
    }
}
