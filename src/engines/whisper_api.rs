//! HTTP client for a Whisper-compatible transcription endpoint.
//!
//! Requests `verbose_json` with segment-level timestamps and maps the
//! response into [`TimedSpan`]s, dropping spans with no text or a
//! non-positive duration.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;

use crate::engines::{TimedSpan, Transcriber, Transcription};
use crate::error::{DubError, Result};

static API_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .expect("Failed to create HTTP client")
});

/// Connection settings for the transcription server.
#[derive(Debug, Clone)]
pub struct WhisperApiConfig {
    /// Base URL, e.g. `http://127.0.0.1:9000`.
    pub endpoint: String,
    /// Model identifier the server expects.
    pub model: String,
}

impl Default for WhisperApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            model: "whisper-1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f32,
    end: f32,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: f32,
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

/// Transcription engine reached over a Whisper-compatible HTTP API.
pub struct WhisperApiTranscriber {
    config: WhisperApiConfig,
}

impl WhisperApiTranscriber {
    pub fn new(config: WhisperApiConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
        vad_filter: bool,
    ) -> Result<Transcription> {
        let audio_bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file_part = multipart::Part::bytes(audio_bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| DubError::Transcription(format!("invalid audio part: {e}")))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("vad_filter", if vad_filter { "true" } else { "false" });
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        );
        debug!("POST {url} (vad={vad_filter})");
        let response = API_CLIENT.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DubError::Transcription(format!(
                "server returned {status}: {}",
                body.trim()
            )));
        }

        let verbose: VerboseTranscription = response.json().await?;

        let spans: Vec<TimedSpan> = verbose
            .segments
            .into_iter()
            .map(|s| TimedSpan {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .filter(TimedSpan::is_usable)
            .collect();

        let full_text = if verbose.text.trim().is_empty() {
            spans.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ")
        } else {
            verbose.text.trim().to_string()
        };

        info!(
            "transcribed {}: {} usable spans, {:.2}s",
            audio.display(),
            spans.len(),
            verbose.duration
        );
        Ok(Transcription {
            language: verbose.language,
            duration: verbose.duration,
            spans,
            full_text,
        })
    }
}
