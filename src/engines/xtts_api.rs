//! HTTP client for an XTTS-style voice-cloning synthesis server.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::multipart;
use reqwest::Client;

use crate::config::SAMPLE_RATE_TTS;
use crate::engines::{SpeechSynthesizer, SynthesisOptions};
use crate::error::{DubError, Result};

// Synthesis of a long segment on CPU can take minutes.
static API_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .expect("Failed to create HTTP client")
});

/// Connection settings for the synthesis server.
#[derive(Debug, Clone)]
pub struct XttsApiConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8020`.
    pub endpoint: String,
    /// Sample rate of the WAV the server returns.
    pub sample_rate: u32,
}

impl Default for XttsApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8020".to_string(),
            sample_rate: SAMPLE_RATE_TTS,
        }
    }
}

/// Synthesis engine reached over a local HTTP API.
pub struct XttsApiSynthesizer {
    config: XttsApiConfig,
}

impl XttsApiSynthesizer {
    pub fn new(config: XttsApiConfig) -> Self {
        Self { config }
    }

    fn build_form(
        text: &str,
        language: &str,
        reference_name: &str,
        reference_bytes: Vec<u8>,
        disable_splitting: bool,
    ) -> Result<multipart::Form> {
        let file_part = multipart::Part::bytes(reference_bytes)
            .file_name(reference_name.to_string())
            .mime_str("audio/wav")
            .map_err(|e| DubError::Synthesis(format!("invalid reference part: {e}")))?;

        let mut form = multipart::Form::new()
            .part("speaker_wav", file_part)
            .text("text", text.to_string())
            .text("language", language.to_string());

        if disable_splitting {
            form = form
                .text("split_sentences", "false")
                .text("enable_text_splitting", "false");
        }
        Ok(form)
    }

    async fn request_audio(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        disable_splitting: bool,
    ) -> Result<reqwest::Response> {
        let reference_bytes = tokio::fs::read(reference_voice).await?;
        let reference_name = reference_voice
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "reference.wav".to_string());

        let form =
            Self::build_form(text, language, &reference_name, reference_bytes, disable_splitting)?;
        let url = format!("{}/tts_to_audio/", self.config.endpoint.trim_end_matches('/'));
        debug!("POST {url} ({} chars, lang={language})", text.len());
        Ok(API_CLIENT.post(&url).multipart(form).send().await?)
    }
}

#[async_trait]
impl SpeechSynthesizer for XttsApiSynthesizer {
    fn output_sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    async fn synthesize_to_file(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        options: &SynthesisOptions,
        out_path: &Path,
    ) -> Result<()> {
        // Trailing space helps the engine find end-of-speech.
        let safe_text = format!("{} ", text.trim());

        let mut response = self
            .request_audio(&safe_text, reference_voice, language, options.disable_internal_splitting)
            .await?;

        // Older servers reject the splitting-control fields outright; retry
        // the same request without them.
        if options.disable_internal_splitting
            && (response.status() == reqwest::StatusCode::BAD_REQUEST
                || response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY)
        {
            warn!(
                "synthesis server rejected splitting options (status {}); retrying without",
                response.status()
            );
            response = self
                .request_audio(&safe_text, reference_voice, language, false)
                .await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DubError::Synthesis(format!(
                "server returned {status}: {}",
                body.trim()
            )));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(DubError::Synthesis("server returned empty audio".to_string()));
        }

        tokio::fs::write(out_path, &audio).await?;
        info!("synthesized {} bytes -> {}", audio.len(), out_path.display());
        Ok(())
    }
}
