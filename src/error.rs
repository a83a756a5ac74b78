use thiserror::Error;

/// Errors produced by the dubbing pipelines and their collaborators.
#[derive(Debug, Error)]
pub enum DubError {
    /// The input media has an extension/container we do not accept.
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// An external binary (ffmpeg/ffprobe) exited non-zero or could not be
    /// launched. `detail` carries the tool's diagnostic output.
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    /// The synthesis engine raised, was unreachable, or returned empty audio.
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Transcription produced zero usable spans.
    #[error("No speech detected in the source audio")]
    NoSpeechDetected,

    /// Segment outputs disagreed on sample rate where uniformity was assumed.
    #[error("Sample rate mismatch: expected {expected} Hz, got {got} Hz")]
    SampleRateMismatch { expected: u32, got: u32 },

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DubError {
    pub(crate) fn tool(tool: &str, detail: impl Into<String>) -> Self {
        DubError::ExternalTool {
            tool: tool.to_string(),
            detail: detail.into(),
        }
    }
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, DubError>;
