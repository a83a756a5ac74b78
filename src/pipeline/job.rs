//! Job directories: one per pipeline run, holding intermediates and final
//! artifacts. The directory identity is opaque to the pipelines; the
//! transcribe-then-generate flow reuses one job across both steps.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;

/// Output directory for one pipeline run.
#[derive(Debug, Clone)]
pub struct JobDir {
    dir: PathBuf,
}

impl JobDir {
    /// Creates a fresh timestamped job directory under `root`.
    pub fn create(root: &Path, prefix: &str) -> Result<Self> {
        let ts = Local::now().format("%Y%m%d-%H%M%S");
        let dir = root.join(format!("{prefix}-{ts}"));
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Wraps a caller-assigned directory, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Standardized mono 16 kHz copy of the source, the transcription input.
    pub fn standardized_source(&self) -> PathBuf {
        self.file("source_16k.wav")
    }

    pub fn output_wav(&self) -> PathBuf {
        self.file("output.wav")
    }

    pub fn output_mp3(&self) -> PathBuf {
        self.file("output.mp3")
    }

    pub fn transcript_txt(&self) -> PathBuf {
        self.file("transcript.txt")
    }
}
