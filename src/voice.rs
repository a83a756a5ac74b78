//! Base voice library: registration, standardization and validation of the
//! reference samples that condition synthesis.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::audio::validator::{validate_voice_sample, ValidationReport};
use crate::audio::waveform::Waveform;
use crate::config::{DubConfig, SAMPLE_RATE_TTS};
use crate::error::{DubError, Result};
use crate::media::{sniff_media_type, MediaCoder};

const VOICE_META_FILE: &str = "voice.json";

/// A registered base voice: the raw upload, its standardized clean waveform
/// and the cached validation report. Read-only after registration except
/// for re-validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSample {
    pub id: String,
    pub name: String,
    pub raw_path: PathBuf,
    pub clean_wav: PathBuf,
    pub validation: ValidationReport,
}

/// On-disk store of registered voices, one directory per voice.
pub struct VoiceLibrary {
    dir: PathBuf,
    config: DubConfig,
}

impl VoiceLibrary {
    pub fn new(dir: impl Into<PathBuf>, config: DubConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, config })
    }

    fn voice_dir(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    /// All voices with a readable metadata file; corrupt entries are skipped.
    pub fn list(&self) -> Result<Vec<VoiceSample>> {
        let mut voices = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let meta = entry.path().join(VOICE_META_FILE);
            if !meta.exists() {
                continue;
            }
            match fs::read_to_string(&meta)
                .map_err(DubError::from)
                .and_then(|s| serde_json::from_str::<VoiceSample>(&s).map_err(DubError::from))
            {
                Ok(voice) => voices.push(voice),
                Err(err) => warn!("skipping unreadable voice {}: {err}", meta.display()),
            }
        }
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(voices)
    }

    pub fn get(&self, id: &str) -> Result<Option<VoiceSample>> {
        let meta = self.voice_dir(id).join(VOICE_META_FILE);
        if !meta.exists() {
            return Ok(None);
        }
        let voice = serde_json::from_str(&fs::read_to_string(meta)?)?;
        Ok(Some(voice))
    }

    /// Registers a new base voice: copies the raw file, standardizes it to
    /// mono 22.05 kHz, validates it and persists the metadata.
    pub fn register_from_file(
        &self,
        coder: &dyn MediaCoder,
        src: &Path,
        display_name: Option<&str>,
    ) -> Result<VoiceSample> {
        if !src.exists() {
            return Err(DubError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                src.display().to_string(),
            )));
        }
        let ext = sniff_media_type(src)
            .ok_or_else(|| DubError::UnsupportedFormat(src.display().to_string()))?;

        let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let vdir = self.voice_dir(&id);
        fs::create_dir_all(&vdir)?;

        let raw_path = vdir.join(format!("raw.{ext}"));
        fs::copy(src, &raw_path)?;

        let clean_wav = vdir.join("clean.wav");
        coder.to_mono_wav(&raw_path, &clean_wav, SAMPLE_RATE_TTS)?;

        let clean = Waveform::read_wav(&clean_wav)?;
        let validation = validate_voice_sample(&clean, &self.config);

        let voice = VoiceSample {
            id: id.clone(),
            name: display_name.map(str::to_string).unwrap_or_else(|| format!("Voice {id}")),
            raw_path,
            clean_wav,
            validation,
        };
        self.save(&voice)?;
        info!(
            "registered voice {} ({}), passed={}",
            voice.id, voice.name, voice.validation.passed
        );
        Ok(voice)
    }

    /// Re-runs validation against the stored clean waveform and persists the
    /// refreshed report.
    pub fn revalidate(&self, id: &str) -> Result<Option<VoiceSample>> {
        let Some(mut voice) = self.get(id)? else {
            return Ok(None);
        };
        let clean = Waveform::read_wav(&voice.clean_wav)?;
        voice.validation = validate_voice_sample(&clean, &self.config);
        self.save(&voice)?;
        Ok(Some(voice))
    }

    fn save(&self, voice: &VoiceSample) -> Result<()> {
        let meta = self.voice_dir(&voice.id).join(VOICE_META_FILE);
        fs::write(meta, serde_json::to_string_pretty(voice)?)?;
        Ok(())
    }
}
