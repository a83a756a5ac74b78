//! ffmpeg-backed implementation of the [`MediaCoder`] contract.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};

use crate::audio::tempo::compute_stretch_chain;
use crate::error::{DubError, Result};
use crate::media::MediaCoder;

/// Thin wrapper around the ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTool {
    /// Locates ffmpeg and ffprobe on the PATH.
    pub fn locate() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| {
            DubError::tool(
                "ffmpeg",
                "binary not found on PATH; install ffmpeg and retry",
            )
        })?;
        let ffprobe = which::which("ffprobe").map_err(|_| {
            DubError::tool(
                "ffprobe",
                "binary not found on PATH; install ffmpeg and retry",
            )
        })?;
        debug!("ffmpeg at {}, ffprobe at {}", ffmpeg.display(), ffprobe.display());
        Ok(Self { ffmpeg, ffprobe })
    }

    /// Builds a tool from explicit binary paths (useful for tests and
    /// non-standard installs).
    pub fn with_binaries(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }

    /// Runs `ffmpeg -y <args>`; on a non-zero exit the stderr output goes
    /// into the error.
    fn run(&self, args: &[&str]) -> Result<()> {
        debug!("ffmpeg -y {}", args.join(" "));
        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .args(args)
            .output()
            .map_err(|e| DubError::tool("ffmpeg", format!("failed to launch: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::tool("ffmpeg", stderr.trim().to_string()));
        }
        Ok(())
    }

    fn atempo_filter(chain: &[f64]) -> String {
        chain
            .iter()
            .map(|f| format!("atempo={f:.8}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl MediaCoder for FfmpegTool {
    fn to_mono_wav(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            &src.to_string_lossy(),
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "-sample_fmt",
            "s16",
            &dst.to_string_lossy(),
        ])
    }

    fn stretch_tempo(&self, src: &Path, dst: &Path, factor: f64) -> Result<()> {
        if !(0.5..=2.0).contains(&factor) {
            return Err(DubError::AudioProcessing(format!(
                "atempo factor {factor} outside [0.5, 2.0]"
            )));
        }
        self.run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            &src.to_string_lossy(),
            "-filter:a",
            &format!("atempo={factor:.8}"),
            &dst.to_string_lossy(),
        ])
    }

    /// One invocation with the whole chain as a single filter graph instead
    /// of a file per step.
    fn apply_stretch_chain(&self, src: &Path, dst: &Path, chain: &[f64]) -> Result<()> {
        if chain.is_empty() {
            std::fs::copy(src, dst)?;
            return Ok(());
        }
        self.run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            &src.to_string_lossy(),
            "-filter:a",
            &Self::atempo_filter(chain),
            &dst.to_string_lossy(),
        ])
    }

    fn resample(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()> {
        self.to_mono_wav(src, dst, sample_rate)
    }

    fn encode_mp3(&self, src: &Path, dst: &Path, bitrate: &str) -> Result<()> {
        info!("encoding {} -> {} @ {}", src.display(), dst.display(), bitrate);
        self.run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            &src.to_string_lossy(),
            "-vn",
            "-c:a",
            "libmp3lame",
            "-b:a",
            bitrate,
            &dst.to_string_lossy(),
        ])
    }

    fn trim(&self, src: &Path, dst: &Path, start_sec: f32, duration_sec: f32) -> Result<()> {
        // Fast path: lossless stream copy.
        let fast = self.run(&[
            "-ss",
            &start_sec.to_string(),
            "-t",
            &duration_sec.to_string(),
            "-i",
            &src.to_string_lossy(),
            "-c",
            "copy",
            &dst.to_string_lossy(),
        ]);
        if let Err(err) = fast {
            warn!("lossless trim failed ({err}); falling back to re-encode");
            return self.run(&[
                "-ss",
                &start_sec.to_string(),
                "-t",
                &duration_sec.to_string(),
                "-i",
                &src.to_string_lossy(),
                "-ac",
                "1",
                "-ar",
                "16000",
                "-sample_fmt",
                "s16",
                &dst.to_string_lossy(),
            ]);
        }
        Ok(())
    }

    fn apply_speed_pitch(&self, src: &Path, dst: &Path, speed: f64, semitones: i32) -> Result<()> {
        let rate = self.probe_sample_rate(src)?;
        let rate_s = rate.to_string();

        // Nothing to do: just re-standardize to mono s16.
        if (speed - 1.0).abs() < 1e-6 && semitones == 0 {
            return self.to_mono_wav(src, dst, rate);
        }

        let mut filters: Vec<String> = Vec::new();

        // Pitch shift preserving duration: raise the effective sample rate
        // by the semitone ratio, resample back, then undo the duration
        // change with the inverse atempo chain.
        if semitones != 0 {
            let pf = 2f64.powf(semitones as f64 / 12.0);
            filters.push(format!("asetrate={rate}*{pf:.8}"));
            filters.push(format!("aresample={rate}"));
            for f in compute_stretch_chain(1.0 / pf) {
                filters.push(format!("atempo={f:.8}"));
            }
        }

        if (speed - 1.0).abs() >= 1e-6 && speed > 0.0 {
            for f in compute_stretch_chain(speed) {
                filters.push(format!("atempo={f:.8}"));
            }
        }

        let filter_arg = if filters.is_empty() {
            "anull".to_string()
        } else {
            filters.join(",")
        };

        self.run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            &src.to_string_lossy(),
            "-filter:a",
            &filter_arg,
            "-ac",
            "1",
            "-ar",
            &rate_s,
            "-sample_fmt",
            "s16",
            &dst.to_string_lossy(),
        ])
    }

    fn probe_sample_rate(&self, src: &Path) -> Result<u32> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=sample_rate",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(src)
            .output()
            .map_err(|e| DubError::tool("ffprobe", format!("failed to launch: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::tool("ffprobe", stderr.trim().to_string()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<u32>()
            .map_err(|_| DubError::tool("ffprobe", format!("unexpected output: {stdout:?}")))
    }
}
