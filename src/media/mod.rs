//! The audio-coding collaborator boundary.
//!
//! Decode, resample, tempo-shift and lossy encode are delegated to an
//! external binary. [`MediaCoder`] pins down the call contract; the ffmpeg
//! implementation lives in [`ffmpeg`]. Tests substitute a pure-Rust fake.

pub mod ffmpeg;

use std::fs;
use std::path::Path;

use crate::error::Result;

pub use ffmpeg::FfmpegTool;

/// Media containers/extensions accepted as pipeline input.
const KNOWN_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "aac", "flac", "ogg", "mp4", "mov"];

/// Returns the lowercase extension when the file looks like supported media.
pub fn sniff_media_type(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if KNOWN_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Call contract of the external audio-coding binary.
///
/// Implementations operate on files: every method reads `src` and writes
/// `dst`, leaving `src` untouched.
pub trait MediaCoder: Send + Sync {
    /// Decodes any supported media into mono 16-bit WAV at `sample_rate`.
    fn to_mono_wav(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()>;

    /// Applies one constant-pitch tempo shift. `factor` must lie in
    /// `[0.5, 2.0]`; > 1 speeds up (shortens), < 1 slows down.
    fn stretch_tempo(&self, src: &Path, dst: &Path, factor: f64) -> Result<()>;

    /// Resamples to `sample_rate`, mono, fixed bit depth.
    fn resample(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()>;

    /// Encodes a waveform file into MP3 at the configured bitrate.
    fn encode_mp3(&self, src: &Path, dst: &Path, bitrate: &str) -> Result<()>;

    /// Cuts `[start_sec, start_sec + duration_sec)` out of `src`.
    fn trim(&self, src: &Path, dst: &Path, start_sec: f32, duration_sec: f32) -> Result<()>;

    /// Adjusts playback speed and/or pitch (in semitones) while keeping the
    /// other property fixed.
    fn apply_speed_pitch(&self, src: &Path, dst: &Path, speed: f64, semitones: i32) -> Result<()>;

    /// Native sample rate of the first audio stream.
    fn probe_sample_rate(&self, src: &Path) -> Result<u32>;

    /// Applies a whole stretch chain (see
    /// [`compute_stretch_chain`](crate::audio::tempo::compute_stretch_chain)).
    ///
    /// The default chains single calls through a scoped temp directory; an
    /// implementation may override this with one combined invocation. An
    /// empty chain degenerates to a plain copy.
    fn apply_stretch_chain(&self, src: &Path, dst: &Path, chain: &[f64]) -> Result<()> {
        if chain.is_empty() {
            fs::copy(src, dst)?;
            return Ok(());
        }
        let scratch = tempfile::tempdir()?;
        let mut current = src.to_path_buf();
        for (i, &factor) in chain.iter().enumerate() {
            let next = if i == chain.len() - 1 {
                dst.to_path_buf()
            } else {
                scratch.path().join(format!("step_{i:02}.wav"))
            };
            self.stretch_tempo(&current, &next, factor)?;
            current = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn sniffs_known_media_extensions() {
        assert_eq!(sniff_media_type(&PathBuf::from("a/voice.WAV")).as_deref(), Some("wav"));
        assert_eq!(sniff_media_type(&PathBuf::from("clip.mp4")).as_deref(), Some("mp4"));
        assert_eq!(sniff_media_type(&PathBuf::from("notes.txt")), None);
        assert_eq!(sniff_media_type(&PathBuf::from("noext")), None);
    }
}
