//! Segment-synchronized synthesis: the bridge between the text segmenter,
//! the synthesis engine and the stitcher.
//!
//! Each speakable unit is synthesized independently (with the engine's own
//! splitting disabled) and the units are joined with a short fixed pause.

use std::path::Path;

use log::{debug, info};

use crate::audio::stitcher::stitch_with_fixed_pause;
use crate::audio::waveform::Waveform;
use crate::engines::{SpeechSynthesizer, SynthesisOptions};
use crate::error::{DubError, Result};
use crate::text::segment;

/// Wraps the external single-shot synthesis call with segmentation and
/// stitching.
pub struct SynthesisAdapter<'a> {
    engine: &'a dyn SpeechSynthesizer,
}

impl<'a> SynthesisAdapter<'a> {
    pub fn new(engine: &'a dyn SpeechSynthesizer) -> Self {
        Self { engine }
    }

    /// Synthesizes `text` in the cloned voice, one segment at a time, and
    /// stitches the results with `pause_ms` of silence between segments.
    ///
    /// Blank input yields a near-silent one-sample waveform. Per-segment
    /// files live in a scoped temp directory removed on every exit path.
    pub async fn synthesize_segmented(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        pause_ms: u32,
    ) -> Result<Waveform> {
        let segments = segment(text);
        if segments.is_empty() {
            return Ok(Waveform::near_silent(self.engine.output_sample_rate()));
        }
        debug!("synthesizing {} segments: {segments:?}", segments.len());

        let scratch = tempfile::tempdir()?;
        let options = SynthesisOptions::default();

        let mut waves: Vec<Waveform> = Vec::with_capacity(segments.len());
        let mut rate_seen: Option<u32> = None;

        for (i, seg_text) in segments.iter().enumerate() {
            let seg_file = scratch.path().join(format!("seg_{i:03}.wav"));
            self.engine
                .synthesize_to_file(seg_text, reference_voice, language, &options, &seg_file)
                .await?;

            let wave = Waveform::read_wav(&seg_file)?;
            if wave.is_empty() {
                return Err(DubError::Synthesis(format!(
                    "engine returned empty audio for segment {i}: {seg_text:?}"
                )));
            }
            match rate_seen {
                None => rate_seen = Some(wave.sample_rate),
                Some(expected) if expected != wave.sample_rate => {
                    return Err(DubError::SampleRateMismatch {
                        expected,
                        got: wave.sample_rate,
                    });
                }
                Some(_) => {}
            }
            waves.push(wave);
        }

        let sample_rate = rate_seen.unwrap_or_else(|| self.engine.output_sample_rate());
        let joined = stitch_with_fixed_pause(&waves, pause_ms, sample_rate)?;
        info!(
            "joined {} segments: {:.2}s @ {} Hz",
            waves.len(),
            joined.duration_seconds(),
            sample_rate
        );
        Ok(joined)
    }
}
