//! The top-level controller: free-form TTS dubbing and timing-matched
//! speech-to-speech dubbing.
//!
//! Both pipelines are all-or-nothing: a failure at any segment aborts the
//! run and no partial artifacts are presented as success. Segments are
//! processed strictly in sequence — each tempo decision and gap depends on
//! the previous segment's measured output and the next span's start time.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::mpsc::Sender;

use crate::audio::stitcher::stitch;
use crate::audio::tempo::{clamp_fit_factor, compute_stretch_chain, is_near_unity};
use crate::audio::waveform::Waveform;
use crate::config::DubConfig;
use crate::engines::{EngineSet, TimedSpan, Transcription};
use crate::error::{DubError, Result};
use crate::media::{sniff_media_type, MediaCoder};
use crate::pipeline::job::JobDir;
use crate::progress::{send_progress, ProgressUpdate};
use crate::synth::SynthesisAdapter;
use crate::voice::VoiceSample;

use std::path::{Path, PathBuf};

/// Options for the free-form TTS pipeline.
#[derive(Debug, Clone)]
pub struct TtsOptions {
    /// Cosmetic speed control, clamped to `[0.5, 1.5]`.
    pub speed: f64,
    /// Pitch shift in semitones, clamped to `[-12, 12]`.
    pub pitch_semitones: i32,
    pub export_mp3: bool,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self { speed: 1.0, pitch_semitones: 0, export_mp3: false }
    }
}

/// Artifacts of a free-form TTS run.
#[derive(Debug, Clone)]
pub struct TtsOutput {
    pub wav: PathBuf,
    pub mp3: Option<PathBuf>,
}

/// Options for the timing-matched speech-to-speech pipeline.
#[derive(Debug, Clone)]
pub struct S2sOptions {
    /// Keep the source's native sample rate; otherwise the synthesis
    /// engine's native rate is used.
    pub keep_source_rate: bool,
    pub normalize: bool,
    /// Language hint for transcription and synthesis; falls back to the
    /// configured default.
    pub language: Option<String>,
}

impl Default for S2sOptions {
    fn default() -> Self {
        Self { keep_source_rate: true, normalize: true, language: None }
    }
}

/// Artifacts of a speech-to-speech run.
#[derive(Debug, Clone)]
pub struct S2sOutput {
    pub wav: PathBuf,
    pub transcript: PathBuf,
    pub span_count: usize,
}

/// Drives the two dubbing pipelines against the engine handle and the
/// audio-coding collaborator.
pub struct DubbingOrchestrator {
    engines: Arc<EngineSet>,
    coder: Arc<dyn MediaCoder>,
    config: DubConfig,
    progress: Option<Sender<ProgressUpdate>>,
}

impl DubbingOrchestrator {
    pub fn new(engines: Arc<EngineSet>, coder: Arc<dyn MediaCoder>, config: DubConfig) -> Self {
        Self { engines, coder, config, progress: None }
    }

    /// Attaches a progress channel.
    pub fn with_progress(mut self, sender: Sender<ProgressUpdate>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn language<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.config.language)
    }

    /// Free-form TTS dubbing: segment → synthesize → stitch with fixed
    /// pauses → optional speed/pitch post → optional MP3 export.
    pub async fn synthesize_text(
        &self,
        text: &str,
        voice: &VoiceSample,
        options: &TtsOptions,
        job: &JobDir,
    ) -> Result<TtsOutput> {
        send_progress(&self.progress, ProgressUpdate::Started);
        info!("TTS job in {}", job.path().display());

        let language = self.language(None).to_string();
        let adapter = SynthesisAdapter::new(self.engines.synthesizer.as_ref());
        let wave = adapter
            .synthesize_segmented(text, &voice.clean_wav, &language, self.config.dub_pause_ms)
            .await?;

        // Cosmetic control: a narrower clamp than the S2S fitting range,
        // on purpose.
        let speed = options.speed.clamp(0.5, 1.5);
        let semitones = options.pitch_semitones.clamp(-12, 12);
        let needs_post = (speed - 1.0).abs() > 1e-6 || semitones != 0;

        let out_wav = job.output_wav();
        if needs_post {
            let raw_wav = job.file("tts_raw.wav");
            wave.write_wav(&raw_wav)?;
            self.coder.apply_speed_pitch(&raw_wav, &out_wav, speed, semitones)?;
        } else {
            wave.write_wav(&out_wav)?;
        }

        let mp3 = if options.export_mp3 {
            send_progress(&self.progress, ProgressUpdate::Encoding);
            let out_mp3 = job.output_mp3();
            self.coder.encode_mp3(&out_wav, &out_mp3, &self.config.mp3_bitrate)?;
            Some(out_mp3)
        } else {
            None
        };

        send_progress(&self.progress, ProgressUpdate::Finished);
        Ok(TtsOutput { wav: out_wav, mp3 })
    }

    /// Standardizes and transcribes a source recording, persisting the
    /// transcript into the job. The same job is reused when the caller
    /// follows up with [`synthesize_text`](Self::synthesize_text) on the
    /// (possibly edited) transcript.
    pub async fn transcribe_source(
        &self,
        source: &Path,
        language: Option<&str>,
        job: &JobDir,
    ) -> Result<Transcription> {
        sniff_media_type(source)
            .ok_or_else(|| DubError::UnsupportedFormat(source.display().to_string()))?;

        send_progress(&self.progress, ProgressUpdate::Transcribing);
        let standardized = job.standardized_source();
        self.coder.to_mono_wav(source, &standardized, crate::config::SAMPLE_RATE_ASR)?;

        let transcription = self
            .engines
            .transcriber
            .transcribe(&standardized, language, true)
            .await?;

        std::fs::write(job.transcript_txt(), &transcription.full_text)?;
        Ok(transcription)
    }

    /// Timing-matched speech-to-speech dubbing: every transcribed span is
    /// re-spoken in the target voice, stretched to fit its source interval,
    /// and the source's own inter-span silences are reproduced.
    ///
    /// Per-span stretching (rather than one global stretch) keeps each
    /// spoken span aligned with its position in the timeline even when the
    /// speaking rate varies across the recording.
    pub async fn dub_speech(
        &self,
        source: &Path,
        voice: &VoiceSample,
        options: &S2sOptions,
        job: &JobDir,
    ) -> Result<S2sOutput> {
        send_progress(&self.progress, ProgressUpdate::Started);
        info!("S2S job in {}", job.path().display());

        let transcription = self
            .transcribe_source(source, options.language.as_deref(), job)
            .await?;
        let spans: Vec<TimedSpan> = transcription
            .spans
            .into_iter()
            .filter(TimedSpan::is_usable)
            .collect();
        if spans.is_empty() {
            return Err(DubError::NoSpeechDetected);
        }
        info!("{} usable spans", spans.len());

        let out_rate = if options.keep_source_rate {
            self.coder.probe_sample_rate(source)?
        } else {
            self.engines.synthesizer.output_sample_rate()
        };

        let language = self.language(options.language.as_deref()).to_string();
        let adapter = SynthesisAdapter::new(self.engines.synthesizer.as_ref());
        let scratch = tempfile::tempdir()?;
        let total = spans.len();

        let mut fitted: Vec<Waveform> = Vec::with_capacity(total);
        for (i, span) in spans.iter().enumerate() {
            send_progress(
                &self.progress,
                ProgressUpdate::Synthesizing { current: i + 1, total },
            );

            let wave = adapter
                .synthesize_segmented(&span.text, &voice.clean_wav, &language, self.config.pause_ms)
                .await?;

            let mut segment = self.fit_span(wave, span, i, total, scratch.path())?;

            if segment.sample_rate != out_rate {
                segment = self.resample_segment(segment, out_rate, i, scratch.path())?;
            }
            if options.normalize {
                segment.limit_peak(crate::config::PEAK_CEILING);
            }
            fitted.push(segment);
        }

        // Gaps equal to the silences actually present in the source.
        let gaps: Vec<f32> = spans
            .windows(2)
            .map(|pair| (pair[1].start - pair[0].end).max(0.0))
            .collect();

        send_progress(&self.progress, ProgressUpdate::Merging);
        let out = stitch(&fitted, &gaps, out_rate)?;

        send_progress(&self.progress, ProgressUpdate::Encoding);
        let out_wav = job.output_wav();
        out.write_wav(&out_wav)?;

        send_progress(&self.progress, ProgressUpdate::Finished);
        info!("S2S done: {:.2}s -> {}", out.duration_seconds(), out_wav.display());
        Ok(S2sOutput {
            wav: out_wav,
            transcript: job.transcript_txt(),
            span_count: total,
        })
    }

    /// Stretches one synthesized span to its source interval. A factor
    /// within 3% of unity copies unchanged.
    fn fit_span(
        &self,
        wave: Waveform,
        span: &TimedSpan,
        index: usize,
        total: usize,
        scratch: &Path,
    ) -> Result<Waveform> {
        let synth_duration = wave.duration_seconds();
        let target = span.target_duration();
        let factor = clamp_fit_factor(synth_duration as f64 / target as f64);

        if is_near_unity(factor) {
            return Ok(wave);
        }

        send_progress(
            &self.progress,
            ProgressUpdate::Fitting { current: index + 1, total },
        );
        info!(
            "span {}: {:.2}s -> {:.2}s (factor {:.3})",
            index, synth_duration, target, factor
        );

        let raw = scratch.join(format!("span_raw_{index:03}.wav"));
        let fit = scratch.join(format!("span_fit_{index:03}.wav"));
        wave.write_wav(&raw)?;
        let chain = compute_stretch_chain(factor);
        self.coder.apply_stretch_chain(&raw, &fit, &chain)?;
        Waveform::read_wav(&fit)
    }

    fn resample_segment(
        &self,
        wave: Waveform,
        out_rate: u32,
        index: usize,
        scratch: &Path,
    ) -> Result<Waveform> {
        warn!(
            "span {}: resampling {} Hz -> {} Hz",
            index, wave.sample_rate, out_rate
        );
        let src = scratch.join(format!("span_sr_in_{index:03}.wav"));
        let dst = scratch.join(format!("span_sr_out_{index:03}.wav"));
        wave.write_wav(&src)?;
        self.coder.resample(&src, &dst, out_rate)?;
        Waveform::read_wav(&dst)
    }
}
