//! End-to-end pipeline tests over fake collaborators: no network, no
//! external binaries.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use dubsync::audio::waveform::{wav_duration_seconds, Waveform};
use dubsync::audio::validator::validate_voice_sample;
use dubsync::engines::{
    EngineSet, SpeechSynthesizer, SynthesisOptions, TimedSpan, Transcriber, Transcription,
};
use dubsync::{
    DubConfig, DubError, DubbingOrchestrator, JobDir, MediaCoder, ProgressUpdate, Result,
    S2sOptions, TtsOptions, VoiceSample,
};

const RATE: u32 = 22_050;

fn tone(duration_sec: f32, sample_rate: u32) -> Waveform {
    let n = (duration_sec * sample_rate as f32).round() as usize;
    let samples = (0..n).map(|i| (i as f32 * 0.07).sin() * 0.5).collect();
    Waveform::new(samples, sample_rate)
}

fn resample_linear(wave: &Waveform, new_len: usize, sample_rate: u32) -> Waveform {
    if wave.samples.is_empty() || new_len == 0 {
        return Waveform::new(vec![0.0], sample_rate);
    }
    let last = (wave.samples.len() - 1) as f64;
    let samples = (0..new_len)
        .map(|i| {
            let pos = if new_len == 1 { 0.0 } else { i as f64 * last / (new_len - 1) as f64 };
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(wave.samples.len() - 1);
            let frac = (pos - lo as f64) as f32;
            wave.samples[lo] * (1.0 - frac) + wave.samples[hi] * frac
        })
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Synthesizer that emits a tone whose duration is looked up by segment
/// text (falling back to half a second).
struct FakeSynthesizer {
    durations: HashMap<String, f32>,
}

impl FakeSynthesizer {
    fn new(durations: &[(&str, f32)]) -> Self {
        Self {
            durations: durations.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    fn output_sample_rate(&self) -> u32 {
        RATE
    }

    async fn synthesize_to_file(
        &self,
        text: &str,
        _reference_voice: &Path,
        _language: &str,
        _options: &SynthesisOptions,
        out_path: &Path,
    ) -> Result<()> {
        let duration = self.durations.get(text).copied().unwrap_or(0.5);
        tone(duration, RATE).write_wav(out_path)
    }
}

struct FakeTranscriber {
    spans: Vec<TimedSpan>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        _audio: &Path,
        _language: Option<&str>,
        _vad_filter: bool,
    ) -> Result<Transcription> {
        let full_text = self
            .spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Transcription {
            language: Some("en".to_string()),
            duration: self.spans.last().map(|s| s.end).unwrap_or(0.0),
            spans: self.spans.clone(),
            full_text,
        })
    }
}

/// Pure-Rust stand-in for the audio-coding binary; linear interpolation
/// instead of real resampling/stretching.
struct FakeCoder;

impl MediaCoder for FakeCoder {
    fn to_mono_wav(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()> {
        let wave = Waveform::read_wav(src)?;
        let new_len =
            (wave.duration_seconds() as f64 * sample_rate as f64).round() as usize;
        resample_linear(&wave, new_len, sample_rate).write_wav(dst)
    }

    fn stretch_tempo(&self, src: &Path, dst: &Path, factor: f64) -> Result<()> {
        assert!((0.5..=2.0).contains(&factor), "factor {factor} out of range");
        let wave = Waveform::read_wav(src)?;
        let new_len = (wave.samples.len() as f64 / factor).round() as usize;
        resample_linear(&wave, new_len, wave.sample_rate).write_wav(dst)
    }

    fn resample(&self, src: &Path, dst: &Path, sample_rate: u32) -> Result<()> {
        self.to_mono_wav(src, dst, sample_rate)
    }

    fn encode_mp3(&self, src: &Path, dst: &Path, _bitrate: &str) -> Result<()> {
        std::fs::copy(src, dst)?;
        Ok(())
    }

    fn trim(&self, src: &Path, dst: &Path, start_sec: f32, duration_sec: f32) -> Result<()> {
        let wave = Waveform::read_wav(src)?;
        let start = (start_sec * wave.sample_rate as f32) as usize;
        let end = ((start_sec + duration_sec) * wave.sample_rate as f32) as usize;
        let slice = wave.samples[start.min(wave.samples.len())..end.min(wave.samples.len())]
            .to_vec();
        Waveform::new(slice, wave.sample_rate).write_wav(dst)
    }

    fn apply_speed_pitch(&self, src: &Path, dst: &Path, speed: f64, _semitones: i32) -> Result<()> {
        let wave = Waveform::read_wav(src)?;
        let new_len = (wave.samples.len() as f64 / speed).round() as usize;
        resample_linear(&wave, new_len, wave.sample_rate).write_wav(dst)
    }

    fn probe_sample_rate(&self, src: &Path) -> Result<u32> {
        Ok(Waveform::read_wav(src)?.sample_rate)
    }
}

fn make_voice(dir: &Path) -> VoiceSample {
    let clean_wav = dir.join("clean.wav");
    let clean = tone(10.0, RATE);
    clean.write_wav(&clean_wav).unwrap();
    VoiceSample {
        id: "test0001".to_string(),
        name: "Test Voice".to_string(),
        raw_path: clean_wav.clone(),
        clean_wav,
        validation: validate_voice_sample(&clean, &DubConfig::default()),
    }
}

fn orchestrator(
    synth: FakeSynthesizer,
    transcriber: FakeTranscriber,
) -> DubbingOrchestrator {
    let engines = Arc::new(EngineSet::new(Arc::new(synth), Arc::new(transcriber)));
    DubbingOrchestrator::new(engines, Arc::new(FakeCoder), DubConfig::default())
}

#[tokio::test]
async fn s2s_matches_source_timing() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    // Source: 2 s recording, spans at 0.0-1.0 and 1.5-2.0 (0.5 s gap).
    let source = root.path().join("source.wav");
    tone(2.0, RATE).write_wav(&source).unwrap();

    let spans = vec![
        TimedSpan { start: 0.0, end: 1.0, text: "Hello".to_string() },
        TimedSpan { start: 1.5, end: 2.0, text: "world".to_string() },
    ];
    // Synthesized durations 1.2 s and 0.3 s: stretch factors 1.2 and 0.6.
    let orch = orchestrator(
        FakeSynthesizer::new(&[("Hello", 1.2), ("world", 0.3)]),
        FakeTranscriber { spans },
    );

    let out = orch
        .dub_speech(&source, &voice, &S2sOptions::default(), &job)
        .await
        .unwrap();

    assert_eq!(out.span_count, 2);
    // 1.0 s fitted + 0.5 s gap + 0.5 s fitted.
    let duration = wav_duration_seconds(&out.wav).unwrap();
    assert!((duration - 2.0).abs() < 0.02, "duration was {duration}");

    let transcript = std::fs::read_to_string(&out.transcript).unwrap();
    assert_eq!(transcript, "Hello world");

    // Peak-normalization invariant.
    let wave = Waveform::read_wav(&out.wav).unwrap();
    assert!(wave.peak() <= 0.99 + 1e-3);
}

#[tokio::test]
async fn s2s_without_usable_spans_fails() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();
    let source = root.path().join("source.wav");
    tone(1.0, RATE).write_wav(&source).unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[]),
        FakeTranscriber { spans: Vec::new() },
    );
    let err = orch
        .dub_speech(&source, &voice, &S2sOptions::default(), &job)
        .await
        .unwrap_err();
    assert!(matches!(err, DubError::NoSpeechDetected));
}

#[tokio::test]
async fn s2s_rejects_unknown_container() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();
    let source = root.path().join("source.xyz");
    std::fs::write(&source, b"not audio").unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[]),
        FakeTranscriber { spans: Vec::new() },
    );
    let err = orch
        .dub_speech(&source, &voice, &S2sOptions::default(), &job)
        .await
        .unwrap_err();
    assert!(matches!(err, DubError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn tts_stitches_segments_with_dub_pause() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[("First;", 0.5), ("Second;", 0.5)]),
        FakeTranscriber { spans: Vec::new() },
    );
    let out = orch
        .synthesize_text("First. Second.", &voice, &TtsOptions::default(), &job)
        .await
        .unwrap();

    // Two 0.5 s segments joined by the 180 ms dubbing pause.
    let duration = wav_duration_seconds(&out.wav).unwrap();
    assert!((duration - 1.18).abs() < 0.01, "duration was {duration}");
    assert!(out.mp3.is_none());
}

#[tokio::test]
async fn tts_blank_text_writes_placeholder() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[]),
        FakeTranscriber { spans: Vec::new() },
    );
    let out = orch
        .synthesize_text("   ", &voice, &TtsOptions::default(), &job)
        .await
        .unwrap();

    let wave = Waveform::read_wav(&out.wav).unwrap();
    assert!(!wave.is_empty());
    assert!(wave.duration_seconds() < 0.01);
}

#[tokio::test]
async fn tts_speed_post_shortens_output() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[("Only segment", 1.0)]),
        FakeTranscriber { spans: Vec::new() },
    );
    let options = TtsOptions { speed: 1.25, ..TtsOptions::default() };
    let out = orch
        .synthesize_text("Only segment", &voice, &options, &job)
        .await
        .unwrap();

    let duration = wav_duration_seconds(&out.wav).unwrap();
    assert!((duration - 0.8).abs() < 0.02, "duration was {duration}");
}

#[tokio::test]
async fn tts_exports_mp3_when_requested() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    let orch = orchestrator(
        FakeSynthesizer::new(&[]),
        FakeTranscriber { spans: Vec::new() },
    );
    let options = TtsOptions { export_mp3: true, ..TtsOptions::default() };
    let out = orch
        .synthesize_text("Just one line", &voice, &options, &job)
        .await
        .unwrap();
    assert!(out.mp3.as_ref().is_some_and(|p| p.exists()));
}

#[tokio::test]
async fn progress_updates_are_reported() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let engines = Arc::new(EngineSet::new(
        Arc::new(FakeSynthesizer::new(&[])),
        Arc::new(FakeTranscriber { spans: Vec::new() }),
    ));
    let orch = DubbingOrchestrator::new(engines, Arc::new(FakeCoder), DubConfig::default())
        .with_progress(tx);

    orch.synthesize_text("Some text", &voice, &TtsOptions::default(), &job)
        .await
        .unwrap();
    drop(orch);

    let mut saw_started = false;
    let mut saw_finished = false;
    while let Some(update) = rx.recv().await {
        match update {
            ProgressUpdate::Started => saw_started = true,
            ProgressUpdate::Finished => saw_finished = true,
            _ => {}
        }
    }
    assert!(saw_started && saw_finished);
}

#[tokio::test]
async fn progress_with_lagging_receiver_never_stalls() {
    let root = tempfile::tempdir().unwrap();
    let voice = make_voice(root.path());
    let job = JobDir::at(root.path().join("job")).unwrap();

    // Capacity 1 and a receiver that never polls: overflowing updates must
    // be dropped, not block the pipeline.
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    let engines = Arc::new(EngineSet::new(
        Arc::new(FakeSynthesizer::new(&[])),
        Arc::new(FakeTranscriber { spans: Vec::new() }),
    ));
    let orch = DubbingOrchestrator::new(engines, Arc::new(FakeCoder), DubConfig::default())
        .with_progress(tx);

    orch.synthesize_text("One. Two. Three.", &voice, &TtsOptions::default(), &job)
        .await
        .unwrap();
    drop(rx);
}

#[test]
fn voice_registration_standardizes_and_validates() {
    let root = tempfile::tempdir().unwrap();
    let library =
        dubsync::VoiceLibrary::new(root.path().join("voices"), DubConfig::default()).unwrap();

    // 10 s source at 44.1 kHz; registration standardizes to 22.05 kHz.
    let source = root.path().join("speaker.wav");
    tone(10.0, 44_100).write_wav(&source).unwrap();

    let voice = library
        .register_from_file(&FakeCoder, &source, Some("Narrator"))
        .unwrap();
    assert_eq!(voice.name, "Narrator");
    assert!(voice.validation.passed, "checks: {:?}", voice.validation.checks);

    let clean = Waveform::read_wav(&voice.clean_wav).unwrap();
    assert_eq!(clean.sample_rate, RATE);

    let listed = library.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, voice.id);
    assert!(library.get(&voice.id).unwrap().is_some());
    assert!(library.get("missing0").unwrap().is_none());

    let revalidated = library.revalidate(&voice.id).unwrap().unwrap();
    assert!(revalidated.validation.passed);
}

#[test]
fn voice_registration_rejects_unknown_format() {
    let root = tempfile::tempdir().unwrap();
    let library =
        dubsync::VoiceLibrary::new(root.path().join("voices"), DubConfig::default()).unwrap();
    let source = root.path().join("speaker.pdf");
    std::fs::write(&source, b"not media").unwrap();

    let err = library
        .register_from_file(&FakeCoder, &source, None)
        .unwrap_err();
    assert!(matches!(err, DubError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn transcribe_source_persists_transcript() {
    let root = tempfile::tempdir().unwrap();
    let job = JobDir::at(root.path().join("job")).unwrap();
    let source = root.path().join("talk.wav");
    tone(1.0, RATE).write_wav(&source).unwrap();

    let spans = vec![TimedSpan { start: 0.0, end: 1.0, text: "bom dia".to_string() }];
    let orch = orchestrator(FakeSynthesizer::new(&[]), FakeTranscriber { spans });

    let transcription = orch.transcribe_source(&source, None, &job).await.unwrap();
    assert_eq!(transcription.full_text, "bom dia");
    assert!(job.standardized_source().exists());
    assert_eq!(
        std::fs::read_to_string(job.transcript_txt()).unwrap(),
        "bom dia"
    );
}
