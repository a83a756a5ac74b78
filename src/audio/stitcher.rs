//! Concatenation of per-segment waveforms with silence gaps.

use log::debug;

use crate::audio::waveform::Waveform;
use crate::config::PEAK_CEILING;
use crate::error::{DubError, Result};

/// Gaps at or below this length are omitted entirely; they would only add
/// negligible silence slivers.
const MIN_GAP_SECONDS: f32 = 1e-3;

/// Concatenates `waveforms` in order, inserting `gaps_seconds[i]` of exact
/// silence between waveform `i` and `i + 1`.
///
/// `gaps_seconds` must hold one entry per adjacent pair (no gap after the
/// last segment). All inputs must share `sample_rate`. An empty input list
/// yields a single near-zero sample, never an empty buffer. The output peak
/// is capped at 0.99.
pub fn stitch(waveforms: &[Waveform], gaps_seconds: &[f32], sample_rate: u32) -> Result<Waveform> {
    if waveforms.is_empty() {
        return Ok(Waveform::near_silent(sample_rate));
    }
    if gaps_seconds.len() != waveforms.len() - 1 {
        return Err(DubError::AudioProcessing(format!(
            "expected {} gaps for {} segments, got {}",
            waveforms.len() - 1,
            waveforms.len(),
            gaps_seconds.len()
        )));
    }
    for wave in waveforms {
        if wave.sample_rate != sample_rate {
            return Err(DubError::SampleRateMismatch {
                expected: sample_rate,
                got: wave.sample_rate,
            });
        }
    }

    let gap_lengths: Vec<usize> = gaps_seconds
        .iter()
        .map(|&gap| {
            if gap > MIN_GAP_SECONDS {
                (gap * sample_rate as f32).round() as usize
            } else {
                0
            }
        })
        .collect();

    let total: usize = waveforms.iter().map(|w| w.samples.len()).sum::<usize>()
        + gap_lengths.iter().sum::<usize>();
    let mut samples = Vec::with_capacity(total);

    for (i, wave) in waveforms.iter().enumerate() {
        samples.extend_from_slice(&wave.samples);
        if i < waveforms.len() - 1 {
            samples.extend(std::iter::repeat(0.0f32).take(gap_lengths[i]));
        }
    }

    let mut out = Waveform::new(samples, sample_rate);
    out.limit_peak(PEAK_CEILING);
    debug!(
        "stitched {} segments into {} samples @ {} Hz",
        waveforms.len(),
        out.samples.len(),
        sample_rate
    );
    Ok(out)
}

/// Stitches with the same pause between every adjacent pair, the behavior
/// of the free-form TTS path.
pub fn stitch_with_fixed_pause(
    waveforms: &[Waveform],
    pause_ms: u32,
    sample_rate: u32,
) -> Result<Waveform> {
    let gap = pause_ms as f32 / 1000.0;
    let gaps = vec![gap; waveforms.len().saturating_sub(1)];
    stitch(waveforms, &gaps, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(samples: Vec<f32>) -> Waveform {
        Waveform::new(samples, 22_050)
    }

    #[test]
    fn empty_input_yields_non_empty_output() {
        let out = stitch(&[], &[], 22_050).unwrap();
        assert!(out.samples.len() >= 1);
    }

    #[test]
    fn output_length_is_segments_plus_gaps() {
        let waves = vec![wave(vec![0.1; 100]), wave(vec![0.2; 50])];
        let out = stitch(&waves, &[0.5], 22_050).unwrap();
        assert_eq!(out.samples.len(), 100 + 50 + (0.5f32 * 22_050.0).round() as usize);
    }

    #[test]
    fn zero_gap_equals_direct_concatenation() {
        let a = wave(vec![0.1, 0.2, 0.3]);
        let b = wave(vec![0.4, 0.5]);
        let out = stitch(&[a.clone(), b.clone()], &[0.0], 22_050).unwrap();
        let mut direct = a.samples.clone();
        direct.extend_from_slice(&b.samples);
        assert_eq!(out.samples, direct);
    }

    #[test]
    fn sub_millisecond_gap_is_omitted() {
        let waves = vec![wave(vec![0.1; 10]), wave(vec![0.2; 10])];
        let out = stitch(&waves, &[0.0005], 22_050).unwrap();
        assert_eq!(out.samples.len(), 20);
    }

    #[test]
    fn gaps_are_exact_zeros() {
        let waves = vec![wave(vec![0.5; 4]), wave(vec![0.5; 4])];
        let out = stitch(&waves, &[0.01], 22_050).unwrap();
        let gap_len = (0.01f32 * 22_050.0).round() as usize;
        assert!(out.samples[4..4 + gap_len].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn loud_output_is_scaled_to_ceiling() {
        let waves = vec![wave(vec![1.5, -0.5])];
        let out = stitch(&waves, &[], 22_050).unwrap();
        assert!((out.peak() - 0.99).abs() < 1e-6);
    }

    #[test]
    fn mismatched_rate_is_rejected() {
        let waves = vec![Waveform::new(vec![0.1; 10], 44_100)];
        let err = stitch(&waves, &[], 22_050).unwrap_err();
        assert!(matches!(err, DubError::SampleRateMismatch { .. }));
    }

    #[test]
    fn wrong_gap_count_is_rejected() {
        let waves = vec![wave(vec![0.1; 10]), wave(vec![0.1; 10])];
        assert!(stitch(&waves, &[], 22_050).is_err());
    }

    #[test]
    fn fixed_pause_inserts_equal_gaps() {
        let waves = vec![wave(vec![0.1; 10]), wave(vec![0.1; 10]), wave(vec![0.1; 10])];
        let out = stitch_with_fixed_pause(&waves, 120, 22_050).unwrap();
        let gap_len = (0.12f32 * 22_050.0).round() as usize;
        assert_eq!(out.samples.len(), 30 + 2 * gap_len);
    }
}
