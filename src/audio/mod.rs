pub mod stats;
pub mod stitcher;
pub mod tempo;
pub mod validator;
pub mod waveform;

pub use stats::{measure_stats, AudioStats};
pub use stitcher::{stitch, stitch_with_fixed_pause};
pub use tempo::{clamp_fit_factor, compute_stretch_chain, is_near_unity};
pub use validator::{validate_voice_sample, ValidationChecks, ValidationReport};
pub use waveform::Waveform;
