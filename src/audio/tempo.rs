//! Tempo-matching math for the time-stretch collaborator.
//!
//! The external constant-pitch stretch primitive accepts one multiplicative
//! factor in `[0.5, 2.0]` per invocation. Factors outside that range are
//! decomposed into a chain of in-range steps whose product equals the
//! requested factor.

/// Valid single-call range of the stretch primitive.
pub const STRETCH_STEP_MIN: f64 = 0.5;
pub const STRETCH_STEP_MAX: f64 = 2.0;

/// Overall fit-factor clamp used by the orchestrator for segment fitting.
pub const FIT_FACTOR_MIN: f64 = 0.25;
pub const FIT_FACTOR_MAX: f64 = 4.0;

/// A factor within this relative distance of 1.0 bypasses the stretch call
/// entirely; near-unity stretches cost an external call and add artifacts.
pub const NEAR_UNITY_TOLERANCE: f64 = 0.03;

/// Decomposes `factor` into a chain of per-call factors, each in
/// `[0.5, 2.0]`, whose product equals `factor` within floating tolerance.
///
/// A final residual within 0.1% of 1.0 is skipped (a stretch of 1.0 is a
/// no-op), so a factor of exactly 1.0 yields an empty chain. A factor ≤ 0
/// guards against degenerate durations upstream and yields `[1.0]`.
pub fn compute_stretch_chain(factor: f64) -> Vec<f64> {
    if factor <= 0.0 {
        return vec![1.0];
    }
    let mut chain = Vec::new();
    let mut remaining = factor;
    while remaining < STRETCH_STEP_MIN {
        chain.push(STRETCH_STEP_MIN);
        remaining /= STRETCH_STEP_MIN;
    }
    while remaining > STRETCH_STEP_MAX {
        chain.push(STRETCH_STEP_MAX);
        remaining /= STRETCH_STEP_MAX;
    }
    if (remaining - 1.0).abs() > 1e-3 {
        chain.push(remaining);
    }
    chain
}

/// Clamps a segment-fitting factor to the overall supported range.
pub fn clamp_fit_factor(factor: f64) -> f64 {
    factor.clamp(FIT_FACTOR_MIN, FIT_FACTOR_MAX)
}

/// True when `factor` is close enough to 1.0 that stretching should be
/// skipped in favor of a plain copy.
pub fn is_near_unity(factor: f64) -> bool {
    (factor - 1.0).abs() < NEAR_UNITY_TOLERANCE
}
