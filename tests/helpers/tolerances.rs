//! Tolerance constants for audio testing.
//!
//! Cached samples are copied bit-for-bit, so comparisons against the source
//! are exact up to float rounding.

/// Floating point rounding errors.
/// Use for samples that should come back unchanged.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;
