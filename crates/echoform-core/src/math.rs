//! Unit conversions and small waveshaping helpers used while cooking
//! parameters and inside stages.
//!
//! All functions are allocation-free and `no_std`.
//!
//! # Cooking conversions
//!
//! | Raw unit | Cooked unit | Function |
//! |----------|-------------|----------|
//! | dB | linear gain | [`db_to_linear`] |
//! | % | fraction | [`percent_to_fraction`] |
//! | ms | samples | [`ms_to_samples`] |

use libm::{expf, logf, tanhf};

/// Convert decibels to linear gain, `10^(dB/20)`.
///
/// # Example
/// ```rust
/// use echoform_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs at or below zero map to -200 dB.
///
/// # Example
/// ```rust
/// use echoform_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 1e-4);
/// assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert a 0–100 percentage control into a 0.0–1.0 fraction.
#[inline]
pub fn percent_to_fraction(percent: f32) -> f32 {
    percent * 0.01
}

/// Convert milliseconds to a (fractional) sample count.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Number of samples a buffer must hold to cover `max_ms` at `sample_rate`.
///
/// `ceil(max_ms * sample_rate / 1000)`, never less than one sample.
///
/// ```rust
/// use echoform_core::buffer_len_for;
///
/// assert_eq!(buffer_len_for(2000.0, 48000.0), 96000);
/// assert_eq!(buffer_len_for(0.01, 44100.0), 1);
/// ```
#[inline]
pub fn buffer_len_for(max_ms: f32, sample_rate: f32) -> usize {
    (libm::ceilf(ms_to_samples(max_ms, sample_rate)) as usize).max(1)
}

/// Normalized saturation curve `tanh(k·x) / tanh(k)`.
///
/// Unity slope region is preserved for small `k`; `k <= 0` passes through.
#[inline]
pub fn saturate(x: f32, k: f32) -> f32 {
    if k <= 1e-3 {
        return x;
    }
    tanhf(k * x) / tanhf(k)
}

/// Zero out values below 1e-20 before they become subnormal.
///
/// Use inside feedback paths (delays, recursive filters) where a signal can
/// decay toward zero indefinitely.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_linear_roundtrip() {
        for &db in &[-60.0, -12.0, -3.0, 0.0, 6.0, 12.0] {
            let back = linear_to_db(db_to_linear(db));
            assert!((back - db).abs() < 1e-3, "{db} dB came back as {back}");
        }
    }

    #[test]
    fn db_to_linear_matches_power_form() {
        for &db in &[-40.0_f32, -6.0, 0.0, 2.5, 10.0] {
            let expected = libm::powf(10.0, db / 20.0);
            assert!((db_to_linear(db) - expected).abs() < 1e-5 * expected.max(1.0));
        }
    }

    #[test]
    fn buffer_length_rounds_up() {
        // 590 ms at 44.1 kHz = 26019 samples exactly
        assert_eq!(buffer_len_for(590.0, 44100.0), 26019);
        // 1 ms at 44.1 kHz = 44.1 → 45
        assert_eq!(buffer_len_for(1.0, 44100.0), 45);
    }

    #[test]
    fn saturate_is_bounded_and_odd() {
        for &x in &[-4.0, -1.0, -0.25, 0.0, 0.25, 1.0, 4.0] {
            let y = saturate(x, 3.0);
            assert!(y.abs() <= 1.0 / libm::tanhf(3.0) + 1e-6);
            assert!((saturate(-x, 3.0) + y).abs() < 1e-6);
        }
        assert_eq!(saturate(0.7, 0.0), 0.7);
    }

    #[test]
    fn flush_denormal_zeroes_tiny_values() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
