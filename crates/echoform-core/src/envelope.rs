//! Peak envelope detector for the dynamics stages.
//!
//! One-pole attack/release smoothing of `|x|`:
//!
//! ```text
//! coeff = exp(-1 / (time_ms · sample_rate / 1000))
//! env   = coeff · env + (1 - coeff) · |x|
//! ```
//!
//! The attack coefficient applies while the input is above the envelope,
//! the release coefficient otherwise. A time of zero makes that side track
//! instantly.

use libm::expf;

use crate::math::{flush_denormal, linear_to_db};

/// Attack/release peak follower.
///
/// ```rust
/// use echoform_core::EnvelopeDetector;
///
/// let mut env = EnvelopeDetector::new(48000.0);
/// env.set_times(0.0, 100.0);
/// assert_eq!(env.process(-0.5), 0.5);
/// assert!(env.process(0.0) < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: f32,
}

fn time_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms * sample_rate / 1000.0;
    if samples <= 0.0 {
        0.0
    } else {
        expf(-1.0 / samples)
    }
}

impl EnvelopeDetector {
    /// Detector with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut detector = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            sample_rate,
        };
        detector.update_coeffs();
        detector
    }

    fn update_coeffs(&mut self) {
        self.attack_coeff = time_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_coeff(self.release_ms, self.sample_rate);
    }

    /// Set attack and release in ms. Negative times count as zero.
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32) {
        let (attack_ms, release_ms) = (attack_ms.max(0.0), release_ms.max(0.0));
        if attack_ms != self.attack_ms || release_ms != self.release_ms {
            self.attack_ms = attack_ms;
            self.release_ms = release_ms;
            self.update_coeffs();
        }
    }

    /// Zero the envelope and re-derive coefficients for `sample_rate`.
    pub fn reset(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.envelope = 0.0;
        self.update_coeffs();
    }

    /// Track one sample; returns the linear envelope.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = flush_denormal(coeff * self.envelope + (1.0 - coeff) * level);
        self.envelope
    }

    /// Current envelope, linear.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Current envelope in dB.
    pub fn level_db(&self) -> f32 {
        linear_to_db(self.envelope)
    }
}

impl Default for EnvelopeDetector {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
