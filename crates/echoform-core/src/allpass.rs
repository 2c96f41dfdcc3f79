//! Schroeder allpass diffuser.
//!
//! ```text
//! d[n] = x[n] + g·d[n-D]
//! y[n] = d[n-D] - x[n]
//! ```
//!
//! The delayed sample is read before the write, so the tap is `D - 1` in
//! [`DelayLine`] terms, the same as the reverb comb.

use crate::delay::DelayLine;
use crate::math::flush_denormal;

/// Allpass section used in series after the reverb combs.
#[derive(Debug, Clone, Default)]
pub struct AllpassFilter {
    line: DelayLine,
    delay: f32,
    feedback: f32,
}

impl AllpassFilter {
    /// Unallocated section.
    pub const fn new() -> Self {
        Self {
            line: DelayLine::new(),
            delay: 0.0,
            feedback: 0.5,
        }
    }

    /// Size for `delay_samples` and zero the contents.
    pub fn allocate(&mut self, delay_samples: usize, sample_rate: f32) {
        let delay_samples = delay_samples.max(1);
        self.line.allocate_samples(delay_samples, sample_rate);
        self.delay = delay_samples as f32;
    }

    /// Diffusion gain, clamped to `(-1, 1)`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Advance one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.delay - 1.0);
        self.line.write(flush_denormal(input + delayed * self.feedback));
        delayed - input
    }

    /// Zero the contents.
    pub fn clear(&mut self) {
        self.line.clear();
    }
}
