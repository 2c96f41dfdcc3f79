//! Damped feedback comb for the reverb tank.
//!
//! ```text
//! y[n] = w[n-D]
//! w[n] = x[n] + g·lp(y[n])
//! ```
//!
//! The loop output feeds back within the same sample, so the tap is read
//! before the write (`D - 1` in [`DelayLine`] terms). An impulse reappears
//! every `D` samples, scaled by `feedback` and darkened by the one-pole in
//! the loop. Reverb loops are the only place besides [`AllpassFilter`] that
//! reads first.
//!
//! [`AllpassFilter`]: crate::AllpassFilter

use crate::delay::DelayLine;
use crate::math::flush_denormal;

/// Feedback comb with a one-pole lowpass in the loop.
///
/// ```rust
/// use echoform_core::CombFilter;
///
/// let mut comb = CombFilter::new();
/// comb.allocate(100, 48000.0);
/// comb.set_feedback(0.5);
/// comb.set_damp(0.0);
///
/// assert_eq!(comb.process(1.0), 0.0);
/// for _ in 1..100 {
///     comb.process(0.0);
/// }
/// assert_eq!(comb.process(0.0), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombFilter {
    line: DelayLine,
    delay: f32,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl CombFilter {
    /// Unallocated comb, silent until [`allocate`](Self::allocate).
    pub const fn new() -> Self {
        Self {
            line: DelayLine::new(),
            delay: 0.0,
            feedback: 0.5,
            damp: 0.0,
            store: 0.0,
        }
    }

    /// Size for a loop of `delay_samples` and zero all state.
    pub fn allocate(&mut self, delay_samples: usize, sample_rate: f32) {
        let delay_samples = delay_samples.max(1);
        self.line.allocate_samples(delay_samples, sample_rate);
        self.delay = delay_samples as f32;
        self.store = 0.0;
    }

    /// Shorten or restore the loop without reallocating. Clamped to the
    /// allocated length.
    pub fn set_delay_samples(&mut self, delay_samples: usize) {
        self.delay = delay_samples.min(self.line.len()).max(1) as f32;
    }

    /// Loop gain, clamped to `[0, 0.99]`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Current loop gain.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// High-frequency damping in the loop, `0` bright to `1` dark.
    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    /// Loop length in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay as usize
    }

    /// Advance one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.line.read(self.delay - 1.0);
        self.store = flush_denormal(output * (1.0 - self.damp) + self.store * self.damp);
        self.line.write(input + self.store * self.feedback);
        output
    }

    /// Zero the loop without resizing.
    pub fn clear(&mut self) {
        self.line.clear();
        self.store = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comb(len: usize, feedback: f32, damp: f32) -> CombFilter {
        let mut comb = CombFilter::new();
        comb.allocate(len, 48000.0);
        comb.set_feedback(feedback);
        comb.set_damp(damp);
        comb
    }

    #[test]
    fn echoes_decay_by_feedback() {
        let mut c = comb(10, 0.5, 0.0);
        let out: Vec<f32> = (0..31).map(|n| c.process(if n == 0 { 1.0 } else { 0.0 })).collect();
        assert_eq!(out[10], 1.0);
        assert!((out[20] - 0.5).abs() < 1e-6);
        assert!((out[30] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn damping_darkens_tail() {
        let mut bright = comb(20, 0.8, 0.0);
        let mut dark = comb(20, 0.8, 0.8);
        let (mut b, mut d) = (0.0f32, 0.0f32);
        for n in 0..400 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            b += bright.process(x).abs();
            d += dark.process(x).abs();
        }
        assert!(d < b, "dark {d} bright {b}");
    }

    #[test]
    fn clear_silences() {
        let mut c = comb(10, 0.9, 0.2);
        for _ in 0..50 {
            c.process(1.0);
        }
        c.clear();
        for _ in 0..50 {
            assert_eq!(c.process(0.0), 0.0);
        }
    }

    #[test]
    fn shortened_loop_echoes_sooner() {
        let mut c = comb(100, 0.5, 0.0);
        c.set_delay_samples(40);
        let out: Vec<f32> = (0..41).map(|n| c.process(if n == 0 { 1.0 } else { 0.0 })).collect();
        assert_eq!(out[40], 1.0);
        c.set_delay_samples(1000);
        assert_eq!(c.delay_samples(), 100);
    }

    #[test]
    fn feedback_is_clamped() {
        let mut c = comb(10, 2.0, 0.0);
        assert_eq!(c.feedback(), 0.99);
        c.set_feedback(-1.0);
        assert_eq!(c.feedback(), 0.0);
    }
}
