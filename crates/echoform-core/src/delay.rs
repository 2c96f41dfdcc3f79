//! Circular delay line with write-then-read semantics.
//!
//! Every delay stage in the crate follows the same per-sample contract:
//!
//! 1. write `input + feedback · previous_output`
//! 2. read the tap
//!
//! With that order a tap of `d` samples returns the sample written `d` frames
//! ago, and `d = 0` returns the sample just written. Taps are clamped to
//! `[0, len - 1]`, so modulation that overshoots the buffer holds at the
//! boundary instead of indexing out of range.
//!
//! The buffer is sized in [`DelayLine::allocate`] as
//! `ceil(max_ms · sample_rate / 1000)` samples and zero-filled. That is the
//! only allocation; reads and writes never allocate.
//!
//! ```rust
//! use echoform_core::DelayLine;
//!
//! let mut line = DelayLine::new();
//! line.allocate(1.0, 48000.0); // 48 samples
//!
//! line.write(1.0);
//! assert_eq!(line.read(0.0), 1.0);
//! for _ in 0..10 {
//!     line.write(0.0);
//! }
//! assert_eq!(line.read(10.0), 1.0);
//! assert_eq!(line.read(9.5), 0.5);
//! ```

use alloc::vec::Vec;

use crate::math::{buffer_len_for, ms_to_samples};

/// Linearly interpolated circular buffer.
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buffer: Vec<f32>,
    /// Slot the next write goes to.
    write_pos: usize,
    sample_rate: f32,
}

impl DelayLine {
    /// An unallocated line. Reads return silence until [`allocate`](Self::allocate).
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
            sample_rate: 0.0,
        }
    }

    /// Size for `max_ms` at `sample_rate` and zero the contents.
    ///
    /// Safe to call again on a rate change; nothing from before survives.
    pub fn allocate(&mut self, max_ms: f32, sample_rate: f32) {
        let len = buffer_len_for(max_ms, sample_rate);
        #[cfg(feature = "tracing")]
        tracing::debug!(max_ms, sample_rate, len, "delay line allocated");
        self.allocate_samples(len, sample_rate);
    }

    /// Size to exactly `len` samples (at least one) and zero the contents.
    ///
    /// For fixed-length lines such as reverb combs, whose lengths are given
    /// in samples rather than milliseconds.
    pub fn allocate_samples(&mut self, len: usize, sample_rate: f32) {
        self.buffer.clear();
        self.buffer.resize(len.max(1), 0.0);
        self.write_pos = 0;
        self.sample_rate = sample_rate;
    }

    /// Zero the contents without resizing.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Buffer length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the line is unallocated.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Longest valid tap, in samples.
    pub fn max_tap(&self) -> f32 {
        self.buffer.len().saturating_sub(1) as f32
    }

    /// Push one sample.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        let len = self.buffer.len();
        if len == 0 {
            return;
        }
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
    }

    #[inline]
    fn at(&self, age: usize) -> f32 {
        let len = self.buffer.len();
        // newest sample sits one slot behind write_pos
        self.buffer[(self.write_pos + len - 1 - age) % len]
    }

    /// Sample written `delay_samples` frames ago, linearly interpolated.
    ///
    /// The tap is clamped to `[0, len - 1]`; NaN reads the newest sample.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let max = self.max_tap();
        let tap = if delay_samples.is_nan() {
            0.0
        } else {
            delay_samples.clamp(0.0, max)
        };
        let whole = tap as usize;
        let frac = tap - whole as f32;
        let a = self.at(whole);
        if frac == 0.0 {
            return a;
        }
        let b = self.at((whole + 1).min(self.buffer.len() - 1));
        a + (b - a) * frac
    }

    /// [`read`](Self::read) with the tap in milliseconds.
    #[inline]
    pub fn read_ms(&self, delay_ms: f32) -> f32 {
        self.read(ms_to_samples(delay_ms, self.sample_rate))
    }

    /// Write then read, the order every delay stage uses.
    #[inline]
    pub fn write_then_read(&mut self, sample: f32, delay_samples: f32) -> f32 {
        self.write(sample);
        self.read(delay_samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_uses_ceiling() {
        let mut line = DelayLine::new();
        line.allocate(2000.0, 48000.0);
        assert_eq!(line.len(), 96000);
        line.allocate(1.0, 44100.0);
        assert_eq!(line.len(), 45);
    }

    #[test]
    fn unallocated_line_is_silent() {
        let mut line = DelayLine::new();
        line.write(1.0);
        assert_eq!(line.read(0.0), 0.0);
    }

    #[test]
    fn zero_tap_reads_current_write() {
        let mut line = DelayLine::new();
        line.allocate(10.0, 1000.0);
        assert_eq!(line.write_then_read(0.75, 0.0), 0.75);
    }

    #[test]
    fn impulse_arrives_after_tap() {
        let mut line = DelayLine::new();
        line.allocate(100.0, 1000.0); // 100 samples
        let mut arrival = None;
        for n in 0..100 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            if line.write_then_read(x, 37.0) == 1.0 {
                arrival = Some(n);
            }
        }
        assert_eq!(arrival, Some(37));
    }

    #[test]
    fn tap_is_clamped_to_buffer() {
        let mut line = DelayLine::new();
        line.allocate(10.0, 1000.0); // 10 samples
        for n in 0..10 {
            line.write(n as f32);
        }
        // oldest sample is 0.0, newest 9.0
        assert_eq!(line.read(500.0), 0.0);
        assert_eq!(line.read(-3.0), 9.0);
        assert_eq!(line.read(f32::NAN), 9.0);
    }

    #[test]
    fn reallocation_clears_old_contents() {
        let mut line = DelayLine::new();
        line.allocate(10.0, 1000.0);
        for _ in 0..10 {
            line.write(1.0);
        }
        line.allocate(10.0, 2000.0);
        for tap in 0..line.len() {
            assert_eq!(line.read(tap as f32), 0.0);
        }
    }

    #[test]
    fn read_ms_converts_with_rate() {
        let mut line = DelayLine::new();
        line.allocate(600.0, 48000.0);
        line.write(1.0);
        for _ in 0..24000 {
            line.write(0.0);
        }
        assert_eq!(line.read_ms(500.0), 1.0);
    }
}
