//! Second-order IIR section and its coefficient designs.
//!
//! Second-order designs follow the RBJ Audio EQ Cookbook; the first-order
//! low/high-pass pair uses the bilinear transform with prewarping and leaves
//! `b2 = a2 = 0`.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf, tanf};

use crate::math::flush_denormal;

/// Raw (un-normalized) biquad coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Feedforward.
    pub b0: f32,
    /// Feedforward.
    pub b1: f32,
    /// Feedforward.
    pub b2: f32,
    /// Feedback normalizer.
    pub a0: f32,
    /// Feedback.
    pub a1: f32,
    /// Feedback.
    pub a2: f32,
}

/// Keep design frequencies strictly inside (0, Nyquist).
#[inline]
fn omega(frequency: f32, sample_rate: f32) -> f32 {
    let fc = frequency.clamp(1.0, sample_rate * 0.49);
    2.0 * PI * fc / sample_rate
}

impl Coefficients {
    /// `y = x`.
    pub const PASSTHROUGH: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a0: 1.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Second-order lowpass.
    pub fn lowpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let w = omega(frequency, sample_rate);
        let (cos_w, alpha) = (cosf(w), sinf(w) / (2.0 * q));
        Self {
            b0: (1.0 - cos_w) / 2.0,
            b1: 1.0 - cos_w,
            b2: (1.0 - cos_w) / 2.0,
            a0: 1.0 + alpha,
            a1: -2.0 * cos_w,
            a2: 1.0 - alpha,
        }
    }

    /// Second-order highpass.
    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let w = omega(frequency, sample_rate);
        let (cos_w, alpha) = (cosf(w), sinf(w) / (2.0 * q));
        Self {
            b0: (1.0 + cos_w) / 2.0,
            b1: -(1.0 + cos_w),
            b2: (1.0 + cos_w) / 2.0,
            a0: 1.0 + alpha,
            a1: -2.0 * cos_w,
            a2: 1.0 - alpha,
        }
    }

    /// First-order lowpass, 6 dB/octave.
    pub fn first_order_lowpass(frequency: f32, sample_rate: f32) -> Self {
        let k = tanf(omega(frequency, sample_rate) / 2.0);
        Self {
            b0: k,
            b1: k,
            b2: 0.0,
            a0: k + 1.0,
            a1: k - 1.0,
            a2: 0.0,
        }
    }

    /// First-order highpass, 6 dB/octave.
    pub fn first_order_highpass(frequency: f32, sample_rate: f32) -> Self {
        let k = tanf(omega(frequency, sample_rate) / 2.0);
        Self {
            b0: 1.0,
            b1: -1.0,
            b2: 0.0,
            a0: k + 1.0,
            a1: k - 1.0,
            a2: 0.0,
        }
    }

    /// Peaking bell. Unity everywhere at 0 dB.
    pub fn peaking(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = powf(10.0, gain_db / 40.0);
        let w = omega(frequency, sample_rate);
        let (cos_w, alpha) = (cosf(w), sinf(w) / (2.0 * q));
        Self {
            b0: 1.0 + alpha * a,
            b1: -2.0 * cos_w,
            b2: 1.0 - alpha * a,
            a0: 1.0 + alpha / a,
            a1: -2.0 * cos_w,
            a2: 1.0 - alpha / a,
        }
    }

    /// Low shelf, slope 1.
    pub fn low_shelf(frequency: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = powf(10.0, gain_db / 40.0);
        let w = omega(frequency, sample_rate);
        let cos_w = cosf(w);
        let beta = 2.0 * sqrtf(a) * sinf(w) / 2.0 * core::f32::consts::SQRT_2;
        Self {
            b0: a * ((a + 1.0) - (a - 1.0) * cos_w + beta),
            b1: 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
            b2: a * ((a + 1.0) - (a - 1.0) * cos_w - beta),
            a0: (a + 1.0) + (a - 1.0) * cos_w + beta,
            a1: -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
            a2: (a + 1.0) + (a - 1.0) * cos_w - beta,
        }
    }

    /// High shelf, slope 1.
    pub fn high_shelf(frequency: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = powf(10.0, gain_db / 40.0);
        let w = omega(frequency, sample_rate);
        let cos_w = cosf(w);
        let beta = 2.0 * sqrtf(a) * sinf(w) / 2.0 * core::f32::consts::SQRT_2;
        Self {
            b0: a * ((a + 1.0) + (a - 1.0) * cos_w + beta),
            b1: -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
            b2: a * ((a + 1.0) + (a - 1.0) * cos_w - beta),
            a0: (a + 1.0) - (a - 1.0) * cos_w + beta,
            a1: 2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
            a2: (a + 1.0) - (a - 1.0) * cos_w - beta,
        }
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::PASSTHROUGH
    }
}

/// Direct Form I biquad.
///
/// ```text
/// y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]
/// ```
///
/// Coefficients are stored normalized by `a0`. Changing them keeps the
/// history, so a filter can be re-tuned mid-stream without a click.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Passthrough filter with cleared history.
    pub const fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Load coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, c: Coefficients) {
        let inv = 1.0 / c.a0;
        self.b0 = c.b0 * inv;
        self.b1 = c.b1 * inv;
        self.b2 = c.b2 * inv;
        self.a1 = c.a1 * inv;
        self.a2 = c.a2 * inv;
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);
        output
    }

    /// Zero the history; coefficients are kept.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}
