//! Smoothing primitives for zipper-free parameter changes.
//!
//! Two flavours are used in the chain:
//!
//! - [`LinearRamp`]: constant-rate ramp with an exact duration. The
//!   [`ParameterStore`](crate::ParameterStore) uses one per smoothed control so
//!   that a host automation step lands on its target after exactly the declared
//!   smoothing time.
//! - [`SmoothedParam`]: one-pole exponential glide. Stages use it internally for
//!   quantities that must never jump, such as a delay tap position.
//!
//! ```rust
//! use echoform_core::LinearRamp;
//!
//! let mut ramp = LinearRamp::new(0.0);
//! ramp.set_duration(48000.0, 10.0); // 480 samples
//! ramp.retarget(1.0);
//! for _ in 0..480 {
//!     ramp.advance();
//! }
//! assert_eq!(ramp.value(), 1.0);
//! assert!(!ramp.is_active());
//! ```

use libm::expf;

/// Constant-rate ramp toward a target.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    increment: f32,
    remaining: u32,
    /// Ramp length in samples; 0 means changes apply immediately.
    length: u32,
}

impl LinearRamp {
    /// A settled ramp sitting at `initial`.
    pub const fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            remaining: 0,
            length: 0,
        }
    }

    /// Sets the ramp duration. Takes effect on the next [`retarget`](Self::retarget).
    pub fn set_duration(&mut self, sample_rate: f32, ms: f32) {
        let samples = ms.max(0.0) * sample_rate.max(0.0) / 1000.0;
        self.length = samples as u32;
    }

    /// Starts a ramp from the current value to `target`.
    ///
    /// Re-targeting to the value already targeted leaves an in-flight ramp alone.
    pub fn retarget(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if self.length == 0 {
            self.snap(target);
        } else {
            self.increment = (target - self.current) / self.length as f32;
            self.remaining = self.length;
        }
    }

    /// Jumps straight to `value`, cancelling any ramp.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.remaining = 0;
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.increment
            };
        }
        self.current
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Value the ramp is heading to.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether a ramp is in flight.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

impl Default for LinearRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// One-pole exponential smoother.
///
/// `y[n] = y[n-1] + coeff * (target - y[n-1])` with
/// `coeff = 1 - exp(-1 / (tau * sample_rate))`, `tau = time_ms / 1000`.
/// After 5 tau the value is within 0.7 % of the target.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    time_ms: f32,
}

impl SmoothedParam {
    /// Creates a smoother at `initial` with smoothing disabled.
    pub const fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            time_ms: 0.0,
        }
    }

    /// Creates a smoother with a time constant already applied.
    pub fn with_config(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.time_ms = time_ms;
        param.set_sample_rate(sample_rate);
        param
    }

    /// Recomputes the coefficient for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = if self.time_ms <= 0.0 || sample_rate <= 0.0 {
            1.0
        } else {
            1.0 - expf(-1.0 / (self.time_ms / 1000.0 * sample_rate))
        };
    }

    /// Sets a new target; the value glides toward it.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and value together.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Advances one sample and returns the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
