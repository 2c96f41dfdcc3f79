//! Echoform Effects - concrete stages for the echoform topologies
//!
//! Every type here implements [`EffectStage`](echoform_core::EffectStage);
//! the ones with linked channels also implement
//! [`StereoStage`](echoform_core::StereoStage).
//!
//! - [`AudioFilter`] - Biquad band: first/second-order pass filters, peaking EQ, shelves
//! - [`BandLimit`] - Highpass into lowpass
//! - [`Dynamics`] - Compressor, limiter and downward-expander gate
//! - [`TubePreamp`] - Asymmetric tube saturation with DC block and air shelf
//! - [`ReverbTank`] - Pre-delay, parallel combs, series allpasses
//! - [`StereoDelay`] - Normal or ping-pong feedback delay
//! - [`TapeDelay`] - Record/playback loop with limiter, saturation, hiss and hum
//!
//! ## Example
//!
//! ```rust
//! use echoform_core::{EffectStage, EffectStageExt};
//! use echoform_effects::{
//!     AudioFilter, Dynamics, DynamicsConfig, FilterAlgorithm, FilterConfig,
//! };
//!
//! let hpf = AudioFilter::new(FilterConfig::new(FilterAlgorithm::Hpf1, 200.0));
//! let comp = Dynamics::new(DynamicsConfig::compressor(-12.0, 4.0));
//!
//! let mut chain = hpf.chain(comp);
//! chain.reset(48000.0);
//! let y = chain.process_sample(0.25);
//! assert!(y.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod band_limit;
pub mod delay;
pub mod dynamics;
pub mod filter;
pub mod preamp;
pub mod reverb;
pub mod tape_delay;

pub use band_limit::{BandLimit, BandLimitConfig};
pub use delay::{DEFAULT_MAX_DELAY_MS, DelayMode, StereoDelay, StereoDelayConfig};
pub use dynamics::{Dynamics, DynamicsConfig, DynamicsMode};
pub use filter::{AudioFilter, FilterAlgorithm, FilterConfig};
pub use preamp::{TubePreamp, TubePreampConfig};
pub use reverb::{MAX_PRE_DELAY_MS, MAX_TANK_MS, ReverbDensity, ReverbTank, ReverbTankConfig};
pub use tape_delay::{TAPE_LOOP_MS, TapeDelay, TapeDelayConfig};
