//! Echoform Core - real-time control and stage primitives
//!
//! Everything a fixed-topology audio processor needs between the host's
//! automation and the samples it produces, designed for per-sample execution
//! with zero allocation once a stream is running.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Static declaration of a control: range, default, taper, unit
//! - [`ParameterStore`] - Bound values, block sync and per-sample smoothing
//! - [`ParamHandle`] - `Send + Sync` writer for the control thread
//! - [`PresetSnapshot`] - Complete, validated parameter sets
//! - [`ParamEnum`] - Decoding of stepped controls into closed enums
//!
//! ## Tempo and Modulation
//!
//! - [`milliseconds_for`] - Note division to milliseconds at a BPM
//! - [`TempoClock`] - Last valid host tempo and transport position
//! - [`Oscillator`] - Sine/triangle/saw modulation source with both polarities
//! - [`ModulationEngine`] - `N` summed oscillator voices
//! - [`DelayModulator`] - Wow/flutter delay-time modulation (three voices plus noise)
//!
//! ## Stages and Routing
//!
//! - [`EffectStage`] - `configure` / `reset` / `process_sample`, with a checked lifecycle
//! - [`StereoStage`] - Stages with linked channels
//! - [`Chain`], [`StereoPair`] - Serial and dual-mono composition
//! - [`select_branch`], [`ParallelMix`] - Mute selection and unnormalized parallel sums
//!
//! ## Building Blocks
//!
//! - [`DelayLine`] - Write-then-read circular buffer sized from milliseconds
//! - [`Biquad`] / [`Coefficients`] - RBJ and first-order filter sections
//! - [`EnvelopeDetector`] - Attack/release peak follower
//! - [`CombFilter`], [`AllpassFilter`] - Reverb loop elements
//! - [`OnePole`], [`WhiteNoise`], [`FilteredNoise`]
//!
//! # no_std Support
//!
//! The crate is `no_std` + `alloc`. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! echoform-core = { version = "0.1", default-features = false }
//! ```
//!
//! The optional `tracing` feature emits `debug!` events from control-path
//! calls such as [`ParameterStore::reset`] and [`DelayLine::allocate`].
//! Nothing on the per-sample path logs.
//!
//! # Example
//!
//! ```rust
//! use echoform_core::{ParamDescriptor, ParamId, ParameterStore, UpdateContext};
//!
//! static PARAMS: [ParamDescriptor; 1] = [
//!     ParamDescriptor::gain_db("Output", "Out", -24.0, 12.0, 0.0).with_id(ParamId(2), "out"),
//! ];
//!
//! let mut store = ParameterStore::new(&PARAMS);
//! store.reset(48000.0);
//! store.update_parameter(ParamId(2), 6.0, UpdateContext::Automation).unwrap();
//! store.sync_bound_variables();
//! assert_eq!(store.value(ParamId(2)), 6.0);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: allocation happens only in `reset`
//! - **Static composition**: topologies are concrete structs of concrete stages
//! - **Block-consistent control**: automation lands at block sync, never mid-frame
//! - **`libm` everywhere**: identical math with and without `std`

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod comb;
pub mod delay;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod lfo;
pub mod math;
pub mod modulation;
pub mod noise;
pub mod one_pole;
pub mod param;
pub mod param_info;
pub mod param_store;
pub mod routing;
pub mod stage;
pub mod tempo;

// Re-export main types at crate root
pub use allpass::AllpassFilter;
pub use biquad::{Biquad, Coefficients};
pub use comb::CombFilter;
pub use delay::DelayLine;
pub use envelope::EnvelopeDetector;
pub use error::{ParamError, PresetError, TempoError};
pub use frame::{ChannelConfig, ChannelFormat, Frame};
pub use lfo::{FrequencySource, ModulationOutput, Oscillator, OscillatorWaveform, Polarity};
pub use math::{
    buffer_len_for, db_to_linear, flush_denormal, linear_to_db, ms_to_samples,
    percent_to_fraction, saturate,
};
pub use modulation::{
    DelayModulator, DelayModulatorConfig, EXCURSION_MS_PER_UNIT, ModulationEngine,
    ModulationVoice, VoiceConfig,
};
pub use noise::{FilteredNoise, WhiteNoise};
pub use one_pole::OnePole;
pub use param::{LinearRamp, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamEnum, ParamFlags, ParamId, ParamScale, ParamUnit};
pub use param_store::{Commit, ParamHandle, ParameterStore, PresetSnapshot, UpdateContext};
pub use routing::{ParallelMix, select_branch, select_frame};
pub use stage::{
    Chain, EffectStage, EffectStageExt, StageLifecycle, StageState, StereoPair, StereoStage,
};
pub use tempo::{NoteDivision, TempoClock, TransportInfo, milliseconds_for};
