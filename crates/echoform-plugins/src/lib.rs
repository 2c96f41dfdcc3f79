//! Processors, topologies and the registry for echoform.
//!
//! This crate turns the stages in `echoform-effects` into complete
//! processors a host can drive: a lifecycle, per-frame channel negotiation,
//! automation and presets, and a registry for discovering and instantiating
//! topologies by name.
//!
//! # Features
//!
//! - **Topology Discovery**: List all built-in topologies with metadata
//! - **Factory**: Create a boxed [`Processor`] for any [`TopologyKind`]
//! - **Lifecycle**: `initialize → reset → (pre_process, process_frame × N, post_process)*`
//! - **Parameter Info**: Descriptors and factory presets for UI generation
//!
//! # Example
//!
//! ```rust
//! use echoform_core::{ParamId, TransportInfo, UpdateContext};
//! use echoform_plugins::{BlockInfo, FrameIo, NoMidiEvents, TopologyKind, create_processor};
//!
//! let mut processor = create_processor(TopologyKind::AutoPan);
//! processor.initialize().unwrap();
//! processor.reset(48000.0, 24).unwrap();
//!
//! // -6 dB output gain
//! processor
//!     .update_plugin_parameter(ParamId(2), -6.0, UpdateContext::Automation)
//!     .unwrap();
//!
//! let block = BlockInfo::new(0, 64);
//! let mut midi = NoMidiEvents;
//! processor.pre_process(&block).unwrap();
//! for n in 0..64 {
//!     let mut out = [0.0; 2];
//!     let mut io = FrameIo::new(&[1.0], &mut out, TransportInfo::default(), n, &mut midi);
//!     processor.process_frame(&mut io).unwrap();
//! }
//! let stats = processor.post_process(&block);
//! assert_eq!(stats.frames, 64);
//! ```
//!
//! # Topologies
//!
//! | Name | Kind | Chain |
//! |------|------|-------|
//! | `auto_pan` | effect | gain, LFO pan, gain |
//! | `tape_echo` | effect | modulated tape loop with limiter, saturation, hiss and hum |
//! | `channel_strip` | effect | preamp, gate, compressor, EQ, parallel delay and reverb |
//! | `test_tone` | generator | one oscillator voice |

pub mod error;
pub mod lifecycle;
pub mod processor;
pub mod registry;
pub mod topologies;

pub use error::ProcessError;
pub use lifecycle::{
    BlockInfo, BlockStats, FrameIo, MidiEventQueue, NoMidiEvents, PluginKind, Processor,
    ProcessorState, StreamFormat,
};
pub use processor::{Topology, TopologyProcessor};
pub use registry::{TopologyInfo, TopologyKind, create_processor, topology_info};
