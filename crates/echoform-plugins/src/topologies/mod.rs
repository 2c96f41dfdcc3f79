//! The built-in topologies.
//!
//! Each module declares its parameter table, its factory presets and the
//! concrete struct of stages that [`Topology`](crate::Topology) drives.

pub mod auto_pan;
pub mod channel_strip;
pub mod tape_echo;
pub mod test_tone;

pub use auto_pan::AutoPan;
pub use channel_strip::ChannelStrip;
pub use tape_echo::TapeEcho;
pub use test_tone::TestTone;
