//! Topology discovery and the factory hosts use to build processors.

use core::fmt;

use echoform_core::{ParamDescriptor, PresetSnapshot};

use crate::lifecycle::{PluginKind, Processor};
use crate::processor::{Topology, TopologyProcessor};
use crate::topologies::{AutoPan, ChannelStrip, TapeEcho, TestTone};

/// Every built-in topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// LFO auto-panner.
    AutoPan,
    /// Modulated tape echo.
    TapeEcho,
    /// Vocal channel strip.
    ChannelStrip,
    /// Test-tone generator.
    TestTone,
}

impl TopologyKind {
    /// All kinds in registry order.
    pub const ALL: [TopologyKind; 4] = [
        TopologyKind::AutoPan,
        TopologyKind::TapeEcho,
        TopologyKind::ChannelStrip,
        TopologyKind::TestTone,
    ];

    /// Registry name, e.g. `"tape_echo"`.
    pub const fn name(self) -> &'static str {
        match self {
            TopologyKind::AutoPan => AutoPan::NAME,
            TopologyKind::TapeEcho => TapeEcho::NAME,
            TopologyKind::ChannelStrip => ChannelStrip::NAME,
            TopologyKind::TestTone => TestTone::NAME,
        }
    }

    /// Look a kind up by name. Dashes and underscores are interchangeable
    /// and case is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
    }

    /// Metadata without building a processor.
    pub fn info(self) -> TopologyInfo {
        match self {
            TopologyKind::AutoPan => TopologyInfo::of::<AutoPan>(),
            TopologyKind::TapeEcho => TopologyInfo::of::<TapeEcho>(),
            TopologyKind::ChannelStrip => TopologyInfo::of::<ChannelStrip>(),
            TopologyKind::TestTone => TopologyInfo::of::<TestTone>(),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes a topology in the registry.
#[derive(Debug, Clone, Copy)]
pub struct TopologyInfo {
    /// Registry name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Effect or generator.
    pub kind: PluginKind,
    /// Parameter declarations in slot order.
    pub descriptors: &'static [ParamDescriptor],
    /// Factory presets.
    pub presets: &'static [PresetSnapshot],
}

impl TopologyInfo {
    fn of<T: Topology>() -> Self {
        Self {
            name: T::NAME,
            description: T::DESCRIPTION,
            kind: T::KIND,
            descriptors: T::descriptors(),
            presets: T::presets(),
        }
    }

    /// Number of parameters.
    pub fn param_count(&self) -> usize {
        self.descriptors.len()
    }
}

/// Build a processor for `kind` in [`ProcessorState::Created`](crate::ProcessorState::Created).
pub fn create_processor(kind: TopologyKind) -> Box<dyn Processor + Send> {
    match kind {
        TopologyKind::AutoPan => Box::new(TopologyProcessor::<AutoPan>::new()),
        TopologyKind::TapeEcho => Box::new(TopologyProcessor::<TapeEcho>::new()),
        TopologyKind::ChannelStrip => Box::new(TopologyProcessor::<ChannelStrip>::new()),
        TopologyKind::TestTone => Box::new(TopologyProcessor::<TestTone>::new()),
    }
}

/// Metadata for every built-in topology, in registry order.
pub fn topology_info() -> Vec<TopologyInfo> {
    TopologyKind::ALL.into_iter().map(TopologyKind::info).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ProcessorState;

    #[test]
    fn names_round_trip() {
        for kind in TopologyKind::ALL {
            assert_eq!(TopologyKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(TopologyKind::from_name("Tape-Echo"), Some(TopologyKind::TapeEcho));
        assert_eq!(TopologyKind::from_name("flanger"), None);
    }

    #[test]
    fn info_lists_every_topology() {
        let info = topology_info();
        assert_eq!(info.len(), 4);
        let strip = info.iter().find(|i| i.name == "channel_strip").unwrap();
        assert_eq!(strip.kind, PluginKind::Effect);
        assert_eq!(strip.param_count(), 35);
        let tone = info.iter().find(|i| i.name == "test_tone").unwrap();
        assert_eq!(tone.kind, PluginKind::Generator);
    }

    #[test]
    fn every_preset_is_complete() {
        for info in topology_info() {
            assert!(!info.presets.is_empty(), "{} has no presets", info.name);
            for preset in info.presets {
                assert_eq!(preset.values.len(), info.param_count(), "{}", preset.name);
                for descriptor in info.descriptors {
                    assert!(
                        preset.values.iter().any(|&(id, _)| id == descriptor.id),
                        "{}/{} misses {}",
                        info.name,
                        preset.name,
                        descriptor.string_id
                    );
                }
            }
        }
    }

    #[test]
    fn ids_are_unique() {
        for info in topology_info() {
            for (i, a) in info.descriptors.iter().enumerate() {
                for b in &info.descriptors[i + 1..] {
                    assert_ne!(a.id, b.id, "{}: duplicate id", info.name);
                    assert_ne!(a.string_id, b.string_id, "{}: duplicate string id", info.name);
                }
            }
        }
    }

    #[test]
    fn created_processors_start_fresh() {
        for kind in TopologyKind::ALL {
            let processor = create_processor(kind);
            assert_eq!(processor.name(), kind.name());
            assert_eq!(processor.state(), ProcessorState::Created);
            assert_eq!(processor.kind(), kind.info().kind);
        }
    }
}
