//! Factory preset commands.
//!
//! Lists, shows and validates the presets each topology ships with.

use anyhow::bail;
use clap::{Args, Subcommand};
use echoform_plugins::{TopologyInfo, TopologyKind, topology_info};

use super::common::{find_topology, format_value};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List {
        /// Only this topology
        topology: Option<String>,
    },

    /// Show every value of a preset
    Show {
        /// Topology name
        topology: String,

        /// Preset name
        name: String,
    },

    /// Check that every preset covers every parameter within range
    Validate {
        /// Only this topology
        topology: Option<String>,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { topology } => {
            for info in selected(topology.as_deref())? {
                println!("{}:", info.name);
                for preset in info.presets {
                    println!("  {}", preset.name);
                }
            }
            Ok(())
        }
        PresetsCommand::Show { topology, name } => show(&topology, &name),
        PresetsCommand::Validate { topology } => validate(&selected(topology.as_deref())?),
    }
}

fn selected(topology: Option<&str>) -> anyhow::Result<Vec<TopologyInfo>> {
    match topology {
        Some(name) => Ok(vec![find_topology(name)?.info()]),
        None => Ok(topology_info()),
    }
}

fn show(topology: &str, name: &str) -> anyhow::Result<()> {
    let info = find_topology(topology)?.info();
    let Some(preset) = info
        .presets
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
    else {
        bail!(
            "Preset '{}' not found for {}. Use 'echoform presets list {}'.",
            name,
            info.name,
            info.name
        );
    };

    println!("{} / {}", info.name, preset.name);
    for &(id, value) in preset.values {
        match info.descriptors.iter().find(|d| d.id == id) {
            Some(descriptor) => println!(
                "  {:<12} {:<18} {}",
                descriptor.string_id,
                descriptor.name,
                format_value(descriptor, value)
            ),
            None => println!("  {:<12} {:<18} {}", id.0, "(unknown)", value),
        }
    }
    Ok(())
}

/// Problems found in one preset; empty when it is valid.
fn check(info: &TopologyInfo, preset: &echoform_core::PresetSnapshot) -> Vec<String> {
    let mut problems = Vec::new();

    let Some(kind) = TopologyKind::from_name(info.name) else {
        return vec![format!("unknown topology {}", info.name)];
    };
    let processor = echoform_plugins::create_processor(kind);
    if let Err(err) = processor.apply_preset(preset) {
        problems.push(err.to_string());
    }

    for &(id, value) in preset.values {
        if let Some(descriptor) = info.descriptors.iter().find(|d| d.id == id)
            && !(descriptor.min..=descriptor.max).contains(&value)
        {
            problems.push(format!(
                "{} = {} is outside {}..{}",
                descriptor.string_id, value, descriptor.min, descriptor.max
            ));
        }
    }
    problems
}

fn validate(infos: &[TopologyInfo]) -> anyhow::Result<()> {
    let mut failures = 0;
    for info in infos {
        for preset in info.presets {
            let problems = check(info, preset);
            if problems.is_empty() {
                println!("  ok      {} / {}", info.name, preset.name);
            } else {
                failures += 1;
                println!("  FAILED  {} / {}", info.name, preset.name);
                for problem in problems {
                    println!("          {problem}");
                }
            }
        }
    }
    if failures > 0 {
        bail!("{} preset(s) failed validation", failures);
    }
    println!("All presets valid.");
    Ok(())
}
