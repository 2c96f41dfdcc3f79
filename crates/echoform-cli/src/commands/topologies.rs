//! Topology discovery command.

use clap::Args;
use echoform_plugins::topology_info;

use super::common::{find_topology, format_range, format_value};

#[derive(Args)]
pub struct TopologiesArgs {
    /// Show the parameters of one topology
    name: Option<String>,
}

pub fn run(args: TopologiesArgs) -> anyhow::Result<()> {
    match args.name {
        Some(name) => show(&name),
        None => {
            list();
            Ok(())
        }
    }
}

fn list() {
    println!("Available Topologies:\n");
    for info in topology_info() {
        println!(
            "  {:<15} {:<10} {:>3} params  {}",
            info.name,
            info.kind.name(),
            info.param_count(),
            info.description
        );
    }
    println!("\nUse 'echoform topologies <name>' for parameter details.");
}

fn show(name: &str) -> anyhow::Result<()> {
    let info = find_topology(name)?.info();

    println!("{} ({})", info.name, info.kind.name());
    println!("{}\n", info.description);
    println!("Parameters:");
    println!(
        "  {:>4}  {:<12} {:<18} {:<38} {}",
        "id", "key", "name", "range", "default"
    );
    for descriptor in info.descriptors {
        println!(
            "  {:>4}  {:<12} {:<18} {:<38} {}",
            descriptor.id.0,
            descriptor.string_id,
            descriptor.name,
            format_range(descriptor),
            format_value(descriptor, descriptor.default)
        );
    }

    let presets: Vec<_> = info.presets.iter().map(|p| p.name).collect();
    println!("\nPresets: {}", presets.join(", "));
    Ok(())
}
