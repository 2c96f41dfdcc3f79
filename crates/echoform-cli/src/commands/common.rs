//! Shared CLI helpers used across multiple commands.

use echoform_core::{ParamDescriptor, ParamId, ParamScale};
use echoform_plugins::{TopologyKind, topology_info};

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!(
            "Invalid parameter format: '{}' (expected id=value)",
            s
        )),
    }
}

/// Look a topology up by name.
pub fn find_topology(name: &str) -> anyhow::Result<TopologyKind> {
    TopologyKind::from_name(name).ok_or_else(|| {
        let known: Vec<_> = topology_info().iter().map(|info| info.name).collect();
        anyhow::anyhow!(
            "Unknown topology '{}'. Available: {}",
            name,
            known.join(", ")
        )
    })
}

/// Resolve a parameter by numeric id or string id (case-insensitive).
pub fn find_param<'a>(
    descriptors: &'a [ParamDescriptor],
    key: &str,
) -> anyhow::Result<&'a ParamDescriptor> {
    let found = match key.parse::<u32>() {
        Ok(raw) => descriptors.iter().find(|d| d.id == ParamId(raw)),
        Err(_) => descriptors
            .iter()
            .find(|d| d.string_id.eq_ignore_ascii_case(key)),
    };
    found.ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown parameter '{}'. Use 'echoform topologies <name>' to list parameters.",
            key
        )
    })
}

/// Parse a parameter value. Stepped controls also accept their labels.
pub fn parse_value(descriptor: &ParamDescriptor, value: &str) -> anyhow::Result<f32> {
    if let Some(index) = descriptor
        .labels
        .iter()
        .position(|label| label.eq_ignore_ascii_case(value))
    {
        return Ok(index as f32);
    }
    value.parse::<f32>().map_err(|_| {
        anyhow::anyhow!(
            "Invalid value '{}' for {} ({})",
            value,
            descriptor.string_id,
            descriptor.name
        )
    })
}

/// Human-readable range column.
pub fn format_range(descriptor: &ParamDescriptor) -> String {
    if descriptor.is_stepped() && !descriptor.labels.is_empty() {
        return descriptor.labels.join(" | ");
    }
    let taper = if descriptor.scale == ParamScale::Logarithmic {
        " (log)"
    } else {
        ""
    };
    format!(
        "{}..{}{}{}",
        descriptor.min,
        descriptor.max,
        descriptor.unit.suffix(),
        taper
    )
}

/// Human-readable value with label or unit.
pub fn format_value(descriptor: &ParamDescriptor, value: f32) -> String {
    if descriptor.is_stepped()
        && let Some(label) = descriptor.labels.get(value.max(0.0).round() as usize)
    {
        return (*label).to_string();
    }
    format!("{}{}", value, descriptor.unit.suffix())
}
