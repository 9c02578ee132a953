//! Structural VHDL and signal-descriptor emission.
//!
//! Pure text rendering over the cached pipeline artifacts. Port directions
//! on the entity are the inversion of the pin access modes: the module must
//! produce what the drawn device pins consume, so a device Input pin
//! surfaces as an OUT port and vice versa. Component declarations keep the
//! template-native directions.

use std::sync::Arc;

use crate::catalog::{AccessMode, ComponentTemplate};
use crate::generator::NetMaps;
use crate::graph::{CircuitGraph, ItemId, HDL_SEPARATOR};

/// Entity port direction for a pin access mode (inverted).
fn port_direction(access: AccessMode) -> &'static str {
    match access {
        AccessMode::Input => "OUT",
        AccessMode::Output => "IN",
        AccessMode::Bidirectional => "INOUT",
    }
}

/// Component declaration direction for a pin access mode (native).
fn pin_direction(access: AccessMode) -> &'static str {
    match access {
        AccessMode::Input => "IN",
        AccessMode::Output => "OUT",
        AccessMode::Bidirectional => "INOUT",
    }
}

/// Render the structural VHDL source.
///
/// Section order: entity declaration, architecture declaration, component
/// declarations, signal declarations, instantiations.
pub(crate) fn emit_vhdl(
    graph: &CircuitGraph,
    entity: &str,
    ports: &[ItemId],
    dependencies: &[Arc<ComponentTemplate>],
    nets: &NetMaps,
    internal_instances: &[ItemId],
) -> String {
    let mut out = String::new();

    // ENTITY
    out.push_str(&format!("ENTITY {} IS\n", entity));
    let declarations: Vec<String> = ports
        .iter()
        .map(|&pin| {
            let name = graph.resolved_name(pin, HDL_SEPARATOR);
            let direction = graph
                .pin(pin)
                .map(|p| port_direction(p.access))
                .unwrap_or("INOUT");
            format!("{} : {} BIT", name, direction)
        })
        .collect();
    out.push_str(&format!("\tPORT( {});\n", declarations.join("; ")));
    out.push_str(&format!("END {};\n\n", entity));

    // ARCHITECTURE
    out.push_str(&format!("ARCHITECTURE structural OF {} IS\n", entity));

    // Required component declarations.
    for template in dependencies {
        out.push_str(&format!("\tCOMPONENT {}\n", template.name));
        let pins: Vec<String> = template
            .pins
            .iter()
            .map(|pin| format!("{} : {} BIT", pin.name, pin_direction(pin.access)))
            .collect();
        out.push_str(&format!("\t\tPORT( {});\n", pins.join("; ")));
        out.push_str("\tEND COMPONENT;\n");
    }
    out.push('\n');

    // Internal signal declarations: representative names in first-seen
    // order. The map is already name-deduplicated; adjacent duplicates of
    // the representative's own name are coalesced on top of that.
    if !nets.internal.is_empty() {
        let mut names = Vec::new();
        for &wire in nets.internal.values() {
            let name = graph.resolved_name(wire, HDL_SEPARATOR);
            if names.last() != Some(&name) {
                names.push(name);
            }
        }
        out.push_str(&format!("\tSIGNAL {}: BIT;\n\n", names.join(", ")));
    }

    // Instantiations.
    out.push_str("\tBEGIN\n");
    for &device in internal_instances {
        let Some(d) = graph.device(device) else {
            continue;
        };

        let mut connections = Vec::new();
        for &pin in graph.pins(device) {
            let Some(wire) = first_attached_wire(graph, pin) else {
                continue;
            };
            let wire_name = graph.resolved_name(wire, HDL_SEPARATOR);
            if let Some(mapped) = nets.mapped_name(graph, &wire_name) {
                connections.push(mapped);
            }
        }

        out.push_str(&format!(
            "\t\t{} : {} PORT MAP( {});\n\n",
            d.name,
            d.template.name,
            connections.join(", ")
        ));
    }

    out.push_str("END structural;\n");
    out
}

/// Render the signal descriptor consumed by the simulation-stimulus tool:
/// one element per port, with the same direction inversion as the entity.
pub(crate) fn emit_signals_file(graph: &CircuitGraph, entity: &str, ports: &[ItemId]) -> String {
    let mut out = String::new();

    out.push_str(&format!("<signals entity=\"{}\">\n\n", entity));
    for &pin in ports {
        let name = graph.resolved_name(pin, HDL_SEPARATOR);
        let direction = graph
            .pin(pin)
            .map(|p| port_direction(p.access))
            .unwrap_or("INOUT");
        out.push_str(&format!(
            "\t<signal accessMode=\"{}\">{}</signal>\n",
            direction, name
        ));
    }
    out.push_str("\n</signals>\n");
    out
}

/// First wire attached to a pin's connection point, if any.
fn first_attached_wire(graph: &CircuitGraph, pin: ItemId) -> Option<ItemId> {
    let point = graph.connection_point_of(pin)?;
    graph.attached_wires(point).next()
}
