//! Net resolution.
//!
//! Walks the connectivity graph outward from every pin of every
//! externally-resolved device, then from every pin of every internally
//! resolved device, producing the external and internal net maps. Net
//! identity is the wire's resolved name, so identically-named wires across
//! the canvas coalesce into one net by convention.

use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

use crate::graph::{CircuitGraph, ItemId, HDL_SEPARATOR};

/// Result of a resolution pass.
///
/// `external` maps net name to the representative pin of an opaque device;
/// `internal` maps net name to the representative wire the net was first
/// discovered through. Both preserve first-seen order.
#[derive(Debug, Clone, Default)]
pub struct NetMaps {
    pub external: IndexMap<String, ItemId>,
    pub internal: IndexMap<String, ItemId>,
}

impl NetMaps {
    pub fn is_empty(&self) -> bool {
        self.external.is_empty() && self.internal.is_empty()
    }

    /// Resolved name of the mapped entry for a wire name, checking the
    /// external map first.
    pub fn mapped_name(&self, graph: &CircuitGraph, wire_name: &str) -> Option<String> {
        if let Some(&pin) = self.external.get(wire_name) {
            return Some(graph.resolved_name(pin, HDL_SEPARATOR));
        }
        self.internal
            .get(wire_name)
            .map(|&wire| graph.resolved_name(wire, HDL_SEPARATOR))
    }
}

/// Traversal instrumentation, cumulative per resolution pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveStats {
    /// Connection points taken off the frontier.
    pub visited_points: u64,
}

/// Resolve all nets reachable from the given device partitions.
pub(crate) fn resolve_nets(
    graph: &CircuitGraph,
    external_devices: &[ItemId],
    internal_devices: &[ItemId],
) -> (NetMaps, ResolveStats) {
    let mut nets = NetMaps::default();
    let mut stats = ResolveStats::default();

    // External pass: every net touching an opaque device's pin is external,
    // represented by that pin.
    for &device in external_devices {
        for &pin in graph.pins(device) {
            let mut frontier = VecDeque::new();
            let mut seen = HashSet::new();

            // Seed with the pin's connection point and any points directly
            // linked to it (duplicate-mirroring edges).
            if let Some(point) = graph.connection_point_of(pin) {
                seen.insert(point);
                frontier.push_back(point);
                for linked in graph.linked_points(point) {
                    if seen.insert(linked) {
                        frontier.push_back(linked);
                    }
                }
            }

            while let Some(point) = frontier.pop_front() {
                stats.visited_points += 1;
                for wire in graph.attached_wires(point) {
                    let name = graph.resolved_name(wire, HDL_SEPARATOR);
                    nets.external.entry(name).or_insert(pin);

                    if let Some(opposite) = graph.wire_opposite(wire, point) {
                        if seen.insert(opposite) {
                            frontier.push_back(opposite);
                        }
                    }
                }
            }
        }
    }

    // Internal pass: identical traversal, but the representative is the
    // first wire encountered, and external classification wins.
    for &device in internal_devices {
        for &pin in graph.pins(device) {
            let mut representative: Option<ItemId> = None;
            let mut frontier = VecDeque::new();
            let mut seen = HashSet::new();

            if let Some(point) = graph.connection_point_of(pin) {
                seen.insert(point);
                frontier.push_back(point);
            }

            while let Some(point) = frontier.pop_front() {
                stats.visited_points += 1;
                for wire in graph.attached_wires(point) {
                    let name = graph.resolved_name(wire, HDL_SEPARATOR);
                    if nets.external.contains_key(&name) {
                        // Already mapped as external; stop scanning this
                        // point's remaining attachments. The frontier keeps
                        // draining, matching the historical behavior.
                        break;
                    }
                    let rep = *representative.get_or_insert(wire);
                    if !nets.internal.contains_key(&name) {
                        nets.internal.insert(name, rep);
                    }

                    if let Some(opposite) = graph.wire_opposite(wire, point) {
                        if seen.insert(opposite) {
                            frontier.push_back(opposite);
                        }
                    }
                }
            }
        }
    }

    tracing::debug!(
        "nets resolved: {} external, {} internal ({} points visited)",
        nets.external.len(),
        nets.internal.len(),
        stats.visited_points
    );

    (nets, stats)
}
