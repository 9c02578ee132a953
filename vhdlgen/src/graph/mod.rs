//! Circuit connectivity graph.
//!
//! This module provides the arena-backed graph of drawn circuit items the
//! generator resolves nets over. Items (devices, pins, connection points,
//! wires) live in a petgraph [`StableDiGraph`] and are addressed by stable
//! [`ItemId`] handles, so visited sets and cached artifacts survive unrelated
//! insertions and removals.
//!
//! The generator only reads this graph; all mutation happens through the
//! build surface used by the editor, the circuit loader, and tests.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{AccessMode, ActiveLevel, ComponentTemplate};

/// Separator used when resolving qualified names for display.
pub const NAME_SEPARATOR: char = '.';
/// Separator used when resolving qualified names for HDL emission.
pub const HDL_SEPARATOR: char = '_';

/// Stable handle to a graph item.
pub type ItemId = NodeIndex;

/// Which end of a wire a connection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEnd {
    Left,
    Right,
}

/// A device instance placed on the canvas.
#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    pub template: Arc<ComponentTemplate>,
    /// Pin handles in template order.
    pins: Vec<ItemId>,
}

impl Device {
    /// Whether this device's behavior is opaque to the HDL simulator.
    pub fn is_extern_solving(&self) -> bool {
        self.template.is_extern_solving()
    }
}

/// A connection pin belonging to exactly one device.
#[derive(Debug, Clone)]
pub struct Pin {
    pub name: String,
    pub access: AccessMode,
    pub level: ActiveLevel,
    device: ItemId,
    connection: Option<ItemId>,
}

/// A fan-out node items attach to.
///
/// Connection points owned by a pin carry the pin as parent; free-standing
/// junctions (wire forks) have no parent.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPoint {
    parent: Option<ItemId>,
}

/// A two-terminal wire. Either end may be unconnected while editing.
#[derive(Debug, Clone)]
pub struct Wire {
    pub name: String,
    left: Option<ItemId>,
    right: Option<ItemId>,
}

/// A graph item of any kind.
#[derive(Debug, Clone)]
pub enum Item {
    Device(Device),
    Pin(Pin),
    ConnectionPoint(ConnectionPoint),
    Wire(Wire),
}

impl Item {
    pub fn is_device(&self) -> bool {
        matches!(self, Item::Device(_))
    }

    pub fn is_wire(&self) -> bool {
        matches!(self, Item::Wire(_))
    }

    pub fn is_connection_point(&self) -> bool {
        matches!(self, Item::ConnectionPoint(_))
    }

    pub fn as_device(&self) -> Option<&Device> {
        match self {
            Item::Device(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_pin(&self) -> Option<&Pin> {
        match self {
            Item::Pin(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> Option<&Wire> {
        match self {
            Item::Wire(w) => Some(w),
            _ => None,
        }
    }

    /// Local (unqualified) name of the item. Connection points are unnamed.
    pub fn name(&self) -> &str {
        match self {
            Item::Device(d) => &d.name,
            Item::Pin(p) => &p.name,
            Item::Wire(w) => &w.name,
            Item::ConnectionPoint(_) => "",
        }
    }
}

/// Connection edge between items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Connection point -> wire attached to it.
    Attached,
    /// Direct point-to-point link (duplicate mirroring). Stored in both
    /// directions, the relation is symmetric.
    Linked,
}

/// The connectivity graph of one canvas.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    graph: StableDiGraph<Item, Link>,
    device_names: HashMap<String, ItemId>,
    wire_names: HashMap<String, ItemId>,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    //////////////////////////////////////////////////////////////////////
    // Build surface (editor / loader side)
    //////////////////////////////////////////////////////////////////////

    /// Instantiate a device from a template. Pins and their connection
    /// points are created from the template's pin descriptions, in order.
    pub fn add_device(&mut self, name: &str, template: &Arc<ComponentTemplate>) -> ItemId {
        let device = self.graph.add_node(Item::Device(Device {
            name: name.to_string(),
            template: Arc::clone(template),
            pins: Vec::with_capacity(template.pins.len()),
        }));

        for description in &template.pins {
            let pin = self.graph.add_node(Item::Pin(Pin {
                name: description.name.clone(),
                access: description.access,
                level: description.level,
                device,
                connection: None,
            }));
            let point = self
                .graph
                .add_node(Item::ConnectionPoint(ConnectionPoint { parent: Some(pin) }));
            if let Some(Item::Pin(p)) = self.graph.node_weight_mut(pin) {
                p.connection = Some(point);
            }
            if let Some(Item::Device(d)) = self.graph.node_weight_mut(device) {
                d.pins.push(pin);
            }
        }

        self.device_names.insert(name.to_string(), device);
        device
    }

    /// Add a free-standing connection point (a wire fork).
    pub fn add_junction(&mut self) -> ItemId {
        self.graph
            .add_node(Item::ConnectionPoint(ConnectionPoint::default()))
    }

    /// Add a wire with both ends unconnected.
    pub fn add_wire(&mut self, name: &str) -> ItemId {
        let wire = self.graph.add_node(Item::Wire(Wire {
            name: name.to_string(),
            left: None,
            right: None,
        }));
        self.wire_names.insert(name.to_string(), wire);
        wire
    }

    /// Attach one end of a wire to a connection point, detaching it from
    /// whatever it was connected to before.
    pub fn connect_wire(&mut self, wire: ItemId, end: WireEnd, point: ItemId) {
        self.disconnect_wire(wire, end);
        if let Some(Item::Wire(w)) = self.graph.node_weight_mut(wire) {
            match end {
                WireEnd::Left => w.left = Some(point),
                WireEnd::Right => w.right = Some(point),
            }
        }
        if self.graph.find_edge(point, wire).is_none() {
            self.graph.add_edge(point, wire, Link::Attached);
        }
    }

    /// Detach one end of a wire.
    pub fn disconnect_wire(&mut self, wire: ItemId, end: WireEnd) {
        let old = match self.graph.node_weight_mut(wire) {
            Some(Item::Wire(w)) => match end {
                WireEnd::Left => w.left.take(),
                WireEnd::Right => w.right.take(),
            },
            _ => None,
        };
        if let Some(point) = old {
            // Only drop the edge if the other end is not on the same point.
            let still_attached = match self.graph.node_weight(wire) {
                Some(Item::Wire(w)) => w.left == Some(point) || w.right == Some(point),
                _ => false,
            };
            if !still_attached {
                if let Some(edge) = self.graph.find_edge(point, wire) {
                    self.graph.remove_edge(edge);
                }
            }
        }
    }

    /// Link two connection points directly (used when duplicating a device
    /// to mirror its connectivity without duplicating wires).
    pub fn link_points(&mut self, a: ItemId, b: ItemId) {
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, Link::Linked);
        }
        if self.graph.find_edge(b, a).is_none() {
            self.graph.add_edge(b, a, Link::Linked);
        }
    }

    /// Remove a wire, detaching both ends.
    pub fn remove_wire(&mut self, wire: ItemId) {
        if let Some(Item::Wire(w)) = self.graph.node_weight(wire) {
            let name = w.name.clone();
            self.wire_names.remove(&name);
            self.graph.remove_node(wire);
        }
    }

    /// Remove a device with its pins and their connection points. Wires
    /// attached to the removed points are left dangling (unconnected end).
    pub fn remove_device(&mut self, device: ItemId) {
        let Some(Item::Device(d)) = self.graph.node_weight(device) else {
            return;
        };
        let name = d.name.clone();
        let pins = d.pins.clone();

        for pin in pins {
            if let Some(point) = self.connection_point_of(pin) {
                // Clear dangling wire-end references before the node goes.
                let attached: Vec<ItemId> = self.attached_wires(point).collect();
                for wire in attached {
                    if let Some(Item::Wire(w)) = self.graph.node_weight_mut(wire) {
                        if w.left == Some(point) {
                            w.left = None;
                        }
                        if w.right == Some(point) {
                            w.right = None;
                        }
                    }
                }
                self.graph.remove_node(point);
            }
            self.graph.remove_node(pin);
        }
        self.graph.remove_node(device);
        self.device_names.remove(&name);
    }

    /// Rename a device. Renaming an original device also renames its
    /// duplicate family: `old(i)` becomes `new(i)`.
    pub fn rename_device(&mut self, old: &str, new: &str) -> bool {
        let Some(&device) = self.device_names.get(old) else {
            return false;
        };
        self.device_names.remove(old);
        if let Some(Item::Device(d)) = self.graph.node_weight_mut(device) {
            d.name = new.to_string();
        }
        self.device_names.insert(new.to_string(), device);

        if duplicate_index(old).is_none() {
            let family: Vec<(String, ItemId)> = self
                .device_names
                .iter()
                .filter(|(name, _)| base_name(name) == old && duplicate_index(name).is_some())
                .map(|(name, &id)| (name.clone(), id))
                .collect();
            for (name, id) in family {
                let index = duplicate_index(&name).unwrap_or(0);
                let renamed = format!("{}({})", new, index);
                self.device_names.remove(&name);
                if let Some(Item::Device(d)) = self.graph.node_weight_mut(id) {
                    d.name = renamed.clone();
                }
                self.device_names.insert(renamed, id);
            }
        }
        true
    }

    /// Rename a wire. Every wire of the same name is an alias of the same
    /// net by convention, but wires are registered individually, so this
    /// renames exactly one.
    pub fn rename_wire(&mut self, old: &str, new: &str) -> bool {
        let Some(&wire) = self.wire_names.get(old) else {
            return false;
        };
        self.wire_names.remove(old);
        if let Some(Item::Wire(w)) = self.graph.node_weight_mut(wire) {
            w.name = new.to_string();
        }
        self.wire_names.insert(new.to_string(), wire);
        true
    }

    //////////////////////////////////////////////////////////////////////
    // Read surface (resolver side)
    //////////////////////////////////////////////////////////////////////

    /// All item handles, in insertion order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.graph.node_indices()
    }

    /// All device handles, in insertion order.
    pub fn devices(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.graph
            .node_indices()
            .filter(|&id| self.graph[id].is_device())
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.graph[id]
    }

    pub fn device(&self, id: ItemId) -> Option<&Device> {
        self.graph.node_weight(id).and_then(Item::as_device)
    }

    pub fn pin(&self, id: ItemId) -> Option<&Pin> {
        self.graph.node_weight(id).and_then(Item::as_pin)
    }

    pub fn wire(&self, id: ItemId) -> Option<&Wire> {
        self.graph.node_weight(id).and_then(Item::as_wire)
    }

    /// Ordered pin handles of a device.
    pub fn pins(&self, device: ItemId) -> &[ItemId] {
        self.device(device).map(|d| d.pins.as_slice()).unwrap_or(&[])
    }

    /// Find a device's pin by name.
    pub fn pin_named(&self, device: ItemId, name: &str) -> Option<ItemId> {
        self.pins(device)
            .iter()
            .copied()
            .find(|&pin| self.pin(pin).map(|p| p.name == name).unwrap_or(false))
    }

    /// The connection point of a pin.
    pub fn connection_point_of(&self, pin: ItemId) -> Option<ItemId> {
        self.pin(pin).and_then(|p| p.connection)
    }

    /// Items directly attached to a connection point: wires with an end on
    /// it, and directly linked connection points.
    pub fn attached(&self, point: ItemId) -> impl Iterator<Item = ItemId> + '_ {
        self.graph
            .edges_directed(point, Direction::Outgoing)
            .map(|edge| edge.target())
    }

    /// Wires with an end attached to a connection point.
    pub fn attached_wires(&self, point: ItemId) -> impl Iterator<Item = ItemId> + '_ {
        self.graph
            .edges_directed(point, Direction::Outgoing)
            .filter(|edge| *edge.weight() == Link::Attached)
            .map(|edge| edge.target())
    }

    /// Connection points directly linked to a connection point.
    pub fn linked_points(&self, point: ItemId) -> impl Iterator<Item = ItemId> + '_ {
        self.graph
            .edges_directed(point, Direction::Outgoing)
            .filter(|edge| *edge.weight() == Link::Linked)
            .map(|edge| edge.target())
    }

    /// The connection point on the other end of a wire from `from`, if
    /// that end is connected.
    pub fn wire_opposite(&self, wire: ItemId, from: ItemId) -> Option<ItemId> {
        let w = self.wire(wire)?;
        if w.left == Some(from) {
            w.right
        } else {
            w.left
        }
    }

    pub fn wire_left(&self, wire: ItemId) -> Option<ItemId> {
        self.wire(wire).and_then(|w| w.left)
    }

    pub fn wire_right(&self, wire: ItemId) -> Option<ItemId> {
        self.wire(wire).and_then(|w| w.right)
    }

    /// Parent of an item in the ownership chain: pins belong to devices,
    /// pin connection points belong to pins. Devices, wires and free
    /// junctions are roots.
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        match self.graph.node_weight(id)? {
            Item::Pin(p) => Some(p.device),
            Item::ConnectionPoint(c) => c.parent,
            Item::Device(_) | Item::Wire(_) => None,
        }
    }

    /// Qualified name of an item: ancestor names joined root-first with
    /// `separator`, unnamed ancestors skipped.
    pub fn resolved_name(&self, id: ItemId, separator: char) -> String {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(item) = current {
            let name = self.graph[item].name();
            if !name.is_empty() {
                chain.push(name);
            }
            current = self.parent(item);
        }
        chain.reverse();
        let mut resolved = String::new();
        for (i, part) in chain.iter().enumerate() {
            if i > 0 {
                resolved.push(separator);
            }
            resolved.push_str(part);
        }
        resolved
    }

    pub fn find_device(&self, name: &str) -> Option<ItemId> {
        self.device_names.get(name).copied()
    }

    pub fn find_wire(&self, name: &str) -> Option<ItemId> {
        self.wire_names.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn device_count(&self) -> usize {
        self.device_names.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wire_names.len()
    }
}

/// Extract the duplicate index from a `Base(i)` device name.
///
/// Returns `None` for original (non-duplicate) names or malformed ones:
/// the name must end in `(i)` with a non-empty, all-digit index and contain
/// no other parentheses.
pub fn duplicate_index(name: &str) -> Option<u32> {
    let open = name.find('(')?;
    if !name.ends_with(')') || name.matches('(').count() != 1 || name.matches(')').count() != 1 {
        return None;
    }
    let digits = &name[open + 1..name.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Strip the duplicate index from a `Base(i)` name: `base_name("X(3)") == "X"`.
pub fn base_name(name: &str) -> &str {
    match name.find('(') {
        Some(open) => &name[..open],
        None => name,
    }
}
