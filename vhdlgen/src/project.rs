//! Circuit description files.
//!
//! A compact JSON interchange format for circuits, used by the CLI and
//! tests. Devices reference catalog templates by qualified
//! `library:component` name; wire ends and point links reference pins as
//! `device.pin` endpoints.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::core::{Document, HdlError};
use crate::graph::{CircuitGraph, ItemId, WireEnd};

/// A device entry: instance name plus qualified template name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub component: String,
}

/// A wire entry. Either end may be absent (left unconnected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEntry {
    pub name: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// On-disk circuit description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitFile {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    /// Extra component library files, relative to this file.
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub wires: Vec<WireEntry>,
    /// Direct point-to-point links between pin connection points
    /// (duplicate mirroring).
    #[serde(default)]
    pub links: Vec<(String, String)>,
}

impl CircuitFile {
    pub fn from_json(json: &str) -> Result<Self, HdlError> {
        serde_json::from_str(json).map_err(|e| HdlError::Parse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, HdlError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build the connectivity graph this file describes, resolving every
    /// component reference against `catalog`.
    pub fn build_graph(&self, catalog: &Catalog) -> Result<CircuitGraph, HdlError> {
        let mut graph = CircuitGraph::new();

        for entry in &self.devices {
            let template = catalog
                .find(&entry.component)
                .ok_or_else(|| HdlError::UnknownComponent(entry.component.clone()))?;
            graph.add_device(&entry.name, template);
        }

        for entry in &self.wires {
            let wire = graph.add_wire(&entry.name);
            if let Some(from) = &entry.from {
                let point = endpoint_connection(&graph, from)?;
                graph.connect_wire(wire, WireEnd::Left, point);
            }
            if let Some(to) = &entry.to {
                let point = endpoint_connection(&graph, to)?;
                graph.connect_wire(wire, WireEnd::Right, point);
            }
        }

        for (a, b) in &self.links {
            let pa = endpoint_connection(&graph, a)?;
            let pb = endpoint_connection(&graph, b)?;
            graph.link_points(pa, pb);
        }

        Ok(graph)
    }
}

/// Resolve a `device.pin` endpoint to the pin's connection point.
fn endpoint_connection(graph: &CircuitGraph, endpoint: &str) -> Result<ItemId, HdlError> {
    let unknown = || HdlError::UnknownEndpoint(endpoint.to_string());

    let (device_name, pin_name) = endpoint.rsplit_once('.').ok_or_else(unknown)?;
    let device = graph.find_device(device_name).ok_or_else(unknown)?;
    let pin = graph.pin_named(device, pin_name).ok_or_else(unknown)?;
    graph.connection_point_of(pin).ok_or_else(unknown)
}

/// Load a circuit file into a ready-to-generate [`Document`].
///
/// Library files referenced by the circuit are loaded on top of `catalog`,
/// resolved relative to the circuit file's directory.
pub fn load_document(path: &Path, catalog: &Catalog) -> Result<Document, HdlError> {
    let file = CircuitFile::from_path(path)?;
    let graph = if file.libraries.is_empty() {
        file.build_graph(catalog)?
    } else {
        let mut extended = catalog.clone();
        let base = path.parent().unwrap_or(Path::new("."));
        for library in &file.libraries {
            extended.add_library_file(&base.join(library))?;
        }
        file.build_graph(&extended)?
    };
    tracing::debug!(
        "loaded circuit '{}': {} devices, {} wires",
        file.name,
        graph.device_count(),
        graph.wire_count()
    );
    Ok(Document::with_circuit(file.name, graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSTHROUGH: &str = r#"{
        "name": "passthrough",
        "devices": [
            { "name": "A0", "component": "io:input" },
            { "name": "Y0", "component": "io:output" }
        ],
        "wires": [
            { "name": "w", "from": "A0.O", "to": "Y0.I" }
        ]
    }"#;

    #[test]
    fn test_build_graph() {
        let catalog = Catalog::builtin();
        let file = CircuitFile::from_json(PASSTHROUGH).unwrap();
        let graph = file.build_graph(&catalog).unwrap();

        assert_eq!(graph.device_count(), 2);
        assert_eq!(graph.wire_count(), 1);

        let wire = graph.find_wire("w").unwrap();
        assert!(graph.wire_left(wire).is_some());
        assert!(graph.wire_right(wire).is_some());
    }

    #[test]
    fn test_unknown_component_is_reported() {
        let catalog = Catalog::builtin();
        let file = CircuitFile::from_json(
            r#"{ "name": "x", "devices": [ { "name": "U1", "component": "io:nonsense" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            file.build_graph(&catalog),
            Err(HdlError::UnknownComponent(c)) if c == "io:nonsense"
        ));
    }

    #[test]
    fn test_unknown_endpoint_is_reported() {
        let catalog = Catalog::builtin();
        let file = CircuitFile::from_json(
            r#"{
                "name": "x",
                "devices": [ { "name": "A0", "component": "io:input" } ],
                "wires": [ { "name": "w", "from": "A0.O", "to": "B0.I" } ]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            file.build_graph(&catalog),
            Err(HdlError::UnknownEndpoint(e)) if e == "B0.I"
        ));
    }

    #[test]
    fn test_referenced_libraries_extend_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("misc.json"),
            r#"{
                "name": "misc",
                "source": "plugin",
                "components": [
                    { "name": "probe", "pins": [ { "name": "P", "access": "input" } ] }
                ]
            }"#,
        )
        .unwrap();
        let circuit = dir.path().join("probe.json");
        std::fs::write(
            &circuit,
            r#"{
                "name": "probe_only",
                "libraries": ["misc.json"],
                "devices": [ { "name": "P0", "component": "misc:probe" } ]
            }"#,
        )
        .unwrap();

        let catalog = Catalog::builtin();
        let document = load_document(&circuit, &catalog).unwrap();
        assert_eq!(document.circuit().unwrap().device_count(), 1);
    }

    #[test]
    fn test_dangling_wire_end_is_allowed() {
        let catalog = Catalog::builtin();
        let file = CircuitFile::from_json(
            r#"{
                "name": "x",
                "devices": [ { "name": "A0", "component": "io:input" } ],
                "wires": [ { "name": "w", "from": "A0.O" } ]
            }"#,
        )
        .unwrap();
        let graph = file.build_graph(&catalog).unwrap();
        let wire = graph.find_wire("w").unwrap();
        assert!(graph.wire_right(wire).is_none());
    }
}
