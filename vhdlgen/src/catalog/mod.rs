//! Component catalog: libraries of immutable component templates.
//!
//! A [`Catalog`] is the read-only lookup the generator and the circuit
//! loader resolve `library:component` references against. Each library
//! carries a [`SourceType`] that decides how its components are resolved:
//! anything other than [`SourceType::Hdl`] is opaque to the simulator, so
//! instances of those components surface their pins as module ports.

pub mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::core::HdlError;

/// Access mode of a pin, seen from the component's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Input,
    Output,
    Bidirectional,
}

/// Active level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveLevel {
    High,
    Low,
}

impl Default for ActiveLevel {
    fn default() -> Self {
        ActiveLevel::High
    }
}

/// Which side of the component body a pin is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Left
    }
}

/// Origin of the signals described by a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Free signals, resolved at editor level.
    Free,
    /// Resolved by an external plugin library.
    Plugin,
    /// Resolved by the HDL simulator itself.
    Hdl,
}

/// Description of one template pin: name, access mode, drawing hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinDescription {
    pub name: String,
    pub access: AccessMode,
    #[serde(default)]
    pub level: ActiveLevel,
    #[serde(default)]
    pub alignment: Alignment,
    /// Relative position along the component edge; -1.0 means auto-placed.
    #[serde(default = "default_position")]
    pub position: f64,
}

fn default_position() -> f64 {
    -1.0
}

/// Immutable catalog entry a device instantiates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentTemplate {
    pub name: String,
    pub pins: Vec<PinDescription>,
    /// Source type inherited from the owning library.
    #[serde(default = "default_source")]
    pub source: SourceType,
}

fn default_source() -> SourceType {
    SourceType::Hdl
}

impl ComponentTemplate {
    /// Whether instances of this template are resolved outside the HDL
    /// simulator, making their pins part of the module interface.
    pub fn is_extern_solving(&self) -> bool {
        self.source != SourceType::Hdl
    }
}

/// A named group of component templates sharing one source type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: u32,
    pub source: SourceType,
    /// For HDL libraries, the folder the simulator compiles sources from.
    #[serde(default)]
    pub source_origin: Option<String>,
    #[serde(deserialize_with = "deserialize_templates", serialize_with = "serialize_templates")]
    pub components: Vec<Arc<ComponentTemplate>>,
}

fn deserialize_templates<'de, D>(deserializer: D) -> Result<Vec<Arc<ComponentTemplate>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let templates = Vec::<ComponentTemplate>::deserialize(deserializer)?;
    Ok(templates.into_iter().map(Arc::new).collect())
}

fn serialize_templates<S>(
    templates: &[Arc<ComponentTemplate>],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(templates.iter().map(|t| t.as_ref()))
}

impl Library {
    pub fn find(&self, component: &str) -> Option<&Arc<ComponentTemplate>> {
        self.components.iter().find(|c| c.name == component)
    }
}

/// Read-only lookup of component templates across loaded libraries.
///
/// Qualified names are `library:component`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    libraries: Vec<Library>,
    index: HashMap<String, Arc<ComponentTemplate>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the embedded IO-pad and gate libraries.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for library in builtin::builtin_libraries() {
            catalog.add_library(library);
        }
        catalog
    }

    /// Add a library, stamping each template with the library source type
    /// and indexing it under `library:component`.
    pub fn add_library(&mut self, mut library: Library) {
        library.components = library
            .components
            .iter()
            .map(|template| {
                if template.source == library.source {
                    Arc::clone(template)
                } else {
                    Arc::new(ComponentTemplate {
                        source: library.source,
                        ..(**template).clone()
                    })
                }
            })
            .collect();

        for template in &library.components {
            let qualified = format!("{}:{}", library.name, template.name);
            self.index.insert(qualified, Arc::clone(template));
        }
        self.libraries.push(library);
    }

    /// Look up a template by qualified `library:component` name.
    pub fn find(&self, qualified: &str) -> Option<&Arc<ComponentTemplate>> {
        self.index.get(qualified)
    }

    /// Look up a template inside a specific library.
    pub fn find_in(&self, library: &str, component: &str) -> Option<&Arc<ComponentTemplate>> {
        self.libraries
            .iter()
            .find(|l| l.name == library)
            .and_then(|l| l.find(component))
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// Load a library from a JSON string and add it to the catalog.
    pub fn add_library_json(&mut self, json: &str) -> Result<(), HdlError> {
        let library: Library =
            serde_json::from_str(json).map_err(|e| HdlError::Parse(e.to_string()))?;
        self.add_library(library);
        Ok(())
    }

    /// Load a library from a JSON file and add it to the catalog.
    pub fn add_library_file(&mut self, path: &Path) -> Result<(), HdlError> {
        let json = std::fs::read_to_string(path)?;
        self.add_library_json(&json)
    }
}
