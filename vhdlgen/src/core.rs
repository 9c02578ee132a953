//! Core generation API shared by the CLI and embedding editors.
//!
//! A [`Document`] pairs a circuit graph with the generator that caches its
//! derived artifacts. Every mutable access to the circuit invalidates the
//! cache, so results can never be served stale as long as callers reach the
//! graph through the document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::ComponentTemplate;
use crate::generator::HdlGenerator;
use crate::graph::CircuitGraph;

#[derive(Debug, thiserror::Error)]
pub enum HdlError {
    /// Configuration error: nothing to generate from. Every pipeline stage
    /// short-circuits on it.
    #[error("cannot generate HDL: no data source has been attached")]
    NoDataSource,
    /// The resolved design exposes no external signals, so no component
    /// interface can be synthesized. Resolution itself still succeeds.
    #[error("no external signals: cannot create the component interface")]
    EmptyInterface,
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("unknown endpoint '{0}': expected 'device.pin' of an existing device")]
    UnknownEndpoint(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of one generation run.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub vhdl_path: PathBuf,
    pub signals_path: PathBuf,
    pub ports: usize,
    pub internal_signals: usize,
    pub dependencies: usize,
}

/// A design document: one circuit graph plus its generation cache.
#[derive(Debug, Default)]
pub struct Document {
    name: String,
    circuit: Option<CircuitGraph>,
    generator: HdlGenerator,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            circuit: None,
            generator: HdlGenerator::new(),
        }
    }

    pub fn with_circuit(name: impl Into<String>, circuit: CircuitGraph) -> Self {
        let mut document = Self::new(name);
        document.attach_circuit(circuit);
        document
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity name derived from the document name: non-identifier
    /// characters map to `_`, and a leading letter is enforced since VHDL
    /// identifiers are stricter than file names.
    pub fn entity_name(&self) -> String {
        let mut entity: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        if !entity.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
            entity.insert(0, 'e');
        }
        entity
    }

    /// Attach (or replace) the circuit this document generates from.
    pub fn attach_circuit(&mut self, circuit: CircuitGraph) {
        self.circuit = Some(circuit);
        self.generator.mark_dirty();
    }

    /// Read access to the circuit.
    pub fn circuit(&self) -> Result<&CircuitGraph, HdlError> {
        self.circuit.as_ref().ok_or(HdlError::NoDataSource)
    }

    /// Mutable access to the circuit. Any mutable access is assumed to
    /// change connectivity and invalidates the generation cache.
    pub fn circuit_mut(&mut self) -> Result<&mut CircuitGraph, HdlError> {
        self.generator.mark_dirty();
        self.circuit.as_mut().ok_or(HdlError::NoDataSource)
    }

    pub fn generator(&self) -> &HdlGenerator {
        &self.generator
    }

    /// Resolve the design through the cache without emitting anything.
    pub fn resolve(&mut self) -> Result<(), HdlError> {
        let circuit = self.circuit.as_ref().ok_or(HdlError::NoDataSource)?;
        self.generator.ensure_dependencies(circuit);
        Ok(())
    }

    /// Build the structural VHDL source for this document's entity.
    pub fn build_vhdl(&mut self) -> Result<String, HdlError> {
        let circuit = self.circuit.as_ref().ok_or(HdlError::NoDataSource)?;
        self.generator.build_vhdl(circuit, &self.entity_name())
    }

    /// Build the signal descriptor for this document's entity.
    pub fn build_signals_file(&mut self) -> Result<String, HdlError> {
        let circuit = self.circuit.as_ref().ok_or(HdlError::NoDataSource)?;
        self.generator
            .build_signals_file(circuit, &self.entity_name())
    }

    /// Library components instantiated by the design, for the build
    /// pipeline to resolve compilation order from.
    pub fn component_dependencies(
        &mut self,
        must_build: bool,
    ) -> Result<Vec<Arc<ComponentTemplate>>, HdlError> {
        let circuit = self.circuit.as_ref().ok_or(HdlError::NoDataSource)?;
        Ok(self.generator.component_dependencies(circuit, must_build))
    }

    /// Generate `<entity>.vhd` and `<entity>.sig` into `out_dir`.
    pub fn generate(&mut self, out_dir: &Path) -> Result<GenerateResult, HdlError> {
        let entity = self.entity_name();
        let vhdl = self.build_vhdl()?;
        let signals = self.build_signals_file()?;

        std::fs::create_dir_all(out_dir)?;
        let vhdl_path = out_dir.join(format!("{}.vhd", entity));
        let signals_path = out_dir.join(format!("{}.sig", entity));
        std::fs::write(&vhdl_path, vhdl)?;
        std::fs::write(&signals_path, signals)?;

        Ok(GenerateResult {
            vhdl_path,
            signals_path,
            ports: self.generator.ports().len(),
            internal_signals: self.generator.internal_nets().len(),
            dependencies: self.component_dependencies(false)?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_source_short_circuits_everything() {
        let mut document = Document::new("empty");
        assert!(matches!(document.resolve(), Err(HdlError::NoDataSource)));
        assert!(matches!(document.build_vhdl(), Err(HdlError::NoDataSource)));
        assert!(matches!(
            document.build_signals_file(),
            Err(HdlError::NoDataSource)
        ));
        assert!(matches!(
            document.component_dependencies(true),
            Err(HdlError::NoDataSource)
        ));
    }

    #[test]
    fn test_entity_name_sanitization() {
        assert_eq!(Document::new("half adder").entity_name(), "half_adder");
        assert_eq!(Document::new("4bit-alu").entity_name(), "e4bit_alu");
        assert_eq!(Document::new("alu").entity_name(), "alu");
    }

    #[test]
    fn test_empty_circuit_fails_with_empty_interface() {
        let mut document = Document::with_circuit("blank", CircuitGraph::new());
        assert!(matches!(
            document.build_vhdl(),
            Err(HdlError::EmptyInterface)
        ));
        // Resolution itself succeeds and is cached.
        assert!(document.resolve().is_ok());
    }
}
