//! VHDLGen - structural VHDL generation from drawn circuit graphs
//!
//! This library turns a connectivity graph of components and wires (as
//! drawn in a circuit editor) into a structural VHDL module plus an
//! auxiliary signal-descriptor file: net resolution, external/internal
//! signal classification, library-dependency extraction, and source
//! emission, all protected by a multi-stage staleness cache.
//!
//! # Quick Start
//!
//! ```no_run
//! use vhdlgen::{Catalog, load_document};
//! use std::path::Path;
//!
//! let catalog = Catalog::builtin();
//! let mut document = load_document(Path::new("design.circuit.json"), &catalog).unwrap();
//!
//! let vhdl = document.build_vhdl().unwrap();
//! println!("{}", vhdl);
//! ```
//!
//! # Pipeline
//!
//! Data flows strictly downstream: graph -> instances -> nets ->
//! (dependencies, ports) -> emitted text. The first three stages are
//! cached per document and invalidated in one shot whenever the graph
//! changes; emission is recomputed on every request.

pub mod catalog;
pub mod core;
pub mod generator;
pub mod graph;
pub mod project;

// Re-export main types
pub use catalog::{AccessMode, Catalog, ComponentTemplate, Library, PinDescription, SourceType};
pub use core::{Document, GenerateResult, HdlError};
pub use generator::{CacheState, HdlGenerator, NetMaps};
pub use graph::{CircuitGraph, Item, ItemId, WireEnd};
pub use project::{load_document, CircuitFile};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AccessMode, CacheState, Catalog, CircuitFile, CircuitGraph, Document, GenerateResult,
        HdlError, HdlGenerator, WireEnd,
    };
    pub use crate::project::load_document;
}
