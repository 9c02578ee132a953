//! HDL generation pipeline.
//!
//! [`HdlGenerator`] owns the staleness cache protecting the four generation
//! stages: instance partitioning, net resolution, dependency collection and
//! text emission. The first three are cached; emitted text is recomputed
//! from them on every request. The owning document must call
//! [`HdlGenerator::mark_dirty`] after every graph mutation, or stale results
//! will silently be served.

pub mod emit;
pub mod resolver;

pub use resolver::{NetMaps, ResolveStats};

use indexmap::IndexMap;
use std::sync::Arc;

use crate::catalog::ComponentTemplate;
use crate::core::HdlError;
use crate::graph::{duplicate_index, CircuitGraph, ItemId};

/// Cache state of the generation pipeline.
///
/// The only transitions are invalidate-all (any state to `Dirty`) and a
/// single-stage promotion, so a stage can never be valid while one to its
/// left is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheState {
    Dirty,
    Instances,
    Nets,
    Dependencies,
}

impl CacheState {
    fn promote(self) -> CacheState {
        match self {
            CacheState::Dirty => CacheState::Instances,
            CacheState::Instances => CacheState::Nets,
            CacheState::Nets | CacheState::Dependencies => CacheState::Dependencies,
        }
    }
}

/// Generates structural VHDL and the signal descriptor from a circuit graph.
///
/// One generator per document. All operations take the graph explicitly and
/// never mutate it.
#[derive(Debug)]
pub struct HdlGenerator {
    state: CacheState,
    external_instances: Vec<ItemId>,
    internal_instances: Vec<ItemId>,
    nets: NetMaps,
    ports: Vec<ItemId>,
    dependencies: Vec<Arc<ComponentTemplate>>,
    /// Cumulative connection-point visits, for traversal-count assertions.
    traversed_points: u64,
}

impl Default for HdlGenerator {
    fn default() -> Self {
        Self {
            state: CacheState::Dirty,
            external_instances: Vec::new(),
            internal_instances: Vec::new(),
            nets: NetMaps::default(),
            ports: Vec::new(),
            dependencies: Vec::new(),
            traversed_points: 0,
        }
    }
}

impl HdlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache(&self) -> CacheState {
        self.state
    }

    /// Invalidate every cached stage. Must be called after any graph change.
    pub fn mark_dirty(&mut self) {
        self.state = CacheState::Dirty;
        self.external_instances.clear();
        self.internal_instances.clear();
        self.nets = NetMaps::default();
        self.ports.clear();
        self.dependencies.clear();
    }

    /// Partition devices into external/internal instance lists, skipping
    /// duplicate-index devices. No-op when the cache is current.
    pub fn ensure_instances(&mut self, graph: &CircuitGraph) {
        if self.cache() >= CacheState::Instances {
            return;
        }

        self.external_instances.clear();
        self.internal_instances.clear();

        for device in graph.devices() {
            let Some(d) = graph.device(device) else {
                continue;
            };
            // Duplicates mirror an original's connectivity; only the
            // original seeds resolution.
            if duplicate_index(&d.name).is_some() {
                continue;
            }
            if d.is_extern_solving() {
                self.external_instances.push(device);
            } else {
                self.internal_instances.push(device);
            }
        }

        self.state = self.state.promote();
        tracing::info!(
            "instance list generated: {} external, {} internal",
            self.external_instances.len(),
            self.internal_instances.len()
        );
    }

    /// Resolve nets and derive the external port list. No-op (cache hit)
    /// when current.
    pub fn ensure_nets(&mut self, graph: &CircuitGraph) {
        if self.cache() >= CacheState::Nets {
            tracing::debug!("resolving nets: using cache");
            return;
        }
        self.ensure_instances(graph);

        let (nets, stats) = resolver::resolve_nets(
            graph,
            &self.external_instances,
            &self.internal_instances,
        );
        self.nets = nets;
        self.traversed_points += stats.visited_points;

        // Port construction: one entry per external net, deduplicated by
        // representative pin identity.
        self.ports.clear();
        for &pin in self.nets.external.values() {
            if !self.ports.contains(&pin) {
                self.ports.push(pin);
            }
        }

        self.state = self.state.promote();
        tracing::info!(
            "nets resolved: {} ports on the component interface",
            self.ports.len()
        );
    }

    /// Collect the distinct templates instantiated by internal devices.
    /// No-op when current.
    pub fn ensure_dependencies(&mut self, graph: &CircuitGraph) {
        if self.cache() >= CacheState::Dependencies {
            tracing::debug!("collecting dependencies: using cache");
            return;
        }
        self.ensure_nets(graph);

        self.dependencies.clear();
        for &device in &self.internal_instances {
            let Some(d) = graph.device(device) else {
                continue;
            };
            if !self
                .dependencies
                .iter()
                .any(|t| Arc::ptr_eq(t, &d.template))
            {
                self.dependencies.push(Arc::clone(&d.template));
            }
        }

        self.state = self.state.promote();
        tracing::info!("dependencies collected: {}", self.dependencies.len());
    }

    /// Build the structural VHDL source for `entity`.
    ///
    /// Fails with [`HdlError::EmptyInterface`] when the design has no
    /// external signals to form a port list from.
    pub fn build_vhdl(&mut self, graph: &CircuitGraph, entity: &str) -> Result<String, HdlError> {
        self.ensure_dependencies(graph);

        if self.ports.is_empty() {
            return Err(HdlError::EmptyInterface);
        }

        let text = emit::emit_vhdl(
            graph,
            entity,
            &self.ports,
            &self.dependencies,
            &self.nets,
            &self.internal_instances,
        );
        tracing::info!("HDL file '{}.vhd' generated", entity);
        Ok(text)
    }

    /// Build the signal descriptor file for `entity`. Same empty-interface
    /// failure as [`Self::build_vhdl`].
    pub fn build_signals_file(
        &mut self,
        graph: &CircuitGraph,
        entity: &str,
    ) -> Result<String, HdlError> {
        self.ensure_nets(graph);

        if self.ports.is_empty() {
            return Err(HdlError::EmptyInterface);
        }

        let text = emit::emit_signals_file(graph, entity, &self.ports);
        tracing::info!("signal file '{}.sig' generated", entity);
        Ok(text)
    }

    /// The library components instantiated by the design.
    ///
    /// With `must_build` the dependency stage is refreshed through the
    /// cache first; otherwise the last cached value is returned as-is,
    /// possibly empty or out of date.
    pub fn component_dependencies(
        &mut self,
        graph: &CircuitGraph,
        must_build: bool,
    ) -> Vec<Arc<ComponentTemplate>> {
        if must_build {
            self.ensure_dependencies(graph);
        }
        self.dependencies.clone()
    }

    //////////////////////////////////////////////////////////////////////
    // Cached-artifact accessors
    //////////////////////////////////////////////////////////////////////

    pub fn cache_state(&self) -> CacheState {
        self.cache()
    }

    pub fn external_instances(&self) -> &[ItemId] {
        &self.external_instances
    }

    pub fn internal_instances(&self) -> &[ItemId] {
        &self.internal_instances
    }

    pub fn external_nets(&self) -> &IndexMap<String, ItemId> {
        &self.nets.external
    }

    pub fn internal_nets(&self) -> &IndexMap<String, ItemId> {
        &self.nets.internal
    }

    pub fn ports(&self) -> &[ItemId] {
        &self.ports
    }

    /// Cumulative connection-point visit count across resolution passes.
    pub fn traversed_points(&self) -> u64 {
        self.traversed_points
    }
}
