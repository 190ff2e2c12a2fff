//! Shared holder for the current graph snapshot.
//!
//! Readers take an `Arc` to the snapshot and traverse it without holding the
//! lock. A refresh builds a new graph and swaps it in whole; in-flight
//! explosions keep reading the snapshot they started with.

use crate::aggregate::RawRequirement;
use crate::error::ResolveError;
use crate::explode::{Explosion, ExplosionOptions};
use crate::graph::BomGraph;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct BomStore {
    current: RwLock<Option<Arc<BomGraph>>>,
}

impl BomStore {
    /// An empty store. Explosions fail with `EmptyGraph` until a graph is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(graph: BomGraph) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(graph))),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<BomGraph>, ResolveError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ResolveError::EmptyGraph)
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Publish `graph` as the new snapshot, returning the previous one.
    pub fn replace(&self, graph: BomGraph) -> Option<Arc<BomGraph>> {
        let next = Arc::new(graph);
        let materials = next.metadata().total_materials;
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        tracing::info!(materials, "BOM graph snapshot replaced");
        previous
    }

    /// Explode `root` against the snapshot current at call time.
    pub fn resolve(
        &self,
        root: &str,
        options: ExplosionOptions,
    ) -> Result<Vec<RawRequirement>, ResolveError> {
        let graph = self.snapshot()?;
        Explosion::with_options(&graph, options).resolve(root)
    }
}
