//! Per-path cycle detection for BOM explosion.
//!
//! The guard tracks only the ancestors of the node currently being expanded.
//! A material reached again through a sibling branch (a diamond) is not an
//! ancestor and passes; a material reached again below itself is a cycle.

use crate::error::ResolveError;
use crate::graph::BomGraph;
use std::collections::HashSet;

/// Ancestor chain of the path being expanded.
#[derive(Debug, Default)]
pub struct CycleGuard<'g> {
    chain: Vec<&'g str>,
    on_chain: HashSet<&'g str>,
}

impl<'g> CycleGuard<'g> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `id` onto the chain, failing if it is already an ancestor.
    ///
    /// The reported path is the full chain from the root followed by the
    /// repeating id, e.g. `FG1 -> A -> B -> A`.
    pub fn enter(&mut self, id: &'g str) -> Result<(), ResolveError> {
        if self.on_chain.contains(id) {
            let mut path: Vec<String> = self.chain.iter().map(|s| (*s).to_string()).collect();
            path.push(id.to_string());
            return Err(ResolveError::CycleDetected { path });
        }
        self.chain.push(id);
        self.on_chain.insert(id);
        Ok(())
    }

    /// Pop the deepest ancestor once its subtree is exhausted.
    pub fn leave(&mut self) {
        if let Some(id) = self.chain.pop() {
            self.on_chain.remove(id);
        }
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn chain(&self) -> &[&'g str] {
        &self.chain
    }
}

/// Find cycles anywhere in `graph`, not only below one root.
///
/// Depth-first from every non-terminal material in id order; materials whose
/// subtree is already exhausted are not entered again. Each back edge found
/// yields one path in the same form as `CycleDetected`. An acyclic graph
/// yields nothing.
pub fn find_cycles(graph: &BomGraph) -> Vec<Vec<String>> {
    let mut finished: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for start in graph.materials() {
        let start = start.id.as_str();
        if finished.contains(start) || graph.is_terminal(start) {
            continue;
        }
        let mut guard = CycleGuard::new();
        if guard.enter(start).is_err() {
            continue;
        }
        let mut work: Vec<(&str, usize)> = vec![(start, 0)];

        while let Some(top) = work.last_mut() {
            let (node, next) = *top;
            let Some(child) = graph.children_of(node).get(next) else {
                finished.insert(node);
                work.pop();
                guard.leave();
                continue;
            };
            top.1 += 1;

            let child = child.id.as_str();
            if finished.contains(child) || graph.is_terminal(child) {
                continue;
            }
            match guard.enter(child) {
                Ok(()) => work.push((child, 0)),
                Err(ResolveError::CycleDetected { path }) => cycles.push(path),
                Err(_) => {}
            }
        }
    }

    if !cycles.is_empty() {
        tracing::debug!(cycles = cycles.len(), "BOM cycles found");
    }
    cycles
}
