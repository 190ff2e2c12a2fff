//! Multi-level BOM explosion.
//!
//! Traversal is depth-first over an explicit work list of frames, one frame
//! per material on the current path. Each frame carries the cumulative
//! multiplier for that path, so a material reached through several parents is
//! expanded once per path and every path contributes its own quantity.

use crate::aggregate::{Aggregator, RawRequirement};
use crate::error::ResolveError;
use crate::graph::{BomGraph, Component};
use crate::guard::CycleGuard;
use serde::{Deserialize, Serialize};

/// Limits applied to a single explosion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplosionOptions {
    /// Maximum number of edges expanded before failing with `BudgetExceeded`.
    pub budget: Option<usize>,
}

/// A demand for `planned_qty` units of `material`. Column names follow the
/// production order table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrder {
    #[serde(
        rename = "ProductionOrderID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub order_id: Option<String>,
    #[serde(rename = "MaterialNumber")]
    pub material: String,
    #[serde(rename = "PlannedQty")]
    pub planned_qty: i64,
}

impl ProductionOrder {
    pub fn new(material: impl Into<String>, planned_qty: i64) -> Self {
        Self {
            order_id: None,
            material: material.into(),
            planned_qty,
        }
    }
}

struct Frame<'g> {
    multiplier: u64,
    children: &'g [Component],
    next: usize,
}

/// Explodes materials against one immutable graph.
///
/// Holds no traversal state; every call owns its work list, ancestor chain
/// and accumulator, so one `Explosion` can serve many threads.
#[derive(Debug, Clone, Copy)]
pub struct Explosion<'g> {
    graph: &'g BomGraph,
    options: ExplosionOptions,
}

impl<'g> Explosion<'g> {
    pub fn new(graph: &'g BomGraph) -> Self {
        Self::with_options(graph, ExplosionOptions::default())
    }

    pub fn with_options(graph: &'g BomGraph, options: ExplosionOptions) -> Self {
        Self { graph, options }
    }

    /// Raw-material requirements for one unit of `root`, ascending by id.
    /// Empty when `root` itself is terminal.
    pub fn resolve(&self, root: &str) -> Result<Vec<RawRequirement>, ResolveError> {
        Ok(self.accumulate(root, 1)?.into_requirements())
    }

    /// Raw-material requirements for `quantity` units of `root`.
    pub fn resolve_quantity(
        &self,
        root: &str,
        quantity: i64,
    ) -> Result<Vec<RawRequirement>, ResolveError> {
        let multiplier = positive(quantity)?;
        Ok(self.accumulate(root, multiplier)?.into_requirements())
    }

    /// Combined requirements of an order book.
    ///
    /// Orders are exploded in parallel over the shared graph. If any order
    /// fails, the error of the earliest failing order (in input order) is
    /// returned and nothing else.
    pub fn resolve_orders(
        &self,
        orders: &[ProductionOrder],
    ) -> Result<Vec<RawRequirement>, ResolveError> {
        use rayon::prelude::*;

        let partials: Vec<Result<Aggregator, ResolveError>> = orders
            .par_iter()
            .map(|order| self.accumulate(&order.material, positive(order.planned_qty)?))
            .collect();

        let mut total = Aggregator::new();
        for partial in partials {
            total.merge(partial?)?;
        }
        tracing::debug!(orders = orders.len(), rows = total.len(), "order book exploded");
        Ok(total.into_requirements())
    }

    fn accumulate(&self, root: &str, multiplier: u64) -> Result<Aggregator, ResolveError> {
        if self.graph.is_empty() {
            return Err(ResolveError::EmptyGraph);
        }
        let root = self
            .graph
            .material(root)
            .ok_or_else(|| ResolveError::UnknownMaterial(root.to_string()))?;

        let mut totals = Aggregator::new();
        let mut guard = CycleGuard::new();
        let mut work: Vec<Frame<'g>> = Vec::new();
        let mut items = 0usize;

        guard.enter(&root.id)?;
        work.push(Frame {
            multiplier,
            children: self.graph.children_of(&root.id),
            next: 0,
        });

        while let Some(frame) = work.last_mut() {
            let children = frame.children;
            let Some(component) = children.get(frame.next) else {
                work.pop();
                guard.leave();
                continue;
            };
            frame.next += 1;
            let parent_multiplier = frame.multiplier;

            items += 1;
            if let Some(budget) = self.options.budget
                && items > budget
            {
                return Err(ResolveError::BudgetExceeded { budget });
            }

            let contribution = component
                .quantity
                .checked_mul(parent_multiplier)
                .ok_or_else(|| ResolveError::QuantityOverflow {
                    material: component.id.clone(),
                })?;

            let grandchildren = self.graph.children_of(&component.id);
            if grandchildren.is_empty() {
                totals.add(&component.id, contribution)?;
            } else {
                guard.enter(&component.id)?;
                work.push(Frame {
                    multiplier: contribution,
                    children: grandchildren,
                    next: 0,
                });
            }
        }

        tracing::debug!(
            root = %root.id,
            work_items = items,
            rows = totals.len(),
            "explosion finished"
        );
        Ok(totals)
    }
}

fn positive(quantity: i64) -> Result<u64, ResolveError> {
    u64::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(ResolveError::InvalidQuantity(quantity))
}
