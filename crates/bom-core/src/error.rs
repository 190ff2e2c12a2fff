//! Error types for graph loading and BOM explosion.

/// Why a single edge was rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeDefect {
    /// The parent id is not in the material catalog.
    #[error("unknown parent material")]
    UnknownParent,
    /// The component id is not in the material catalog.
    #[error("unknown component material")]
    UnknownComponent,
    /// Quantity was zero or negative.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    /// Parent and component are the same material.
    #[error("material consumes itself")]
    SelfLoop,
    /// Summing duplicate (parent, component) edges overflowed.
    #[error("summed duplicate quantity overflows")]
    QuantityOverflow,
}

/// One problem found while loading a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadProblem {
    #[error("invalid edge {parent} -> {component}: {reason}")]
    InvalidEdge {
        parent: String,
        component: String,
        reason: EdgeDefect,
    },
    #[error("material {id} declared as both {first} and {second}")]
    ConflictingMaterial {
        id: String,
        first: String,
        second: String,
    },
}

/// Errors from [`crate::graph::BomGraph::load`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Every problem found in the input, in input order.
    #[error("{} problem(s) in BOM input; first: {}", problems.len(), first_problem(problems))]
    Invalid { problems: Vec<LoadProblem> },
}

impl LoadError {
    pub fn problems(&self) -> &[LoadProblem] {
        match self {
            Self::Invalid { problems } => problems,
        }
    }
}

fn first_problem(problems: &[LoadProblem]) -> String {
    problems
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Errors from a single explosion. No partial result accompanies any of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no BOM graph is loaded")]
    EmptyGraph,
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error("cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
    #[error("work budget of {budget} item(s) exceeded")]
    BudgetExceeded { budget: usize },
    #[error("requested quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("quantity overflow while accumulating {material}")]
    QuantityOverflow { material: String },
}

impl ResolveError {
    /// The id that closes the cycle, for `CycleDetected`.
    pub fn repeating_material(&self) -> Option<&str> {
        match self {
            Self::CycleDetected { path } => path.last().map(String::as_str),
            _ => None,
        }
    }
}
