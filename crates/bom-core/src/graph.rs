//! Graph data model for bills of materials.
//!
//! [`BomGraph`] is built once from a material catalog and a flat edge list and
//! is read-only afterwards. Duplicate (parent, component) edges are summed and
//! every malformed row is reported, not just the first.

use crate::error::{EdgeDefect, LoadError, LoadProblem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Declared material type. Advisory only: terminality is decided by edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum MaterialType {
    /// Purchased raw material.
    Raw,
    /// Semi-finished good.
    Sfg,
    /// Finished good.
    Fg,
}

impl MaterialType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Sfg => "SFG",
            Self::Fg => "FG",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RAW" => Ok(Self::Raw),
            "SFG" => Ok(Self::Sfg),
            "FG" => Ok(Self::Fg),
            other => Err(format!("unknown material type: {}", other)),
        }
    }
}

impl TryFrom<String> for MaterialType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A catalog entry. Column names follow the material master table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "MaterialNumber")]
    pub id: String,
    #[serde(rename = "MaterialType", default)]
    pub material_type: Option<MaterialType>,
    #[serde(
        rename = "MaterialName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl Material {
    pub fn new(id: impl Into<String>, material_type: Option<MaterialType>) -> Self {
        Self {
            id: id.into(),
            material_type,
            name: None,
        }
    }
}

/// One row of the flat edge list: one unit of `parent` consumes `quantity`
/// units of `component`.
///
/// `quantity` is signed so that bad rows survive parsing and can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEdge {
    #[serde(rename = "ParentMaterial")]
    pub parent: String,
    #[serde(rename = "ComponentMaterial")]
    pub component: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

impl BomEdge {
    pub fn new(parent: impl Into<String>, component: impl Into<String>, quantity: i64) -> Self {
        Self {
            parent: parent.into(),
            component: component.into(),
            quantity,
        }
    }
}

/// A neighbour in the adjacency lists with its summed per-unit quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub id: String,
    pub quantity: u64,
}

/// A declared type that disagrees with the graph shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub id: String,
    pub declared: MaterialType,
    pub has_components: bool,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_components {
            write!(f, "{} is declared {} but has components", self.id, self.declared)
        } else {
            write!(f, "{} is declared {} but has no components", self.id, self.declared)
        }
    }
}

/// Aggregate statistics for a loaded graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMetadata {
    pub total_materials: usize,
    /// Distinct (parent, component) pairs after summing duplicates.
    pub total_edges: usize,
    /// Rows in the edge list as supplied.
    pub input_edges: usize,
    pub terminal_materials: usize,
    pub root_materials: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Immutable BOM graph: catalog plus forward and reverse adjacency.
#[derive(Debug, Clone)]
pub struct BomGraph {
    materials: BTreeMap<String, Material>,
    /// parent id → components, ordered by component id.
    children: HashMap<String, Vec<Component>>,
    /// component id → parents (as `Component { id: parent, .. }`), ordered by parent id.
    parents: HashMap<String, Vec<Component>>,
    metadata: GraphMetadata,
}

impl BomGraph {
    /// Build the graph, collecting every catalog and edge problem.
    pub fn load<E, M>(edges: E, materials: M) -> Result<Self, LoadError>
    where
        E: IntoIterator<Item = BomEdge>,
        M: IntoIterator<Item = Material>,
    {
        let mut problems = Vec::new();
        let catalog = build_catalog(materials, &mut problems);

        let mut summed: BTreeMap<(String, String), u64> = BTreeMap::new();
        let mut overflowed: HashSet<(String, String)> = HashSet::new();
        let mut input_edges = 0usize;

        for edge in edges {
            input_edges += 1;
            let mut defects = Vec::new();
            if !catalog.contains_key(&edge.parent) {
                defects.push(EdgeDefect::UnknownParent);
            }
            if !catalog.contains_key(&edge.component) {
                defects.push(EdgeDefect::UnknownComponent);
            }
            let quantity = u64::try_from(edge.quantity).ok().filter(|q| *q > 0);
            if quantity.is_none() {
                defects.push(EdgeDefect::NonPositiveQuantity(edge.quantity));
            }
            if edge.parent == edge.component {
                defects.push(EdgeDefect::SelfLoop);
            }

            let Some(quantity) = quantity.filter(|_| defects.is_empty()) else {
                problems.extend(defects.into_iter().map(|reason| LoadProblem::InvalidEdge {
                    parent: edge.parent.clone(),
                    component: edge.component.clone(),
                    reason,
                }));
                continue;
            };

            let key = (edge.parent, edge.component);
            let slot = summed.entry(key.clone()).or_insert(0);
            match slot.checked_add(quantity) {
                Some(total) => *slot = total,
                None => {
                    if overflowed.insert(key.clone()) {
                        problems.push(LoadProblem::InvalidEdge {
                            parent: key.0,
                            component: key.1,
                            reason: EdgeDefect::QuantityOverflow,
                        });
                    }
                }
            }
        }

        if !problems.is_empty() {
            return Err(LoadError::Invalid { problems });
        }

        // BTreeMap order is (parent, component), so both adjacency lists come
        // out sorted without a separate pass.
        let total_edges = summed.len();
        let mut children: HashMap<String, Vec<Component>> = HashMap::new();
        let mut parents: HashMap<String, Vec<Component>> = HashMap::new();
        for ((parent, component), quantity) in summed {
            parents.entry(component.clone()).or_default().push(Component {
                id: parent.clone(),
                quantity,
            });
            children.entry(parent).or_default().push(Component {
                id: component,
                quantity,
            });
        }

        let terminal_materials = catalog
            .keys()
            .filter(|id| !children.contains_key(*id))
            .count();
        let root_materials = catalog
            .keys()
            .filter(|id| children.contains_key(*id) && !parents.contains_key(*id))
            .count();

        let graph = Self {
            metadata: GraphMetadata {
                total_materials: catalog.len(),
                total_edges,
                input_edges,
                terminal_materials,
                root_materials,
                loaded_at: Utc::now(),
            },
            materials: catalog,
            children,
            parents,
        };

        for mismatch in graph.type_mismatches() {
            tracing::warn!("material type hint ignored: {}", mismatch);
        }
        tracing::debug!(
            materials = graph.metadata.total_materials,
            edges = graph.metadata.total_edges,
            input_edges,
            "BOM graph loaded"
        );

        Ok(graph)
    }

    /// Direct components of `id`, ordered by component id. Empty for terminal
    /// or unknown ids.
    pub fn children_of(&self, id: &str) -> &[Component] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Direct parents of `id` (where-used), ordered by parent id.
    pub fn parents_of(&self, id: &str) -> &[Component] {
        self.parents.get(id).map_or(&[], Vec::as_slice)
    }

    /// A material is terminal when it has no outgoing edges.
    pub fn is_terminal(&self, id: &str) -> bool {
        !self.children.contains_key(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.materials.contains_key(id)
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Catalog entries in id order.
    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Materials with components that are never themselves a component.
    pub fn roots(&self) -> Vec<&str> {
        self.materials
            .keys()
            .filter(|id| self.children.contains_key(*id) && !self.parents.contains_key(*id))
            .map(String::as_str)
            .collect()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Declared types that contradict the graph: a RAW with components, or an
    /// FG/SFG without any.
    pub fn type_mismatches(&self) -> Vec<TypeMismatch> {
        self.materials
            .values()
            .filter_map(|m| {
                let declared = m.material_type?;
                let has_components = !self.is_terminal(&m.id);
                let contradicts = match declared {
                    MaterialType::Raw => has_components,
                    MaterialType::Sfg | MaterialType::Fg => !has_components,
                };
                contradicts.then(|| TypeMismatch {
                    id: m.id.clone(),
                    declared,
                    has_components,
                })
            })
            .collect()
    }
}

fn build_catalog<M>(materials: M, problems: &mut Vec<LoadProblem>) -> BTreeMap<String, Material>
where
    M: IntoIterator<Item = Material>,
{
    let mut catalog: BTreeMap<String, Material> = BTreeMap::new();
    for material in materials {
        let Some(existing) = catalog.get_mut(&material.id) else {
            catalog.insert(material.id.clone(), material);
            continue;
        };
        match (existing.material_type, material.material_type) {
            (Some(first), Some(second)) if first != second => {
                problems.push(LoadProblem::ConflictingMaterial {
                    id: material.id,
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
            (None, Some(_)) => existing.material_type = material.material_type,
            _ => {}
        }
        if existing.name.is_none() {
            existing.name = material.name;
        }
    }
    catalog
}
