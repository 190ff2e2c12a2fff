//! Merging of terminal contributions into a raw-material requirement table.

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One output row: total units of a raw material per the requested root quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequirement {
    #[serde(rename = "RawMaterial")]
    pub raw_material: String,
    #[serde(rename = "TotalQty")]
    pub total_qty: u64,
}

/// Exact-integer accumulator keyed by raw material id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregator {
    totals: BTreeMap<String, u64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one path's contribution. Overflow is an error, never a wrap.
    pub fn add(&mut self, material: &str, quantity: u64) -> Result<(), ResolveError> {
        match self.totals.get_mut(material) {
            Some(total) => {
                *total = total
                    .checked_add(quantity)
                    .ok_or_else(|| ResolveError::QuantityOverflow {
                        material: material.to_string(),
                    })?;
            }
            None => {
                self.totals.insert(material.to_string(), quantity);
            }
        }
        Ok(())
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: Aggregator) -> Result<(), ResolveError> {
        for (material, quantity) in other.totals {
            self.add(&material, quantity)?;
        }
        Ok(())
    }

    pub fn get(&self, material: &str) -> Option<u64> {
        self.totals.get(material).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Rows ascending by raw material id.
    pub fn into_requirements(self) -> Vec<RawRequirement> {
        self.totals
            .into_iter()
            .map(|(raw_material, total_qty)| RawRequirement {
                raw_material,
                total_qty,
            })
            .collect()
    }
}
