//! Bill-of-materials graph store and multi-level explosion engine.
//!
//! Provides the immutable BOM graph ([`graph::BomGraph`]), iterative explosion
//! to raw-material requirements ([`explode::Explosion`]) with per-path cycle
//! detection, exact integer aggregation, snapshot replacement, and flat-table
//! loading.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod explode;
pub mod graph;
pub mod guard;
pub mod storage;
pub mod store;
