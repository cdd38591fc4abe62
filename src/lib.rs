//! Dynamic bond storage for particle simulations.
//!
//! A [`storage::BondTable`] keeps bonds in compacted dense arrays with stable
//! tags, and derives an owner-major adjacency table for width-limited compute
//! paths on demand.

pub mod config;
pub mod logging;
pub mod storage;
pub mod types;

pub use storage::{
    AdjacencyMirror, BondTable, MirrorBackend, ReorderObserver, Snapshot, TableOptions,
};
pub use types::{Bond, BondError, EntityId, Result, Tag, TypeId, NO_BOND};
