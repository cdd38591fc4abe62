//! Bond storage: the dense table and everything derived from it.
//!
//! The [`BondTable`] owns the dense arrays and the tag index. The owner-major
//! [`AdjacencyMirror`] is rebuilt from it on demand by a [`MirrorBuilder`].

/// Bond type id to name mapping.
pub mod catalog;

/// Owner-major adjacency table and its builders.
pub mod mirror;

mod metrics;
mod options;
mod snapshot;
mod table;
mod tag_index;
mod tracker;

pub use catalog::TypeCatalog;
pub use metrics::{default_metrics, BondMetrics, CounterMetrics, CounterSnapshot, NoopMetrics};
pub use mirror::{
    builder_for, AdjacencyMirror, HostScanBuilder, MirrorBuilder, MirrorCell, MirrorInput,
    ParallelScanBuilder,
};
pub use options::{MirrorBackend, TableOptions};
pub use snapshot::Snapshot;
pub use table::BondTable;
pub use tag_index::TagIndex;
pub use tracker::{ChangeTracker, ReorderObserver};
