use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking bond table mutations and mirror maintenance.
///
/// Implementations receive one callback per structural change and per mirror
/// request, which is enough to tell how often the expensive rebuild runs.
pub trait BondMetrics: Send + Sync {
    /// Records a bond appended to the table.
    fn bond_added(&self);

    /// Records a bond removed from the table.
    fn bond_removed(&self);

    /// Records a full mirror rebuild.
    ///
    /// # Parameters
    /// * `backend` - Name of the builder that ran: "host", "parallel", or the
    ///   name of a custom builder.
    fn mirror_rebuilt(&self, backend: &'static str);

    /// Records a mirror request served without rebuilding.
    fn mirror_reused(&self);

    /// Records an external reorder notification.
    fn reorder_notified(&self);
}

/// A no-op implementation of [`BondMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl BondMetrics for NoopMetrics {
    fn bond_added(&self) {}
    fn bond_removed(&self) {}
    fn mirror_rebuilt(&self, _backend: &'static str) {}
    fn mirror_reused(&self) {}
    fn reorder_notified(&self) {}
}

/// Atomic counter implementation of [`BondMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of bonds added.
    pub bonds_added: AtomicU64,

    /// Number of bonds removed.
    pub bonds_removed: AtomicU64,

    /// Rebuilds performed by the host scan builder.
    pub host_rebuilds: AtomicU64,

    /// Rebuilds performed by the parallel builder.
    pub parallel_rebuilds: AtomicU64,

    /// Rebuilds performed by any other installed builder.
    pub other_rebuilds: AtomicU64,

    /// Mirror requests answered from the existing build.
    pub mirror_reuses: AtomicU64,

    /// Reorder notifications received.
    pub reorders: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub bonds_added: u64,
    pub bonds_removed: u64,
    pub host_rebuilds: u64,
    pub parallel_rebuilds: u64,
    pub other_rebuilds: u64,
    pub mirror_reuses: u64,
    pub reorders: u64,
}

impl CounterSnapshot {
    pub fn rebuilds(&self) -> u64 {
        self.host_rebuilds + self.parallel_rebuilds + self.other_rebuilds
    }
}

impl CounterMetrics {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bonds_added: self.bonds_added.load(Ordering::Relaxed),
            bonds_removed: self.bonds_removed.load(Ordering::Relaxed),
            host_rebuilds: self.host_rebuilds.load(Ordering::Relaxed),
            parallel_rebuilds: self.parallel_rebuilds.load(Ordering::Relaxed),
            other_rebuilds: self.other_rebuilds.load(Ordering::Relaxed),
            mirror_reuses: self.mirror_reuses.load(Ordering::Relaxed),
            reorders: self.reorders.load(Ordering::Relaxed),
        }
    }
}

impl BondMetrics for CounterMetrics {
    fn bond_added(&self) {
        self.bonds_added.fetch_add(1, Ordering::Relaxed);
    }

    fn bond_removed(&self) {
        self.bonds_removed.fetch_add(1, Ordering::Relaxed);
    }

    fn mirror_rebuilt(&self, backend: &'static str) {
        match backend {
            "host" => {
                self.host_rebuilds.fetch_add(1, Ordering::Relaxed);
            }
            "parallel" => {
                self.parallel_rebuilds.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.other_rebuilds.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn mirror_reused(&self) {
        self.mirror_reuses.fetch_add(1, Ordering::Relaxed);
    }

    fn reorder_notified(&self) {
        self.reorders.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`], in an [`Arc`].
pub fn default_metrics() -> Arc<dyn BondMetrics> {
    Arc::new(NoopMetrics)
}
