use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::metrics::BondMetrics;

/// Which builder produces the adjacency mirror.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorBackend {
    /// Sequential two-pass scan on the calling thread.
    #[default]
    Host,
    /// Rayon-parallel build producing the same table.
    Parallel,
}

impl MirrorBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            MirrorBackend::Host => "host",
            MirrorBackend::Parallel => "parallel",
        }
    }
}

impl FromStr for MirrorBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "host" => Ok(MirrorBackend::Host),
            "parallel" => Ok(MirrorBackend::Parallel),
            other => Err(format!("unknown mirror backend '{other}'")),
        }
    }
}

/// Configuration options supplied when creating a [`super::BondTable`].
#[derive(Clone)]
pub struct TableOptions {
    /// Number of bond types; fixed for the table's lifetime
    pub n_types: u32,
    /// Number of entities in the simulation; when non-zero, entity ids must be
    /// below it and it is the mirror width
    pub entity_count: u32,
    /// Builder used for the adjacency mirror
    pub mirror_backend: MirrorBackend,
    /// Initial bond capacity to reserve
    pub capacity: usize,
    /// Whether to run a full consistency check after every mutation
    pub check_invariants: bool,
    /// Type names installed at construction
    pub type_names: Option<Vec<String>>,
    /// Optional metrics collection implementation
    pub metrics: Option<Arc<dyn BondMetrics>>,
}

impl TableOptions {
    /// Creates options for `n_types` bond types with default settings.
    pub fn new(n_types: u32) -> Self {
        Self {
            n_types,
            entity_count: 0,
            mirror_backend: MirrorBackend::Host,
            capacity: 0,
            check_invariants: false,
            type_names: None,
            metrics: None,
        }
    }

    /// Sets the entity id bound and mirror width.
    pub fn entity_count(mut self, count: u32) -> Self {
        self.entity_count = count;
        self
    }

    /// Selects the mirror builder.
    pub fn mirror_backend(mut self, backend: MirrorBackend) -> Self {
        self.mirror_backend = backend;
        self
    }

    /// Reserves room for `capacity` bonds up front.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enables or disables post-mutation consistency checks.
    pub fn check_invariants(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Sets the type names installed at construction.
    pub fn type_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn BondMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl std::fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableOptions")
            .field("n_types", &self.n_types)
            .field("entity_count", &self.entity_count)
            .field("mirror_backend", &self.mirror_backend)
            .field("capacity", &self.capacity)
            .field("check_invariants", &self.check_invariants)
            .field("type_names", &self.type_names)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
