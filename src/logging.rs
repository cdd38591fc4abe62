use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{BondError, Result};

/// Installs a global fmt subscriber filtered by `level` (an `EnvFilter` directive).
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level).map_err(|_| BondError::Invalid("invalid log filter"))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| BondError::Invalid("logging already initialized"))
}
