//! TOML configuration for bond tables.
//!
//! ```toml
//! default_profile = "production"
//!
//! [table]
//! n_types = 2
//! type_names = ["harmonic", "fene"]
//!
//! [profiles.production]
//! mirror_backend = "parallel"
//! entity_count = 100000
//! ```
//!
//! `[table]` holds the base settings; a profile overrides any field it sets.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{MirrorBackend, TableOptions};

#[derive(Debug, Default)]
pub struct TableConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl TableConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self {
            path: Some(path.to_path_buf()),
            data,
        };
        config.check_default_profile()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let data: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let config = Self { path: None, data };
        config.check_default_profile()?;
        Ok(config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.data.default_profile.as_deref()
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.data.profiles.keys().map(String::as_str)
    }

    /// Options from `[table]`, overridden by `profile` or the default profile.
    pub fn options(&self, profile: Option<&str>) -> Result<TableOptions, ConfigError> {
        let mut merged = self.data.table.clone();
        if let Some(name) = profile.or(self.data.default_profile.as_deref()) {
            let overrides = self.data.profiles.get(name).ok_or_else(|| {
                ConfigError::ProfileNotFound {
                    name: name.to_string(),
                }
            })?;
            merged.apply(overrides);
        }
        merged.into_options()
    }

    fn check_default_profile(&self) -> Result<(), ConfigError> {
        match self.data.default_profile.as_ref() {
            Some(name) if !self.data.profiles.contains_key(name) => {
                Err(ConfigError::ProfileNotFound { name: name.clone() })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    table: RawTable,
    #[serde(default)]
    profiles: HashMap<String, RawTable>,
    #[serde(default)]
    default_profile: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
struct RawTable {
    n_types: Option<u32>,
    entity_count: Option<u32>,
    mirror_backend: Option<String>,
    capacity: Option<usize>,
    check_invariants: Option<bool>,
    type_names: Option<Vec<String>>,
}

impl RawTable {
    fn apply(&mut self, other: &RawTable) {
        if let Some(n_types) = other.n_types {
            self.n_types = Some(n_types);
        }
        if let Some(count) = other.entity_count {
            self.entity_count = Some(count);
        }
        if let Some(backend) = &other.mirror_backend {
            self.mirror_backend = Some(backend.clone());
        }
        if let Some(capacity) = other.capacity {
            self.capacity = Some(capacity);
        }
        if let Some(check) = other.check_invariants {
            self.check_invariants = Some(check);
        }
        if let Some(names) = &other.type_names {
            self.type_names = Some(names.clone());
        }
    }

    fn into_options(self) -> Result<TableOptions, ConfigError> {
        let n_types = self.n_types.ok_or(ConfigError::Missing { field: "n_types" })?;
        let mut opts = TableOptions::new(n_types);
        if let Some(count) = self.entity_count {
            opts = opts.entity_count(count);
        }
        if let Some(value) = self.mirror_backend {
            let backend = value
                .parse::<MirrorBackend>()
                .map_err(|_| ConfigError::InvalidBackend { value })?;
            opts = opts.mirror_backend(backend);
        }
        if let Some(capacity) = self.capacity {
            opts = opts.capacity(capacity);
        }
        if let Some(check) = self.check_invariants {
            opts = opts.check_invariants(check);
        }
        if let Some(names) = self.type_names {
            opts = opts.type_names(names);
        }
        Ok(opts)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read table config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse table config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },
    #[error("mirror backend '{value}' is invalid (expected host or parallel)")]
    InvalidBackend { value: String },
    #[error("missing required setting '{field}'")]
    Missing { field: &'static str },
}
