#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::types::{BondError, Result, TypeId};

/// Mapping between bond type ids and their names.
///
/// The number of types is fixed when the catalog is created. Every type always
/// has a name: `type_<id>` until a full set is installed.
#[derive(Clone, Debug)]
pub struct TypeCatalog {
    n_types: u32,
    names: Vec<String>,
    by_name: FxHashMap<String, TypeId>,
}

impl TypeCatalog {
    pub fn new(n_types: u32) -> Self {
        let names: Vec<String> = (0..n_types).map(default_name).collect();
        let by_name = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), TypeId(idx as u32)))
            .collect();
        Self {
            n_types,
            names,
            by_name,
        }
    }

    pub fn n_types(&self) -> u32 {
        self.n_types
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        ty.0 < self.n_types
    }

    /// Replaces the full name set. Callers gate when this is allowed.
    pub(crate) fn assign(&mut self, names: &[String]) -> Result<()> {
        if names.len() != self.n_types as usize {
            warn!(
                expected = self.n_types,
                got = names.len(),
                "catalog.assign.count_mismatch"
            );
            return Err(BondError::ImmutableViolation(
                "type name count must equal the number of bond types",
            ));
        }
        let mut by_name = FxHashMap::default();
        by_name.reserve(names.len());
        for (idx, name) in names.iter().enumerate() {
            if by_name.insert(name.clone(), TypeId(idx as u32)).is_some() {
                return Err(BondError::Invalid("duplicate bond type name"));
            }
        }
        self.names = names.to_vec();
        self.by_name = by_name;
        trace!(n_types = self.n_types, "catalog.assign");
        Ok(())
    }

    pub fn name_of(&self, ty: TypeId) -> Result<&str> {
        self.names
            .get(ty.0 as usize)
            .map(String::as_str)
            .ok_or(BondError::NotFound("bond type"))
    }

    pub fn id_of(&self, name: &str) -> Result<TypeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or(BondError::NotFound("bond type name"))
    }

    /// Names in type-id order, always `n_types` long.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

fn default_name(ty: u32) -> String {
    format!("type_{ty}")
}
