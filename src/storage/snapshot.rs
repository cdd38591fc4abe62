use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{Bond, BondError, EntityId, Result, TypeId};

use super::catalog::TypeCatalog;
use super::table::{check_entities, BondTable};

/// Full bond state for checkpointing and initialization.
///
/// `type_ids` and `pairs` are index-aligned, one entry per bond in dense
/// order. `type_names` is indexed by type id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub type_ids: Vec<TypeId>,
    pub pairs: Vec<(EntityId, EntityId)>,
    pub type_names: Vec<String>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn bonds(&self) -> impl Iterator<Item = Bond> + '_ {
        self.type_ids
            .iter()
            .zip(&self.pairs)
            .map(|(&ty, &(a, b))| Bond { ty, a, b })
    }

    /// Checks the snapshot against a table with `n_types` bond types.
    pub fn validate(&self, n_types: u32) -> Result<()> {
        if self.type_ids.len() != self.pairs.len() {
            return Err(BondError::Invalid(
                "snapshot type_ids and pairs differ in length",
            ));
        }
        if self.type_names.len() != n_types as usize {
            return Err(BondError::ImmutableViolation(
                "snapshot type name count differs from the number of bond types",
            ));
        }
        if let Some(ty) = self.type_ids.iter().find(|ty| ty.0 >= n_types) {
            return Err(BondError::InvalidType { ty: ty.0, n_types });
        }
        Ok(())
    }

    /// Checks every participant against `entity_count`; zero means unbounded.
    pub fn validate_entities(&self, entity_count: u32) -> Result<()> {
        self.bonds()
            .try_for_each(|bond| check_entities(bond, entity_count))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut out, self)?;
        out.flush()?;
        info!(bonds = self.len(), path = %path.display(), "snapshot.write");
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        info!(bonds = snapshot.len(), path = %path.display(), "snapshot.read");
        Ok(snapshot)
    }
}

impl BondTable {
    /// Captures every bond in dense order together with the type names.
    pub fn export(&self) -> Snapshot {
        Snapshot {
            type_ids: self.types().to_vec(),
            pairs: self.pairs().to_vec(),
            type_names: self.catalog().names().to_vec(),
        }
    }

    /// Replaces the table contents with `snapshot`.
    ///
    /// Tags are reissued from zero in snapshot order. The snapshot is validated
    /// up front, so a rejected snapshot leaves the table untouched.
    pub fn import(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.validate(self.type_count())?;
        snapshot.validate_entities(self.entity_count())?;
        let mut catalog = TypeCatalog::new(self.type_count());
        catalog.assign(&snapshot.type_names)?;
        self.clear_bonds();
        *self.catalog_mut() = catalog;
        for bond in snapshot.bonds() {
            self.push_bond(bond)?;
        }
        info!(
            bonds = snapshot.len(),
            n_types = self.type_count(),
            "bond_table.import"
        );
        self.after_mutation()
    }
}
