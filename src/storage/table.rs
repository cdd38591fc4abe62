use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, debug_span, trace};

use crate::types::{Bond, BondError, EntityId, Result, Tag, TypeId, NO_BOND};

use super::catalog::TypeCatalog;
use super::metrics::{default_metrics, BondMetrics};
use super::mirror::{builder_for, AdjacencyMirror, MirrorBuilder, MirrorInput};
use super::options::TableOptions;
use super::tag_index::TagIndex;
use super::tracker::{ChangeTracker, ReorderObserver};

/// Every bond in the simulation, stored densely with stable tags.
///
/// Bonds live in three index-aligned arrays (pairs, types, tags). Removal
/// swaps the last bond into the vacated slot, so dense indices move while tags
/// stay put. The owner-major [`AdjacencyMirror`] is derived lazily and
/// rebuilt only after a structural change or an external reorder.
///
/// The table is not `Clone`; move it to hand it to a new owner.
pub struct BondTable {
    pairs: Vec<(EntityId, EntityId)>,
    types: Vec<TypeId>,
    tags: Vec<Tag>,
    tag_index: TagIndex,
    catalog: TypeCatalog,
    tracker: ChangeTracker,
    mirror: AdjacencyMirror,
    builder: Box<dyn MirrorBuilder>,
    entity_count: u32,
    check_invariants: bool,
    metrics: Arc<dyn BondMetrics>,
}

impl BondTable {
    /// Creates an empty table with `n_types` bond types and default options.
    pub fn new(n_types: u32) -> Self {
        Self::from_parts(TableOptions::new(n_types))
    }

    /// Creates an empty table, installing any type names from `opts`.
    pub fn with_options(opts: TableOptions) -> Result<Self> {
        let names = opts.type_names.clone();
        let mut table = Self::from_parts(opts);
        if let Some(names) = names {
            table.catalog.assign(&names)?;
        }
        Ok(table)
    }

    fn from_parts(opts: TableOptions) -> Self {
        Self {
            pairs: Vec::with_capacity(opts.capacity),
            types: Vec::with_capacity(opts.capacity),
            tags: Vec::with_capacity(opts.capacity),
            tag_index: TagIndex::with_capacity(opts.capacity),
            catalog: TypeCatalog::new(opts.n_types),
            tracker: ChangeTracker::new(),
            mirror: AdjacencyMirror::default(),
            builder: builder_for(opts.mirror_backend),
            entity_count: opts.entity_count,
            check_invariants: opts.check_invariants,
            metrics: opts.metrics.unwrap_or_else(default_metrics),
        }
    }

    /// Appends a bond and returns its tag.
    pub fn add(&mut self, bond: Bond) -> Result<Tag> {
        let tag = self.append(bond)?;
        self.after_mutation()?;
        Ok(tag)
    }

    fn append(&mut self, bond: Bond) -> Result<Tag> {
        if !self.catalog.contains(bond.ty) {
            return Err(BondError::InvalidType {
                ty: bond.ty.0,
                n_types: self.catalog.n_types(),
            });
        }
        check_entities(bond, self.entity_count)?;
        // live tags are distinct and below NO_BOND, so this keeps allocate in range
        if self.pairs.len() >= NO_BOND as usize {
            return Err(BondError::Invalid("tag space exhausted"));
        }
        let tag = self.tag_index.allocate();
        let index = self.pairs.len();
        self.pairs.push((bond.a, bond.b));
        self.types.push(bond.ty);
        self.tags.push(tag);
        self.tag_index.set(tag, index);
        self.tracker.mark();
        self.metrics.bond_added();
        trace!(
            tag = tag.0,
            index,
            ty = bond.ty.0,
            a = bond.a.0,
            b = bond.b.0,
            "bond_table.add"
        );
        Ok(tag)
    }

    /// Removes the bond identified by `tag`, compacting the dense arrays.
    pub fn remove(&mut self, tag: Tag) -> Result<()> {
        let index = self
            .tag_index
            .lookup(tag)
            .ok_or(BondError::NotFound("bond tag"))?;
        let last = self.pairs.len() - 1;
        self.pairs.swap_remove(index);
        self.types.swap_remove(index);
        self.tags.swap_remove(index);
        if index != last {
            let moved = self.tags[index];
            self.tag_index.set(moved, index);
        }
        self.tag_index.clear(tag);
        self.tag_index.release(tag);
        self.tracker.mark();
        self.metrics.bond_removed();
        trace!(tag = tag.0, index, moved_from = last, "bond_table.remove");
        self.after_mutation()
    }

    pub fn get(&self, index: usize) -> Result<Bond> {
        if index >= self.pairs.len() {
            return Err(self.out_of_range(index));
        }
        let (a, b) = self.pairs[index];
        Ok(Bond {
            ty: self.types[index],
            a,
            b,
        })
    }

    pub fn get_by_tag(&self, tag: Tag) -> Result<Bond> {
        let index = self
            .tag_index
            .lookup(tag)
            .ok_or(BondError::NotFound("bond tag"))?;
        self.get(index)
    }

    /// Tag of the bond currently stored at dense `index`.
    pub fn tag_of(&self, index: usize) -> Result<Tag> {
        self.tags
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tag_index.lookup(tag).is_some()
    }

    pub fn count(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn type_count(&self) -> u32 {
        self.catalog.n_types()
    }

    /// Dense `(a, b)` pairs, index-aligned with [`BondTable::types`] and
    /// [`BondTable::tags`].
    pub fn pairs(&self) -> &[(EntityId, EntityId)] {
        &self.pairs
    }

    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Tag-indexed reverse lookup; [`NO_BOND`] marks tags that are not live.
    pub fn rtags(&self) -> &[u32] {
        self.tag_index.rtags()
    }

    /// `(tag, bond)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, Bond)> + '_ {
        self.pairs
            .iter()
            .zip(&self.types)
            .zip(&self.tags)
            .map(|((&(a, b), &ty), &tag)| (tag, Bond { ty, a, b }))
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Installs the bond type names. Only allowed while the table is empty.
    pub fn set_type_names(&mut self, names: &[String]) -> Result<()> {
        if !self.is_empty() {
            return Err(BondError::ImmutableViolation(
                "type names cannot change once bonds exist",
            ));
        }
        self.catalog.assign(names)
    }

    pub fn type_by_name(&self, name: &str) -> Result<TypeId> {
        self.catalog.id_of(name)
    }

    pub fn name_by_type(&self, ty: TypeId) -> Result<&str> {
        self.catalog.name_of(ty)
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Returns the adjacency mirror, rebuilding it first if anything changed.
    pub fn mirror(&mut self) -> &AdjacencyMirror {
        if !self.tracker.is_dirty() {
            self.metrics.mirror_reused();
            return &self.mirror;
        }
        let span = debug_span!("bond_table.rebuild_mirror", backend = self.builder.name());
        let _enter = span.enter();
        let started = Instant::now();
        self.builder.build(
            MirrorInput {
                pairs: &self.pairs,
                types: &self.types,
                entity_count: self.entity_count,
            },
            &mut self.mirror,
        );
        self.mirror.bump_generation();
        self.tracker.clear();
        self.metrics.mirror_rebuilt(self.builder.name());
        debug!(
            bonds = self.pairs.len(),
            width = self.mirror.width(),
            height = self.mirror.height(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "bond_table.mirror.rebuilt"
        );
        &self.mirror
    }

    /// Swaps the mirror builder; the next mirror request rebuilds with it.
    pub fn set_mirror_builder(&mut self, builder: Box<dyn MirrorBuilder>) {
        self.builder = builder;
        self.tracker.mark();
    }

    pub fn mirror_backend(&self) -> &'static str {
        self.builder.name()
    }

    /// Upper bound on entity ids accepted by [`BondTable::add`]; zero when unbounded.
    pub fn entity_count(&self) -> u32 {
        self.entity_count
    }

    /// Checks that the tag index and the dense arrays describe the same bonds.
    pub fn validate(&self) -> Result<()> {
        let count = self.pairs.len();
        if self.types.len() != count || self.tags.len() != count {
            return Err(BondError::InvariantViolation(format!(
                "dense array lengths differ: pairs {count}, types {}, tags {}",
                self.types.len(),
                self.tags.len()
            )));
        }
        for (index, (&tag, &ty)) in self.tags.iter().zip(&self.types).enumerate() {
            if self.tag_index.lookup(tag) != Some(index) {
                return Err(BondError::InvariantViolation(format!(
                    "tag {tag} at slot {index} maps to {:?}",
                    self.tag_index.lookup(tag)
                )));
            }
            if !self.catalog.contains(ty) {
                return Err(BondError::InvariantViolation(format!(
                    "slot {index} holds type {ty} (n_types = {})",
                    self.catalog.n_types()
                )));
            }
        }
        let live = self
            .tag_index
            .rtags()
            .iter()
            .filter(|&&slot| slot != NO_BOND)
            .count();
        if live != count {
            return Err(BondError::InvariantViolation(format!(
                "{live} live tags for {count} bonds"
            )));
        }
        Ok(())
    }

    /// Drops every bond and restarts tag numbering. Names and options stay.
    pub(super) fn clear_bonds(&mut self) {
        self.pairs.clear();
        self.types.clear();
        self.tags.clear();
        self.tag_index.reset();
        self.tracker.mark();
    }

    pub(super) fn catalog_mut(&mut self) -> &mut TypeCatalog {
        &mut self.catalog
    }

    /// Appends without the post-mutation check; bulk loaders validate once at the end.
    pub(super) fn push_bond(&mut self, bond: Bond) -> Result<Tag> {
        self.append(bond)
    }

    pub(super) fn after_mutation(&self) -> Result<()> {
        if !self.check_invariants {
            return Ok(());
        }
        let outcome = self.validate();
        if let Err(err) = &outcome {
            debug_assert!(false, "bond table corrupted: {err}");
        }
        outcome
    }

    fn out_of_range(&self, index: usize) -> BondError {
        BondError::IndexOutOfRange {
            index,
            count: self.pairs.len(),
        }
    }
}

/// Rejects participants at or above `entity_count`; zero means unbounded.
pub(super) fn check_entities(bond: Bond, entity_count: u32) -> Result<()> {
    if entity_count == 0 {
        return Ok(());
    }
    match [bond.a, bond.b].into_iter().find(|e| e.0 >= entity_count) {
        Some(entity) => Err(BondError::EntityOutOfRange {
            entity: entity.0,
            entity_count,
        }),
        None => Ok(()),
    }
}

impl ReorderObserver for BondTable {
    fn on_external_reorder(&mut self) {
        self.tracker.mark();
        self.metrics.reorder_notified();
        trace!(bonds = self.pairs.len(), "bond_table.reorder");
    }
}

impl std::fmt::Debug for BondTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondTable")
            .field("count", &self.pairs.len())
            .field("n_types", &self.catalog.n_types())
            .field("dirty", &self.tracker.is_dirty())
            .field("backend", &self.builder.name())
            .finish()
    }
}
