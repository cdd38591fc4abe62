//! Owner-major adjacency table derived from the dense bond arrays.
//!
//! Every owner gets one column; row `r` of a column holds the owner's `r`-th
//! bond as `(partner, type)`. Columns shorter than the table height are padded
//! with [`MirrorCell::PADDING`]. Cells are laid out row by row, so cell
//! `(owner, row)` sits at `row * width + owner` and consecutive owners read
//! consecutive memory for the same row.

use rayon::prelude::*;

use crate::types::{EntityId, TypeId};

use super::options::MirrorBackend;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct MirrorCell {
    pub partner: EntityId,
    pub ty: TypeId,
}

impl MirrorCell {
    /// Filler for rows past an owner's degree.
    pub const PADDING: MirrorCell = MirrorCell {
        partner: EntityId(u32::MAX),
        ty: TypeId(u32::MAX),
    };

    pub fn new(partner: EntityId, ty: TypeId) -> Self {
        Self { partner, ty }
    }

    pub fn is_padding(&self) -> bool {
        *self == Self::PADDING
    }
}

/// Borrowed view of the dense arrays handed to a [`MirrorBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct MirrorInput<'a> {
    pub pairs: &'a [(EntityId, EntityId)],
    pub types: &'a [TypeId],
    /// Lower bound on the table width.
    pub entity_count: u32,
}

impl MirrorInput<'_> {
    fn width(&self) -> usize {
        let highest = self
            .pairs
            .iter()
            .map(|&(a, b)| a.0.max(b.0) as usize + 1)
            .max()
            .unwrap_or(0);
        highest.max(self.entity_count as usize)
    }

    fn par_width(&self) -> usize {
        let highest = self
            .pairs
            .par_iter()
            .map(|&(a, b)| a.0.max(b.0) as usize + 1)
            .max()
            .unwrap_or(0);
        highest.max(self.entity_count as usize)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AdjacencyMirror {
    cells: Vec<MirrorCell>,
    degrees: Vec<u32>,
    width: usize,
    height: usize,
    generation: u64,
}

impl AdjacencyMirror {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole table, `width * height` cells in row-major order.
    pub fn as_slice(&self) -> &[MirrorCell] {
        &self.cells
    }

    pub fn cell(&self, owner: EntityId, row: usize) -> Option<MirrorCell> {
        let owner = owner.0 as usize;
        if owner >= self.width || row >= self.height {
            return None;
        }
        Some(self.cells[row * self.width + owner])
    }

    /// Non-padding cells of `owner`'s column, top to bottom.
    pub fn column(&self, owner: EntityId) -> impl Iterator<Item = MirrorCell> + '_ {
        let degree = self.degree(owner) as usize;
        let owner = owner.0 as usize;
        (0..degree).map(move |row| self.cells[row * self.width + owner])
    }

    pub fn degree(&self, owner: EntityId) -> u32 {
        self.degrees.get(owner.0 as usize).copied().unwrap_or(0)
    }

    /// Per-owner bond counts, indexed by entity id.
    pub fn degrees(&self) -> &[u32] {
        &self.degrees
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width * height, MirrorCell::PADDING);
    }

    pub(super) fn bump_generation(&mut self) {
        self.generation += 1;
    }
}

/// A strategy for filling an [`AdjacencyMirror`] from the dense arrays.
///
/// Every builder must produce the same table for the same input: rows within a
/// column follow dense bond order, and for a bond `(a, b)` the entry in `a`'s
/// column precedes the entry in `b`'s column.
pub trait MirrorBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self, input: MirrorInput<'_>, out: &mut AdjacencyMirror);
}

pub fn builder_for(backend: MirrorBackend) -> Box<dyn MirrorBuilder> {
    match backend {
        MirrorBackend::Host => Box::new(HostScanBuilder),
        MirrorBackend::Parallel => Box::new(ParallelScanBuilder),
    }
}

/// Two sequential passes: count degrees, then place cells by per-owner cursor.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostScanBuilder;

impl MirrorBuilder for HostScanBuilder {
    fn name(&self) -> &'static str {
        MirrorBackend::Host.as_str()
    }

    fn build(&self, input: MirrorInput<'_>, out: &mut AdjacencyMirror) {
        let width = input.width();
        out.degrees.clear();
        out.degrees.resize(width, 0);
        let mut height = 0u32;
        for &(a, b) in input.pairs {
            for owner in [a, b] {
                let degree = &mut out.degrees[owner.0 as usize];
                *degree += 1;
                height = height.max(*degree);
            }
        }

        out.reset(width, height as usize);
        let mut cursor = vec![0usize; width];
        for (&(a, b), &ty) in input.pairs.iter().zip(input.types) {
            for (owner, partner) in [(a, b), (b, a)] {
                let col = owner.0 as usize;
                let row = cursor[col];
                out.cells[row * width + col] = MirrorCell::new(partner, ty);
                cursor[col] += 1;
            }
        }
    }
}

/// Rayon build: a sorted incidence list, degree runs read off it, then rows
/// filled in parallel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelScanBuilder;

impl MirrorBuilder for ParallelScanBuilder {
    fn name(&self) -> &'static str {
        MirrorBackend::Parallel.as_str()
    }

    fn build(&self, input: MirrorInput<'_>, out: &mut AdjacencyMirror) {
        let width = input.par_width();

        // (owner, sequence, cell); sequence is unique and follows host placement order
        let mut incidences: Vec<(u32, usize, MirrorCell)> = input
            .pairs
            .par_iter()
            .zip(input.types.par_iter())
            .enumerate()
            .flat_map_iter(|(i, (&(a, b), &ty))| {
                [
                    (a.0, 2 * i, MirrorCell::new(b, ty)),
                    (b.0, 2 * i + 1, MirrorCell::new(a, ty)),
                ]
            })
            .collect();
        incidences.par_sort_unstable_by_key(|&(owner, seq, _)| (owner, seq));

        // owners are sorted, so each owner's incidences form one run
        let mut degrees = vec![0u32; width];
        let mut offsets = vec![0usize; width];
        for (pos, &(owner, _, _)) in incidences.iter().enumerate() {
            let owner = owner as usize;
            if degrees[owner] == 0 {
                offsets[owner] = pos;
            }
            degrees[owner] += 1;
        }
        let height = degrees.par_iter().copied().max().unwrap_or(0) as usize;
        out.reset(width, height);
        if width > 0 && height > 0 {
            out.cells
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(row, slots)| {
                    for (owner, slot) in slots.iter_mut().enumerate() {
                        if row < degrees[owner] as usize {
                            *slot = incidences[offsets[owner] + row].2;
                        }
                    }
                });
        }
        out.degrees = degrees;
    }
}
