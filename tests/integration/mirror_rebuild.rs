use std::collections::HashMap;
use std::sync::Arc;

use bondtable::storage::{CounterMetrics, HostScanBuilder, MirrorBuilder, MirrorCell, MirrorInput};
use bondtable::{
    AdjacencyMirror, Bond, BondError, BondTable, EntityId, MirrorBackend, ReorderObserver,
    Result, Tag, TableOptions, TypeId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_table(backend: MirrorBackend, seed: u64) -> Result<BondTable> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut table = BondTable::with_options(
        TableOptions::new(4)
            .entity_count(200)
            .mirror_backend(backend),
    )?;
    for _ in 0..2_000 {
        table.add(Bond::new(
            rng.gen_range(0..4),
            rng.gen_range(0..150),
            rng.gen_range(0..150),
        ))?;
    }
    for tag in (0..2_000).step_by(3) {
        table.remove(Tag(tag))?;
    }
    Ok(table)
}

fn assert_mirror_matches(table: &BondTable, mirror: &AdjacencyMirror) {
    let mut expected: HashMap<u32, Vec<MirrorCell>> = HashMap::new();
    for (_, bond) in table.iter() {
        expected
            .entry(bond.a.0)
            .or_default()
            .push(MirrorCell::new(bond.b, bond.ty));
        expected
            .entry(bond.b.0)
            .or_default()
            .push(MirrorCell::new(bond.a, bond.ty));
    }
    let max_degree = expected.values().map(Vec::len).max().unwrap_or(0);
    assert_eq!(mirror.height(), max_degree);
    assert_eq!(mirror.as_slice().len(), mirror.width() * mirror.height());

    let mut placed = 0usize;
    for owner in 0..mirror.width() as u32 {
        let column: Vec<_> = mirror.column(EntityId(owner)).collect();
        let want = expected.remove(&owner).unwrap_or_default();
        assert_eq!(column, want, "column {owner}");
        for row in column.len()..mirror.height() {
            assert!(mirror.cell(EntityId(owner), row).unwrap().is_padding());
        }
        placed += column.len();
    }
    assert!(expected.is_empty());
    assert_eq!(placed, 2 * table.count());
}

#[test]
fn host_mirror_lists_every_bond_twice() -> Result<()> {
    let mut table = random_table(MirrorBackend::Host, 7)?;
    let mirror = table.mirror().clone();
    assert_eq!(mirror.width(), 200);
    assert_mirror_matches(&table, &mirror);
    Ok(())
}

#[test]
fn parallel_mirror_matches_host() -> Result<()> {
    let mut host = random_table(MirrorBackend::Host, 11)?;
    let mut parallel = random_table(MirrorBackend::Parallel, 11)?;
    assert_eq!(parallel.mirror_backend(), "parallel");
    let expected = host.mirror().clone();
    let got = parallel.mirror().clone();
    assert_eq!(expected.width(), got.width());
    assert_eq!(expected.height(), got.height());
    assert_eq!(expected.degrees(), got.degrees());
    assert_eq!(expected.as_slice(), got.as_slice());
    assert_mirror_matches(&parallel, &got);
    Ok(())
}

#[test]
fn rebuild_runs_only_after_changes() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let mut table = BondTable::with_options(TableOptions::new(2).metrics(metrics.clone()))?;
    let tag = table.add(Bond::new(0, 0, 1))?;
    for _ in 0..5 {
        let _ = table.mirror();
    }
    assert_eq!(metrics.snapshot().rebuilds(), 1);
    assert_eq!(metrics.snapshot().mirror_reuses, 4);

    table.add(Bond::new(1, 1, 2))?;
    assert_eq!(table.mirror().height(), 2);
    table.remove(tag)?;
    assert_eq!(table.mirror().height(), 1);
    assert_eq!(metrics.snapshot().rebuilds(), 3);
    Ok(())
}

#[test]
fn reorder_rebuilds_without_touching_dense_data() -> Result<()> {
    let mut table = random_table(MirrorBackend::Host, 3)?;
    let before_pairs = table.pairs().to_vec();
    let before = table.mirror().clone();
    assert!(!table.is_dirty());

    table.on_external_reorder();
    assert!(table.is_dirty());
    assert_eq!(table.pairs(), &before_pairs[..]);
    let after = table.mirror();
    assert_eq!(after.generation(), before.generation() + 1);
    assert_eq!(after.as_slice(), before.as_slice());
    Ok(())
}

#[test]
fn example_mirror_layout() -> Result<()> {
    let mut table = BondTable::new(2);
    table.add(Bond::new(0, 1, 2))?;
    table.add(Bond::new(0, 2, 3))?;
    table.add(Bond::new(1, 1, 3))?;
    table.remove(Tag(0))?;

    let mirror = table.mirror();
    assert_eq!(mirror.width(), 4);
    assert_eq!(mirror.height(), 2);
    assert_eq!(
        mirror.cell(EntityId(3), 0),
        Some(MirrorCell::new(EntityId(1), TypeId(1)))
    );
    assert_eq!(
        mirror.cell(EntityId(3), 1),
        Some(MirrorCell::new(EntityId(2), TypeId(0)))
    );
    assert_eq!(mirror.cell(EntityId(2), 1), Some(MirrorCell::PADDING));
    // row 0 is contiguous across owners
    assert_eq!(
        &mirror.as_slice()[..4],
        &[
            MirrorCell::PADDING,
            MirrorCell::new(EntityId(3), TypeId(1)),
            MirrorCell::new(EntityId(3), TypeId(0)),
            MirrorCell::new(EntityId(1), TypeId(1)),
        ]
    );
    Ok(())
}

#[test]
fn bounded_width_rejects_far_entities() -> Result<()> {
    for backend in [MirrorBackend::Host, MirrorBackend::Parallel] {
        let mut table = BondTable::with_options(
            TableOptions::new(1)
                .entity_count(16)
                .mirror_backend(backend),
        )?;
        table.add(Bond::new(0, 0, 15))?;
        assert!(matches!(
            table.add(Bond::new(0, 0, 20_000_000)),
            Err(BondError::EntityOutOfRange {
                entity: 20_000_000,
                entity_count: 16
            })
        ));
        let mirror = table.mirror();
        assert_eq!(mirror.width(), 16);
        assert_eq!(mirror.height(), 1);
        assert_eq!(mirror.as_slice().len(), 16);
    }
    Ok(())
}

struct Relabelled;

impl MirrorBuilder for Relabelled {
    fn name(&self) -> &'static str {
        "relabelled"
    }

    fn build(&self, input: MirrorInput<'_>, out: &mut AdjacencyMirror) {
        HostScanBuilder.build(input, out);
    }
}

#[test]
fn custom_builder_rebuilds_are_counted() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let mut table = BondTable::with_options(TableOptions::new(1).metrics(metrics.clone()))?;
    table.add(Bond::new(0, 0, 1))?;
    table.set_mirror_builder(Box::new(Relabelled));
    let _ = table.mirror();
    let _ = table.mirror();
    let snap = metrics.snapshot();
    assert_eq!(snap.other_rebuilds, 1);
    assert_eq!(snap.host_rebuilds, 0);
    assert_eq!(snap.rebuilds(), 1);
    assert_eq!(snap.mirror_reuses, 1);
    Ok(())
}
