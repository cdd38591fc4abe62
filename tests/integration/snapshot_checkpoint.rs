use bondtable::{
    Bond, BondError, BondTable, EntityId, Result, Snapshot, Tag, TableOptions, TypeId,
};

fn multiset(table: &BondTable) -> Vec<(TypeId, (EntityId, EntityId))> {
    let mut items: Vec<_> = table
        .iter()
        .map(|(_, bond)| (bond.ty, bond.unordered()))
        .collect();
    items.sort();
    items
}

fn populated() -> Result<BondTable> {
    let mut table = BondTable::with_options(
        TableOptions::new(3).type_names(["harmonic", "fene", "tether"]),
    )?;
    for i in 0..50u32 {
        table.add(Bond::new(i % 3, i, (i * 17) % 50))?;
    }
    for tag in [3, 9, 27, 40, 0] {
        table.remove(Tag(tag))?;
    }
    Ok(table)
}

#[test]
fn checkpoint_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bonds.json");
    let source = populated()?;
    source.export().write_json(&path)?;

    let snapshot = Snapshot::read_json(&path)?;
    assert_eq!(snapshot, source.export());

    let mut restored = BondTable::new(3);
    restored.import(&snapshot)?;
    assert_eq!(multiset(&restored), multiset(&source));
    assert_eq!(restored.type_by_name("tether")?, TypeId(2));
    let expected_tags: Vec<Tag> = (0..source.count() as u32).map(Tag).collect();
    assert_eq!(restored.tags(), &expected_tags[..]);
    restored.validate()
}

#[test]
fn import_of_export_preserves_contents() -> Result<()> {
    let mut table = populated()?;
    let before = multiset(&table);
    let snapshot = table.export();
    table.import(&snapshot)?;
    assert_eq!(multiset(&table), before);
    assert!(table.is_dirty());
    assert_eq!(table.mirror().generation(), 1);
    Ok(())
}

#[test]
fn unnamed_checkpoint_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("unnamed.json");
    let mut source = BondTable::new(3);
    for i in 0..20u32 {
        source.add(Bond::new(i % 3, i, i + 1))?;
    }
    source.export().write_json(&path)?;

    let mut restored = BondTable::new(3);
    restored.import(&Snapshot::read_json(&path)?)?;
    assert_eq!(multiset(&restored), multiset(&source));
    assert_eq!(restored.catalog().names(), source.catalog().names());
    restored.validate()
}

#[test]
fn import_checks_type_count() -> Result<()> {
    let snapshot = populated()?.export();
    let mut narrower = BondTable::new(2);
    assert!(matches!(
        narrower.import(&snapshot),
        Err(BondError::ImmutableViolation(_))
    ));
    assert!(narrower.is_empty());
    Ok(())
}

#[test]
fn corrupt_checkpoint_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{\"type_ids\": [0], \"pairs\": ")?;
    assert!(matches!(Snapshot::read_json(&path), Err(BondError::Json(_))));
    let missing = dir.path().join("missing.json");
    assert!(matches!(Snapshot::read_json(&missing), Err(BondError::Io(_))));
    Ok(())
}
