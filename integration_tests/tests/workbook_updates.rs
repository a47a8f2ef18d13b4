mod common;

use std::sync::Arc;
use std::thread;

use rep_core::{JsonWorkbookTable, ReputationStore, StoreConfig, Workbook};

#[test]
fn delta_is_persisted_to_the_workbook_file() -> anyhow::Result<()> {
    let (_dir, table, store) = common::scratch_store()?;

    assert_eq!(store.apply_delta("Dane", "Crown", 25)?, 25);
    let outcome = store.apply_delta_detailed("Dane", "Crown", -5)?;
    assert_eq!(outcome.previous, 25);
    assert_eq!(outcome.value, 20);
    assert_eq!(outcome.cell.to_string(), "REP!E2");

    let reopened = JsonWorkbookTable::open(table.path())?;
    let workbook: Workbook = reopened.load()?;
    let grid = &workbook.sheets["REP"];
    assert_eq!(grid.cell(1, 4), Some("20"));
    // Untouched sheets survive the rewrite.
    assert!(workbook.sheets.contains_key("DIPLOMACY"));
    Ok(())
}

#[test]
fn delta_on_text_cell_starts_from_zero() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;
    assert_eq!(store.apply_delta("Cass", "Guild", 15)?, 15);
    assert_eq!(store.lookup_value("Cass", "Guild")?, 15);
    Ok(())
}

#[test]
fn failed_lookup_leaves_file_untouched() -> anyhow::Result<()> {
    let (_dir, table, store) = common::scratch_store()?;
    let before = std::fs::read_to_string(table.path())?;

    assert!(store.apply_delta("Eve", "Crown", 5).is_err());
    assert!(store.apply_delta("Aria", "Nobody", 5).is_err());

    assert_eq!(std::fs::read_to_string(table.path())?, before);
    Ok(())
}

#[test]
fn concurrent_deltas_against_the_file_all_land() -> anyhow::Result<()> {
    let (_dir, table, _) = common::scratch_store()?;
    let config = Arc::new(StoreConfig {
        table_timeout_ms: None,
        ..StoreConfig::default()
    });
    let store = Arc::new(ReputationStore::from_shared(Arc::clone(&table), config));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.apply_delta("Aria", "Guild", 1))
        })
        .collect();
    for handle in handles {
        handle.join().expect("update thread panicked")?;
    }

    assert_eq!(store.lookup_value("Aria", "Guild")?, 610);
    Ok(())
}

#[test]
fn update_moves_faction_into_notable_set() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;
    assert!(!store.notable_factions()?.contains(&"Guild".to_string()));

    store.apply_delta("Bram", "Guild", 40)?;

    assert!(store.notable_factions()?.contains(&"Guild".to_string()));
    Ok(())
}
