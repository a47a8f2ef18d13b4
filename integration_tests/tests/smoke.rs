mod common;

use rep_core::{
    load_store_config_from_env, BandValidation, StoreConfigSource, WriteStrategy,
};

#[test]
fn config_loads_from_env_fixture() {
    common::ensure_test_config();
    let (config, source) = load_store_config_from_env();
    assert_eq!(
        source,
        StoreConfigSource::File(common::fixture_path("test_store_config.json"))
    );
    assert_eq!(config.band_validation, BandValidation::Strict);
    assert_eq!(config.write_strategy, WriteStrategy::Serialized);
    assert_eq!(config.notable.min_participants, 2);
}

#[test]
fn fixture_workbook_lists_names() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;
    assert_eq!(
        store.list_factions()?,
        vec!["Crown", "Guild", "Pirates", "Order"]
    );
    assert_eq!(
        store.list_characters()?,
        vec!["Aria", "Bram", "Cass", "Dane"]
    );
    Ok(())
}
