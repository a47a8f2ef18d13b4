mod common;

use rep_core::{Direction, ErrorKind, Missing, StoreError};

#[test]
fn standing_classifies_against_faction_bands() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;

    let standing = store.standing("Aria", "Crown")?;
    assert_eq!(standing.value, 120);
    assert_eq!(standing.band.title, "Friendly");
    assert_eq!(standing.band.rewards, "Crown discount");

    assert_eq!(store.standing("Cass", "Crown")?.band.title, "Hated");
    assert_eq!(store.standing("Aria", "Guild")?.band.title, "Partner");
    Ok(())
}

#[test]
fn next_tier_in_both_directions() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;

    let up = store.next_tier("Bram", "Crown", Direction::Up)?;
    assert_eq!(up.current.title, "Friendly");
    assert_eq!(up.next.title, "Honored");
    assert_eq!(up.required, 50);

    let down = store.next_tier("Bram", "Crown", Direction::Down)?;
    assert_eq!(down.next.title, "Neutral");
    assert_eq!(down.required, 351);

    let err = store
        .next_tier("Cass", "Crown", Direction::Down)
        .expect_err("already at the lowest tier");
    assert!(matches!(
        err,
        StoreError::EndOfRange {
            direction: Direction::Down
        }
    ));
    Ok(())
}

#[test]
fn lookup_misses_are_expected_errors() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;

    let blank = store.standing("Dane", "Crown").expect_err("blank cell");
    assert_eq!(
        blank.missing(),
        Some(&Missing::Value {
            character: "Dane".into(),
            faction: "Crown".into()
        })
    );

    let text = store.lookup_value("Cass", "Guild").expect_err("text cell");
    assert_eq!(text.kind(), ErrorKind::NotFound);

    let no_bands = store.standing("Aria", "Pirates").expect_err("no band sheet");
    assert_eq!(
        no_bands.missing(),
        Some(&Missing::BandTable {
            faction: "Pirates".into()
        })
    );

    let unknown = store.standing("Eve", "Crown").expect_err("no such character");
    assert!(unknown.is_expected());
    Ok(())
}

#[test]
fn strict_validation_reports_the_sheet_row() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;
    let err = store
        .lookup_band_table("Broken")
        .expect_err("unparseable minimum");
    match err {
        StoreError::MalformedBandTable { sheet, row, .. } => {
            assert_eq!(sheet, "Broken");
            assert_eq!(row, 3);
        }
        other => anyhow::bail!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn combined_standing_uses_diplomacy_bands() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;

    let crown = store.combined_standing("Crown")?;
    assert_eq!(crown.value, 540);
    assert_eq!(crown.band.title, "Allied");

    assert_eq!(store.combined_standing("Pirates")?.band.title, "Hostile");
    assert_eq!(store.combined_standing("Order")?.value, 0);
    assert_eq!(store.combined_value("Guild")?, 610);
    Ok(())
}

#[test]
fn notable_and_active_factions() -> anyhow::Result<()> {
    let (_dir, _table, store) = common::scratch_store()?;

    // Guild clears the magnitude but only two characters contribute.
    assert_eq!(store.notable_factions()?, vec!["Crown", "Pirates"]);
    assert_eq!(store.filter_factions(500, 0)?, vec!["Crown", "Guild", "Pirates"]);

    assert_eq!(store.active_factions("Dane")?, vec!["Guild"]);
    assert_eq!(store.active_factions("Cass")?, vec!["Crown", "Guild", "Pirates"]);
    Ok(())
}
