//! Band tables: loading them from a sheet and classifying values against them.

use rep_schema::{parse_leading_integer, Band, BandTable, Direction, Grid};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How strictly band sheets are checked when loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandValidation {
    /// Skip unparseable rows; gaps and overlaps resolve as no match / first
    /// match.
    #[default]
    Tolerant,
    /// Reject unparseable rows, unsorted bands, overlaps and gaps.
    Strict,
}

/// A band row that could not be used. `row` is the zero-based grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedBand {
    pub row: usize,
    pub reason: String,
}

/// Build a band table from a band sheet laid out as `min, max, title, rewards`.
pub fn parse_band_table(
    name: &str,
    grid: &Grid,
    header_rows: usize,
    validation: BandValidation,
) -> Result<BandTable, MalformedBand> {
    let mut bands = Vec::new();
    let mut source_rows = Vec::new();
    for (index, row) in grid.rows().iter().enumerate().skip(header_rows) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match parse_band_row(row) {
            Ok(band) => {
                bands.push(band);
                source_rows.push(index);
            }
            Err(reason) => match validation {
                BandValidation::Strict => return Err(MalformedBand { row: index, reason }),
                BandValidation::Tolerant => {
                    warn!(
                        target: "reputation::bands",
                        table = name,
                        row = index,
                        %reason,
                        "band_table.row_skipped"
                    );
                }
            },
        }
    }
    let table = BandTable::new(name, bands);
    if validation == BandValidation::Strict {
        check_partition(&table, &source_rows)?;
    }
    Ok(table)
}

fn parse_band_row(row: &[String]) -> Result<Band, String> {
    let bound = |index: usize, label: &str| -> Result<i64, String> {
        let raw = row.get(index).map(String::as_str).unwrap_or("");
        parse_leading_integer(raw).ok_or_else(|| format!("{} '{}' is not an integer", label, raw))
    };
    let min_rep = bound(0, "minimum")?;
    let max_rep = bound(1, "maximum")?;
    if min_rep > max_rep {
        return Err(format!("minimum {} exceeds maximum {}", min_rep, max_rep));
    }
    let title = row.get(2).map(|cell| cell.trim()).unwrap_or("");
    if title.is_empty() {
        return Err("title is blank".to_string());
    }
    let rewards = row.get(3).map(|cell| cell.trim()).unwrap_or("");
    Ok(Band::new(min_rep, max_rep, title, rewards))
}

/// Bands must ascend with each one starting right after its predecessor.
fn check_partition(table: &BandTable, source_rows: &[usize]) -> Result<(), MalformedBand> {
    for (index, pair) in table.bands.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let expected = prev.max_rep.checked_add(1);
        if expected != Some(next.min_rep) {
            let reason = if next.min_rep <= prev.max_rep {
                format!(
                    "'{}' starts at {} inside '{}' ({}..={})",
                    next.title, next.min_rep, prev.title, prev.min_rep, prev.max_rep
                )
            } else {
                format!(
                    "gap between '{}' ending at {} and '{}' starting at {}",
                    prev.title, prev.max_rep, next.title, next.min_rep
                )
            };
            return Err(MalformedBand {
                row: source_rows.get(index + 1).copied().unwrap_or(index + 1),
                reason,
            });
        }
    }
    Ok(())
}

/// Index of the first band containing `value`.
pub fn classify(table: &BandTable, value: i64) -> Option<usize> {
    table.iter().position(|band| band.contains(value))
}

pub fn band_for(table: &BandTable, value: i64) -> Option<&Band> {
    classify(table, value).and_then(|index| table.get(index))
}

/// Neighbour of the current band in the requested direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextBand<'a> {
    Found {
        band: &'a Band,
        /// Reputation still needed to cross into `band`.
        required_delta: i64,
    },
    /// Already at the top (up) or bottom (down) of the table.
    EndOfRange,
}

pub fn next_band(
    table: &BandTable,
    current_index: usize,
    value: i64,
    direction: Direction,
) -> NextBand<'_> {
    let neighbour = match direction {
        Direction::Up => current_index.checked_add(1),
        Direction::Down => current_index.checked_sub(1),
    };
    let Some(band) = neighbour.and_then(|index| table.get(index)) else {
        return NextBand::EndOfRange;
    };
    let required_delta = match direction {
        Direction::Up => band.min_rep.saturating_sub(value),
        Direction::Down => value.saturating_sub(band.max_rep),
    };
    NextBand::Found {
        band,
        required_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> BandTable {
        BandTable::new(
            "Crown",
            vec![
                Band::new(i64::MIN, -501, "Hated", "Bounty on sight"),
                Band::new(-500, -1, "Distrusted", "Prices +20%"),
                Band::new(0, 499, "Neutral", ""),
                Band::new(500, i64::MAX, "Honoured", "Knighthood"),
            ],
        )
    }

    fn sheet(rows: Vec<Vec<&str>>) -> Grid {
        let mut all = vec![vec!["Min", "Max", "Title", "Rewards"]];
        all.extend(rows);
        Grid::from_rows(all)
    }

    #[test]
    fn every_value_lands_in_exactly_one_band() {
        let table = ladder();
        for value in [i64::MIN, -10_000, -501, -500, -1, 0, 1, 499, 500, i64::MAX] {
            let matches = table.iter().filter(|band| band.contains(value)).count();
            assert_eq!(matches, 1, "value {value}");
            assert!(classify(&table, value).is_some());
        }
        assert_eq!(band_for(&table, 499).map(|b| b.title.as_str()), Some("Neutral"));
        assert_eq!(band_for(&table, 500).map(|b| b.title.as_str()), Some("Honoured"));
    }

    #[test]
    fn values_outside_every_band_have_no_tier() {
        let table = BandTable::new("Guild", vec![Band::new(0, 10, "Member", "")]);
        assert_eq!(classify(&table, -1), None);
        assert_eq!(classify(&table, 11), None);
        assert_eq!(classify(&BandTable::default(), 0), None);
    }

    #[test]
    fn next_band_reports_required_delta() {
        let table = ladder();
        let current = classify(&table, 120).expect("neutral");
        match next_band(&table, current, 120, Direction::Up) {
            NextBand::Found {
                band,
                required_delta,
            } => {
                assert_eq!(band.title, "Honoured");
                assert_eq!(required_delta, 380);
            }
            NextBand::EndOfRange => panic!("expected a band above"),
        }
        match next_band(&table, current, 120, Direction::Down) {
            NextBand::Found {
                band,
                required_delta,
            } => {
                assert_eq!(band.title, "Distrusted");
                assert_eq!(required_delta, 121);
            }
            NextBand::EndOfRange => panic!("expected a band below"),
        }
    }

    #[test]
    fn next_band_stops_at_either_end() {
        let table = ladder();
        assert_eq!(
            next_band(&table, table.len() - 1, 900, Direction::Up),
            NextBand::EndOfRange
        );
        assert_eq!(
            next_band(&table, 0, -900, Direction::Down),
            NextBand::EndOfRange
        );
    }

    #[test]
    fn tolerant_parse_skips_bad_rows() {
        let grid = sheet(vec![
            vec!["-100", "-1", "Cold", "None"],
            vec!["", "", "", ""],
            vec!["zero", "9", "Broken", ""],
            vec!["0", "99", "Warm"],
            vec!["100", "50", "Inverted", ""],
        ]);
        let table =
            parse_band_table("Crown", &grid, 1, BandValidation::Tolerant).expect("tolerant");
        let titles: Vec<_> = table.iter().map(|band| band.title.as_str()).collect();
        assert_eq!(titles, vec!["Cold", "Warm"]);
        assert_eq!(table.bands[1].rewards, "");
    }

    #[test]
    fn strict_parse_rejects_bad_rows() {
        let grid = sheet(vec![
            vec!["-100", "-1", "Cold", "None"],
            vec!["zero", "9", "Broken", ""],
        ]);
        let err = parse_band_table("Crown", &grid, 1, BandValidation::Strict)
            .expect_err("strict should fail");
        assert_eq!(err.row, 2);
        assert!(err.reason.contains("zero"));

        let untitled = sheet(vec![vec!["0", "9"]]);
        let err = parse_band_table("Crown", &untitled, 1, BandValidation::Strict)
            .expect_err("title required");
        assert_eq!(err.reason, "title is blank");
    }

    #[test]
    fn strict_parse_rejects_gaps_and_overlaps() {
        let gap = sheet(vec![vec!["0", "9", "Low", ""], vec!["20", "29", "High", ""]]);
        let err = parse_band_table("Crown", &gap, 1, BandValidation::Strict)
            .expect_err("gap");
        assert!(err.reason.starts_with("gap between 'Low'"));
        assert_eq!(err.row, 2);

        let overlap = sheet(vec![vec!["0", "9", "Low", ""], vec!["5", "29", "High", ""]]);
        let err = parse_band_table("Crown", &overlap, 1, BandValidation::Strict)
            .expect_err("overlap");
        assert!(err.reason.contains("inside 'Low'"));

        let tolerant = parse_band_table("Crown", &overlap, 1, BandValidation::Tolerant)
            .expect("tolerant keeps overlap");
        assert_eq!(band_for(&tolerant, 7).map(|b| b.title.as_str()), Some("Low"));
    }
}
