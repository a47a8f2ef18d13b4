//! Combined reputation across every character for a faction.

use std::collections::HashSet;

use rep_schema::{CellValue, Grid};
use serde::Serialize;

use crate::grid_index::find_faction_row;

/// Totals for one faction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionTotal {
    pub faction: String,
    pub combined: i64,
    /// Characters holding a non-zero, numeric value.
    pub participants: usize,
}

impl FactionTotal {
    pub fn qualifies(&self, magnitude_threshold: u64, min_participants: usize) -> bool {
        self.combined.unsigned_abs() > magnitude_threshold && self.participants > min_participants
    }
}

/// Sum and participant count over every character cell of a faction row.
/// Blank and non-numeric cells contribute nothing.
pub fn row_total(row: &[String]) -> (i64, usize) {
    row.iter()
        .skip(1)
        .filter_map(|cell| CellValue::parse(Some(cell.as_str())).as_integer())
        .fold((0i64, 0usize), |(sum, participants), value| {
            (
                sum.saturating_add(value),
                participants + usize::from(value != 0),
            )
        })
}

/// `None` when the faction has no row, which is distinct from a zero sum.
pub fn combined_value(grid: &Grid, faction: &str) -> Option<i64> {
    let row = find_faction_row(grid, faction)?;
    grid.row(row).map(|cells| row_total(cells).0)
}

/// Totals for every faction in one pass over a single snapshot. Duplicate
/// faction rows are ignored after the first, matching lookup semantics.
pub fn faction_totals(grid: &Grid) -> Vec<FactionTotal> {
    let mut totals: Vec<FactionTotal> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for (_, row) in grid.body() {
        let Some(faction) = row.first().filter(|name| !name.trim().is_empty()) else {
            continue;
        };
        if !seen.insert(faction.as_str()) {
            continue;
        }
        let (combined, participants) = row_total(row);
        totals.push(FactionTotal {
            faction: faction.clone(),
            combined,
            participants,
        });
    }
    totals
}

/// Factions whose combined value exceeds `magnitude_threshold` in absolute
/// terms and which have more than `min_participants` non-zero characters.
pub fn filter_factions(
    grid: &Grid,
    magnitude_threshold: u64,
    min_participants: usize,
) -> Vec<String> {
    faction_totals(grid)
        .into_iter()
        .filter(|total| total.qualifies(magnitude_threshold, min_participants))
        .map(|total| total.faction)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::from_rows(vec![
            vec!["", "A", "B", "C", "D", "E", "F"],
            vec!["Crown", "10", "", "abc", "-5"],
            vec!["Few", "200", "200", "200"],
            vec!["Many", "100", "100", "100", "100", "200", "0"],
            vec!["Feared", "-300", "-300", "-300", "-300", "-300"],
            vec!["Quiet"],
        ])
    }

    #[test]
    fn combined_value_coerces_non_numeric_cells_to_zero() {
        let grid = grid();
        assert_eq!(combined_value(&grid, "Crown"), Some(5));
        assert_eq!(combined_value(&grid, "Quiet"), Some(0));
        assert_eq!(combined_value(&grid, "Nobody"), None);
    }

    #[test]
    fn participants_count_only_non_zero_numbers() {
        let row: Vec<String> = ["Many", "100", "", "x", "0", "-3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(row_total(&row), (97, 2));
    }

    #[test]
    fn filter_requires_magnitude_and_participants() {
        let grid = grid();
        // Few: 600 from 3 participants; Many: 600 from 5.
        assert_eq!(filter_factions(&grid, 500, 4), vec!["Many", "Feared"]);
        assert_eq!(
            filter_factions(&grid, 500, 0),
            vec!["Few", "Many", "Feared"]
        );
        assert!(filter_factions(&grid, 1_500, 0).is_empty());
    }

    #[test]
    fn magnitude_threshold_is_exclusive() {
        let grid = Grid::from_rows(vec![
            vec!["", "A"],
            vec!["Edge", "500"],
            vec!["Below", "-500"],
            vec!["Over", "-501"],
        ]);
        assert_eq!(filter_factions(&grid, 500, 0), vec!["Over"]);
    }

    #[test]
    fn duplicate_rows_use_first_occurrence() {
        let grid = Grid::from_rows(vec![
            vec!["", "A"],
            vec!["Crown", "1"],
            vec!["Crown", "9000"],
        ]);
        let totals = faction_totals(&grid);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].combined, 1);
    }
}
