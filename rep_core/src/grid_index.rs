//! Symbolic row/column lookup within a fetched reputation grid.
//!
//! Matching is exact and case-sensitive; the first match wins. Absence is a
//! normal outcome and is returned as `None`.

use rep_schema::{CellAddress, Grid, SpanBounds};

use crate::error::Missing;

/// Column of `name` in the header row. Column 0 is the label column and is
/// never a character.
pub fn find_character_column(grid: &Grid, name: &str) -> Option<usize> {
    grid.header()
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, cell)| cell.as_str() == name)
        .map(|(col, _)| col)
}

/// Row of `name` in column 0, ignoring the header.
pub fn find_faction_row(grid: &Grid, name: &str) -> Option<usize> {
    grid.body()
        .find(|(_, row)| row.first().is_some_and(|cell| cell == name))
        .map(|(row, _)| row)
}

/// Grid-relative coordinates of one character/faction cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLocation {
    pub row: usize,
    pub col: usize,
}

/// Resolve both keys, character first.
pub fn locate(grid: &Grid, character: &str, faction: &str) -> Result<CellLocation, Missing> {
    let col = find_character_column(grid, character).ok_or_else(|| Missing::Character {
        name: character.to_string(),
    })?;
    let row = find_faction_row(grid, faction).ok_or_else(|| Missing::Faction {
        name: faction.to_string(),
    })?;
    Ok(CellLocation { row, col })
}

/// Sheet address of a grid-relative cell, shifted by the origin of the span
/// the grid was read from.
pub fn cell_address(sheet: &str, origin: &SpanBounds, location: CellLocation) -> CellAddress {
    CellAddress::new(
        sheet,
        origin.first_row.unwrap_or(0) + location.row,
        origin.first_col + location.col,
    )
}

/// Non-blank header names in column order, first occurrence only.
pub fn character_names(grid: &Grid) -> Vec<String> {
    distinct(grid.header().iter().skip(1).map(String::as_str))
}

/// Non-blank faction names in row order, first occurrence only.
pub fn faction_names(grid: &Grid) -> Vec<String> {
    distinct(
        grid.body()
            .filter_map(|(_, row)| row.first().map(String::as_str)),
    )
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if name.trim().is_empty() || out.iter().any(|seen| seen == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}
