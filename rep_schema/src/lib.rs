//! Data contracts shared by the reputation crates.
//!
//! Everything here is plain data: the string grid returned by a table backend,
//! tolerant cell coercion, band tables, and A1-style addressing. No I/O lives in
//! this crate so the front end and the backends can agree on shapes without
//! pulling in the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rectangular, possibly ragged, block of string cells as returned by a read.
///
/// Row 0 is the header. Missing trailing cells are absent rather than padded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn header(&self) -> &[String] {
        self.row(0).unwrap_or(&[])
    }

    /// Rows after the header, paired with their zero-based grid index.
    pub fn body(&self) -> impl Iterator<Item = (usize, &[String])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, row)| (index, row.as_slice()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set a cell, growing rows and columns with blanks as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.into();
    }

    /// Cut the grid down to the bounds of a span, trimming trailing blanks the
    /// way a sheet read does.
    pub fn slice(&self, bounds: &SpanBounds) -> Grid {
        let first_row = bounds.first_row.unwrap_or(0);
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .enumerate()
            .skip(first_row)
            .take_while(|(index, _)| bounds.last_row.map_or(true, |last| *index <= last))
            .map(|(_, row)| {
                let mut cells: Vec<String> = row
                    .iter()
                    .enumerate()
                    .skip(bounds.first_col)
                    .take_while(|(col, _)| bounds.last_col.map_or(true, |last| *col <= last))
                    .map(|(_, cell)| cell.clone())
                    .collect();
                while cells.last().is_some_and(|cell| cell.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Grid { rows }
    }
}

/// Interpretation of a single inbound cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Absent from a ragged row, or empty/whitespace.
    Blank,
    Integer(i64),
    /// Present but without a leading integer.
    Text(String),
}

impl CellValue {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => CellValue::Blank,
            Some(text) if text.trim().is_empty() => CellValue::Blank,
            Some(text) => match parse_leading_integer(text) {
                Some(value) => CellValue::Integer(value),
                None => CellValue::Text(text.to_string()),
            },
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Blank and non-numeric cells count as zero.
    pub fn coerce(&self) -> i64 {
        self.as_integer().unwrap_or(0)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Integer(value) => write!(f, "{}", value),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

/// Best-effort base-10 parse of the integer prefix of `raw`.
///
/// Leading whitespace and a single sign are accepted; anything after the digits
/// is ignored, so `"12 pts"` reads as 12 and `"abc"` as `None`. Values that do
/// not fit in an `i64` are treated as non-numeric.
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    format!("{}{}", sign, &digits[..len]).parse().ok()
}

/// One tier of a faction's band table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub min_rep: i64,
    pub max_rep: i64,
    pub title: String,
    #[serde(default)]
    pub rewards: String,
}

impl Band {
    pub fn new(min_rep: i64, max_rep: i64, title: impl Into<String>, rewards: impl Into<String>) -> Self {
        Self {
            min_rep,
            max_rep,
            title: title.into(),
            rewards: rewards.into(),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min_rep <= value && value <= self.max_rep
    }
}

/// Ordered tiers for one faction (or the reserved diplomacy table).
///
/// Order is significant: the next tier up is the next element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTable {
    pub name: String,
    pub bands: Vec<Band>,
}

impl BandTable {
    pub fn new(name: impl Into<String>, bands: Vec<Band>) -> Self {
        Self {
            name: name.into(),
            bands,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid direction '{0}', expected 'up' or 'down'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Spreadsheet column label for a zero-based column index: 0 → `A`, 25 → `Z`,
/// 26 → `AA`, 701 → `ZZ`, 702 → `AAA`.
pub fn column_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut n = index;
    loop {
        label.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Inverse of [`column_label`]. Case-insensitive; `None` for anything that is
/// not a run of letters.
pub fn column_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut index: usize = 0;
    for byte in label.bytes() {
        if !byte.is_ascii_alphabetic() {
            return None;
        }
        let digit = (byte.to_ascii_uppercase() - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

fn write_sheet_name(f: &mut fmt::Formatter<'_>, sheet: &str) -> fmt::Result {
    let bare = !sheet.is_empty()
        && sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        f.write_str(sheet)
    } else {
        write!(f, "'{}'", sheet.replace('\'', "''"))
    }
}

/// A sheet name plus an optional rectangular span such as `A:D` or `A2:A`.
/// Without a span the whole sheet is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeSpec {
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl RangeSpec {
    pub fn whole_sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            span: None,
        }
    }

    pub fn with_span(sheet: impl Into<String>, span: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            span: Some(span.into()),
        }
    }

    /// Parsed bounds of the span; a whole-sheet range is unbounded.
    pub fn bounds(&self) -> Result<SpanBounds, SpanParseError> {
        match &self.span {
            None => Ok(SpanBounds::default()),
            Some(span) => span.parse(),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        if let Some(span) = &self.span {
            write!(f, "!{}", span)?;
        }
        Ok(())
    }
}

/// Zero-based inclusive bounds decoded from an A1 span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanBounds {
    pub first_col: usize,
    pub last_col: Option<usize>,
    pub first_row: Option<usize>,
    pub last_row: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid range span '{0}'")]
pub struct SpanParseError(pub String);

fn split_endpoint(endpoint: &str) -> Option<(Option<usize>, Option<usize>)> {
    let letters = endpoint.bytes().take_while(u8::is_ascii_alphabetic).count();
    let (col_part, row_part) = endpoint.split_at(letters);
    let col = if col_part.is_empty() {
        None
    } else {
        Some(column_index(col_part)?)
    };
    let row = if row_part.is_empty() {
        None
    } else {
        let number: usize = row_part.parse().ok()?;
        Some(number.checked_sub(1)?)
    };
    if col.is_none() && row.is_none() {
        return None;
    }
    Some((col, row))
}

impl FromStr for SpanBounds {
    type Err = SpanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SpanParseError(s.to_string());
        let (start, end) = s.split_once(':').unwrap_or((s, s));
        let (first_col, first_row) = split_endpoint(start.trim()).ok_or_else(invalid)?;
        let (last_col, last_row) = split_endpoint(end.trim()).ok_or_else(invalid)?;
        Ok(SpanBounds {
            first_col: first_col.unwrap_or(0),
            last_col,
            first_row,
            last_row,
        })
    }
}

/// Sheet-qualified single cell, zero-based internally, rendered as `REP!C5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(sheet: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
        }
    }

    /// The unqualified A1 reference, e.g. `C5`.
    pub fn a1(&self) -> String {
        format!("{}{}", column_label(self.col), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        write!(f, "!{}", self.a1())
    }
}
