//! In-memory model of the tabular output template.
//!
//! A workbook is a set of named worksheets; a worksheet is a sparse map of
//! `A1`-style addresses to cells; a cell carries a value and its own
//! style/number-format metadata. Writing a value into an existing cell is a
//! read-then-rewrite of the value alone, so formatting always survives
//! injection. Parsing the template is the one fatal failure of a binding
//! operation; everything downstream degrades per-field.

use crate::error::{Result, TemplateBindError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A cell reference like `B12`: column letters then a 1-based row.
/// Ordered column-first so worksheet iteration walks columns left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CellAddress {
    pub column: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Parses `B12`-style references. Both parts are required; the column
    /// is case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let split = raw.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = raw.split_at(split);
        let column = column_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { column, row })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid cell address: {s}"))
    }
}

impl From<CellAddress> for String {
    fn from(addr: CellAddress) -> String {
        addr.to_string()
    }
}

impl TryFrom<String> for CellAddress {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// 1-based column index for a letter run (`A` → 1, `AA` → 27).
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index)
}

/// Letter run for a 1-based column index (1 → `A`, 27 → `AA`).
pub fn column_letter(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Formatting metadata attached to a cell. Opaque to the engine: it is
/// carried through a fill, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,

    #[serde(default)]
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Worksheet {
    #[serde(default)]
    pub cells: BTreeMap<CellAddress, Cell>,
}

impl Worksheet {
    pub fn cell(&self, address: &CellAddress) -> Option<&Cell> {
        self.cells.get(address)
    }

    pub fn value(&self, address: &CellAddress) -> Option<&CellValue> {
        self.cells.get(address).map(|cell| &cell.value)
    }

    /// Writes a value at `address`, keeping the pre-existing style when the
    /// cell already exists and creating a default-styled cell otherwise.
    pub fn write_value(&mut self, address: CellAddress, value: CellValue) {
        self.cells
            .entry(address)
            .and_modify(|cell| cell.value = value.clone())
            .or_insert_with(|| Cell {
                value,
                style: CellStyle::default(),
            });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: BTreeMap<String, Worksheet>,
}

impl Workbook {
    /// Parses a serialized template. This is the single fatal boundary of a
    /// binding operation: a template that cannot be parsed aborts the whole
    /// run, unlike any per-field failure.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| TemplateBindError::TemplateParse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.get(name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets.get_mut(name)
    }
}
