//! Walks the configured cell/column mappings and writes resolved values
//! into the workbook.
//!
//! Every failure below the template itself is non-fatal: an unresolvable
//! field leaves its targets untouched, a missing worksheet or array skips
//! the mapping, and the fill carries on. Warnings are aggregated in the
//! report and mirrored to the `log` facade.

use crate::alias::{resolve_field, resolve_section_array};
use crate::schema::{CellMapping, SectionMapping, SheetMapping};
use crate::workbook::{column_index, CellAddress, CellValue, Workbook, Worksheet};
use log::{debug, warn};
use serde_json::Value;

/// Outcome of one fill pass. A report is always produced; `warnings` lists
/// every mapping that was skipped and why.
#[derive(Debug, Default)]
pub struct FillReport {
    pub cells_written: usize,
    pub rows_written: usize,
    pub warnings: Vec<String>,
}

impl FillReport {
    fn push_warning(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Fills `workbook` from `document` according to `mappings`. The document
/// is read-only; only mapped cells of the workbook are touched, each
/// keeping its pre-existing style.
pub fn fill_workbook(
    workbook: &mut Workbook,
    mappings: &[SheetMapping],
    document: &Value,
) -> FillReport {
    let mut report = FillReport::default();

    for mapping in mappings {
        let sheet = match workbook.sheet_mut(&mapping.sheet) {
            Some(sheet) => sheet,
            None => {
                report.push_warning(format!(
                    "Worksheet '{}' not found in template; skipping its mappings",
                    mapping.sheet
                ));
                continue;
            }
        };

        for cell_mapping in &mapping.cells {
            fill_scalar(sheet, cell_mapping, document, &mut report);
        }
        for section in &mapping.sections {
            fill_section(sheet, section, document, &mut report);
        }
    }

    report
}

fn fill_scalar(
    sheet: &mut Worksheet,
    mapping: &CellMapping,
    document: &Value,
    report: &mut FillReport,
) {
    let value = match resolve_field(document, &mapping.field).and_then(coerce_value) {
        Some(value) => value,
        None => {
            debug!(
                "Field '{}' not resolvable in extracted document; leaving targets untouched",
                mapping.field
            );
            return;
        }
    };

    for target in &mapping.targets {
        match CellAddress::parse(target) {
            Some(address) => {
                sheet.write_value(address, value.clone());
                report.cells_written += 1;
            }
            None => report.push_warning(format!(
                "Invalid target address '{}' for field '{}'",
                target, mapping.field
            )),
        }
    }
}

fn fill_section(
    sheet: &mut Worksheet,
    section: &SectionMapping,
    document: &Value,
    report: &mut FillReport,
) {
    let items = match resolve_section_array(document, &section.alias) {
        Some(items) => items,
        None => {
            report.push_warning(format!(
                "No array found for section '{}'; skipping section",
                section.alias
            ));
            return;
        }
    };

    for (index, element) in items.iter().enumerate() {
        let row = section.start_row + index as u32;
        let mut wrote = false;

        for (item_field, column) in &section.columns {
            let column = match column_index(column) {
                Some(column) => column,
                None => {
                    report.push_warning(format!(
                        "Invalid column '{}' in section '{}'",
                        column, section.alias
                    ));
                    continue;
                }
            };

            // Item fields are read directly; the alias layers only apply at
            // the section level.
            let value = match element.get(item_field).and_then(coerce_value) {
                Some(value) => value,
                None => continue,
            };

            sheet.write_value(CellAddress::new(column, row), value);
            report.cells_written += 1;
            wrote = true;
        }

        if wrote {
            report.rows_written += 1;
        }
    }
}

/// Coerces an extracted value to a template primitive: numbers and booleans
/// pass through, objects and arrays are serialized to a readable string,
/// everything else becomes text. `null` and empty strings coerce to nothing
/// so the target cell stays untouched.
fn coerce_value(value: &Value) -> Option<CellValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(CellValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(CellValue::Number),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(CellValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).ok().map(CellValue::Text)
        }
    }
}
