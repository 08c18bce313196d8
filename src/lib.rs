//! # Template Binder
//!
//! A library for binding LLM-extracted, loosely-structured documents onto
//! tabular output templates (workbooks), and for keeping the example output
//! skeleton embedded in an extraction instruction synchronized with a
//! configurable field list.
//!
//! ## Core Concepts
//!
//! - **Field Path**: dotted identifier with optional `[]` array markers
//!   (`lignes[].forfait`) naming a target value
//! - **Allowed Tree**: prefix tree compiled from the field list, encoding
//!   which keys and array sections are permitted
//! - **Skeleton**: example JSON structure embedded in the instruction sent
//!   to the extraction model, kept in sync with the configured fields
//! - **Alias Resolution**: layered lookup (exact key, dotted path, separator
//!   rewriting, synonym table) turning a canonical field name into a value
//!   from an unpredictable document, deliberately without deep search
//! - **Repeating Section**: a template region written once per element of a
//!   resolved array, at increasing row offsets, styles preserved
//!
//! ## Example
//!
//! ```rust,ignore
//! use template_binder::*;
//! use serde_json::json;
//!
//! let config: TemplateConfig = serde_json::from_str(&config_json)?;
//!
//! // Keep the instruction skeleton aligned with the configured fields.
//! let instruction = TemplateBinder::new(config.clone()).sync_instruction(&raw_instruction, true);
//!
//! // ... external extraction returns a document ...
//! let mut document = json!({ "client": { "nom": "Acme" } });
//!
//! let mut workbook = Workbook::from_json(&template_json)?;
//! let report = bind_template(&config, &mut workbook, &mut document)?;
//! println!("{} cells filled, {} warnings", report.cells_written, report.warnings.len());
//! ```

pub mod alias;
pub mod allowed_tree;
pub mod error;
pub mod field_path;
pub mod fill;
pub mod padding;
pub mod schema;
pub mod schema_sync;
pub mod workbook;

#[cfg(feature = "mistral")]
pub mod llm;

pub use alias::{alias_candidates, resolve_field, resolve_section_array, section_candidates};
pub use allowed_tree::{build_allowed_tree, AllowedNode};
pub use error::{Result, TemplateBindError};
pub use field_path::{FieldPath, FieldSegment};
pub use fill::{fill_workbook, FillReport};
pub use padding::{pad_sector_arrays, SECTOR_ARRAY_FIELDS};
pub use schema::*;
pub use schema_sync::{
    apply_field_path, ensure_fields, prune_structure, sync_instruction, FIELDS_HEADER,
    STRUCTURE_HEADER,
};
pub use workbook::*;

use log::{debug, info};
use serde_json::Value;

/// Binds extracted documents to one template configuration. Stateless
/// between calls: each binding takes an immutable configuration and one
/// document, so independent binders may run fully in parallel.
pub struct TemplateBinder {
    config: TemplateConfig,
}

impl TemplateBinder {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Synchronizes the skeleton embedded in `instruction` with the
    /// configured fields: every field is ensured present, and with `prune`
    /// the skeleton is also cut down to exactly the configured paths.
    /// Fail-soft: an instruction without a recognizable skeleton is
    /// returned unchanged.
    pub fn sync_instruction(&self, instruction: &str, prune: bool) -> String {
        sync_instruction(instruction, &self.config.field_paths(), prune)
    }

    /// Fills `workbook` from `document`. When a sector count is configured,
    /// the known repeating sections are padded first. Best-effort: a report
    /// is produced unless the configuration itself is invalid.
    pub fn bind(&self, workbook: &mut Workbook, document: &mut Value) -> Result<FillReport> {
        validate_mapping_integrity(&self.config)?;

        info!(
            "Binding extracted document onto template '{}'",
            self.config.template_name
        );
        debug!(
            "Configuration has {} field(s) across {} worksheet mapping(s)",
            self.config.fields.len(),
            self.config.sheets.len()
        );

        if let Some(count) = self.config.sector_count {
            pad_sector_arrays(document, count);
        }

        let report = fill_workbook(workbook, &self.config.sheets, document);

        if !report.warnings.is_empty() {
            debug!("Binding finished with {} warning(s)", report.warnings.len());
        }

        Ok(report)
    }
}

/// One-shot convenience wrapper around [`TemplateBinder::bind`].
pub fn bind_template(
    config: &TemplateConfig,
    workbook: &mut Workbook,
    document: &mut Value,
) -> Result<FillReport> {
    TemplateBinder::new(config.clone()).bind(workbook, document)
}

/// Rejects configurations with unusable mapping targets before any cell is
/// touched. The configuration is first-party data, so a bad address is an
/// error, unlike anything found in the extracted document.
fn validate_mapping_integrity(config: &TemplateConfig) -> Result<()> {
    for sheet in &config.sheets {
        if sheet.sheet.trim().is_empty() {
            return Err(TemplateBindError::ValidationError {
                sheet: sheet.sheet.clone(),
                details: "Worksheet name is empty".to_string(),
            });
        }

        for cell in &sheet.cells {
            for target in &cell.targets {
                if CellAddress::parse(target).is_none() {
                    return Err(TemplateBindError::ValidationError {
                        sheet: sheet.sheet.clone(),
                        details: format!(
                            "Field '{}' has invalid target address '{}'",
                            cell.field, target
                        ),
                    });
                }
            }
        }

        for section in &sheet.sections {
            if section.start_row == 0 {
                return Err(TemplateBindError::ValidationError {
                    sheet: sheet.sheet.clone(),
                    details: format!("Section '{}' has start_row 0 (rows are 1-based)", section.alias),
                });
            }
            for column in section.columns.values() {
                if workbook::column_index(column).is_none() {
                    return Err(TemplateBindError::ValidationError {
                        sheet: sheet.sheet.clone(),
                        details: format!(
                            "Section '{}' maps to invalid column '{}'",
                            section.alias, column
                        ),
                    });
                }
            }
        }
    }

    Ok(())
}
