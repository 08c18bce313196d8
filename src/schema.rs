use crate::field_path::FieldPath;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-template binding configuration: the configured field list plus the
/// cell/column mappings of every worksheet. Read-only during a fill.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct TemplateConfig {
    #[schemars(description = "Display name of the output template this configuration belongs to")]
    pub template_name: String,

    #[schemars(
        description = "Ordered field paths to extract, dotted with optional [] array markers (e.g. 'client.nom', 'lignes[].forfait'). Deduplicated by the caller; empty entries are ignored."
    )]
    #[serde(default)]
    pub fields: Vec<String>,

    #[schemars(description = "Cell and section mappings, one entry per worksheet")]
    #[serde(default)]
    pub sheets: Vec<SheetMapping>,

    #[schemars(
        description = "Number of customer sectors (sites). When set and greater than 1, known repeating sections are padded with empty placeholder rows up to this count before filling. Never truncates existing data."
    )]
    #[serde(default)]
    pub sector_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct SheetMapping {
    #[schemars(description = "Worksheet name this mapping targets")]
    pub sheet: String,

    #[schemars(description = "Scalar mappings: one extracted field written to one or more cells")]
    #[serde(default)]
    pub cells: Vec<CellMapping>,

    #[schemars(description = "Repeating sections: one array written row by row from a start offset")]
    #[serde(default)]
    pub sections: Vec<SectionMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CellMapping {
    #[schemars(
        description = "Canonical field name resolved against the extracted document (exact key, dotted path, separator rewriting, then the synonym table)"
    )]
    pub field: String,

    #[schemars(description = "Target cell addresses in A1 notation (e.g. 'B4'). All targets receive the same value.")]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionMapping {
    #[schemars(
        description = "Alias naming the array to bind (e.g. 'lignes_mobiles'). Resolved like a field; common section aliases have a dedicated fallback table."
    )]
    pub alias: String,

    #[schemars(description = "1-based row the first array element is written to")]
    pub start_row: u32,

    #[schemars(
        description = "Item field name to column letter (e.g. 'forfait' -> 'B'). Item fields are read directly from each element, no alias fallback."
    )]
    pub columns: BTreeMap<String, String>,
}

impl TemplateConfig {
    /// Parsed field paths, with empty/whitespace-only entries skipped.
    pub fn field_paths(&self) -> Vec<FieldPath> {
        self.fields
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| FieldPath::parse(raw))
            .collect()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TemplateConfig)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = TemplateConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("template_name"));
        assert!(schema_json.contains("sector_count"));
        assert!(schema_json.contains("start_row"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = TemplateConfig {
            template_name: "Audit télécom".to_string(),
            fields: vec!["client.nom".to_string(), "lignes[].forfait".to_string()],
            sheets: vec![SheetMapping {
                sheet: "Synthese".to_string(),
                cells: vec![CellMapping {
                    field: "client_nom".to_string(),
                    targets: vec!["B2".to_string()],
                }],
                sections: vec![SectionMapping {
                    alias: "lignes_mobiles".to_string(),
                    start_row: 5,
                    columns: BTreeMap::from([("forfait".to_string(), "B".to_string())]),
                }],
            }],
            sector_count: Some(3),
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: TemplateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.template_name, "Audit télécom");
        assert_eq!(parsed.sheets[0].sections[0].start_row, 5);
    }

    #[test]
    fn test_field_paths_skip_blank_entries() {
        let config = TemplateConfig {
            fields: vec![
                "client.nom".to_string(),
                "".to_string(),
                "   ".to_string(),
                "lignes[].forfait".to_string(),
            ],
            ..Default::default()
        };

        let paths = config.field_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].segments[0].is_array);
    }
}
