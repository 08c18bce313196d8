use serde_json::{json, Value};
use std::collections::BTreeMap;
use template_binder::*;

fn audit_config() -> TemplateConfig {
    TemplateConfig {
        template_name: "Audit télécom multi-sites".to_string(),
        fields: vec![
            "client.nom".to_string(),
            "client.siret".to_string(),
            "fournisseur.nom".to_string(),
            "lignes[].numero".to_string(),
            "lignes[].forfait".to_string(),
            "lignes[].tarif".to_string(),
            "materiels[]".to_string(),
        ],
        sheets: vec![
            SheetMapping {
                sheet: "Synthese".to_string(),
                cells: vec![
                    CellMapping {
                        field: "client_nom".to_string(),
                        targets: vec!["B2".to_string(), "B20".to_string()],
                    },
                    CellMapping {
                        field: "client_siret".to_string(),
                        targets: vec!["B3".to_string()],
                    },
                    CellMapping {
                        field: "fournisseur_nom".to_string(),
                        targets: vec!["B4".to_string()],
                    },
                    CellMapping {
                        field: "montant_ttc".to_string(),
                        targets: vec!["B5".to_string()],
                    },
                ],
                sections: vec![],
            },
            SheetMapping {
                sheet: "Lignes".to_string(),
                cells: vec![],
                sections: vec![SectionMapping {
                    alias: "lignes_mobiles".to_string(),
                    start_row: 3,
                    columns: BTreeMap::from([
                        ("numero".to_string(), "A".to_string()),
                        ("forfait".to_string(), "B".to_string()),
                        ("tarif".to_string(), "C".to_string()),
                    ]),
                }],
            },
        ],
        sector_count: None,
    }
}

fn audit_template() -> Workbook {
    let raw = json!({
        "sheets": {
            "Synthese": {
                "cells": {
                    "A2": { "value": { "type": "text", "value": "Client" } },
                    "B2": { "value": { "type": "empty" }, "style": { "font": "bold" } },
                    "B5": {
                        "value": { "type": "empty" },
                        "style": { "number_format": "#,##0.00 €" }
                    }
                }
            },
            "Lignes": {
                "cells": {
                    "A2": { "value": { "type": "text", "value": "Numéro" } },
                    "B2": { "value": { "type": "text", "value": "Forfait" } },
                    "C2": { "value": { "type": "text", "value": "Tarif" } }
                }
            }
        }
    });
    Workbook::from_json(&raw.to_string()).expect("template parses")
}

fn extracted_document() -> Value {
    json!({
        "client": { "nom": "Transports Bernard", "siret": "552 100 554 00013" },
        "fournisseur": { "nom": "Orange Business" },
        "facture": { "montant_ttc": 1847.32 },
        "lignes": {
            "mobiles": [
                { "numero": "0612345678", "forfait": "Pro 80Go", "tarif": 24.9 },
                { "numero": "0687654321", "forfait": "Eco 5Go", "tarif": 9.9 },
                { "numero": "0611223344", "forfait": "Pro 80Go", "tarif": 24.9 }
            ]
        }
    })
}

fn text_of(workbook: &Workbook, sheet: &str, addr: &str) -> Option<String> {
    let address = CellAddress::parse(addr)?;
    match workbook.sheet(sheet)?.value(&address)? {
        CellValue::Text(text) => Some(text.clone()),
        _ => None,
    }
}

fn number_of(workbook: &Workbook, sheet: &str, addr: &str) -> Option<f64> {
    let address = CellAddress::parse(addr)?;
    match workbook.sheet(sheet)?.value(&address)? {
        CellValue::Number(n) => Some(*n),
        _ => None,
    }
}

#[test]
fn test_full_audit_binding() -> anyhow::Result<()> {
    let config = audit_config();
    let mut workbook = audit_template();
    let mut document = extracted_document();

    let report = bind_template(&config, &mut workbook, &mut document)?;

    // Scalars, including a field written to two targets.
    assert_eq!(
        text_of(&workbook, "Synthese", "B2").as_deref(),
        Some("Transports Bernard")
    );
    assert_eq!(
        text_of(&workbook, "Synthese", "B20").as_deref(),
        Some("Transports Bernard")
    );
    assert_eq!(
        text_of(&workbook, "Synthese", "B3").as_deref(),
        Some("552 100 554 00013")
    );
    assert_eq!(
        text_of(&workbook, "Synthese", "B4").as_deref(),
        Some("Orange Business")
    );
    assert_eq!(number_of(&workbook, "Synthese", "B5"), Some(1847.32));

    // Repeating section rows at increasing offsets.
    assert_eq!(text_of(&workbook, "Lignes", "A3").as_deref(), Some("0612345678"));
    assert_eq!(text_of(&workbook, "Lignes", "B4").as_deref(), Some("Eco 5Go"));
    assert_eq!(number_of(&workbook, "Lignes", "C5"), Some(24.9));
    assert_eq!(report.rows_written, 3);

    // Header cells the mapping never names are untouched.
    assert_eq!(text_of(&workbook, "Lignes", "A2").as_deref(), Some("Numéro"));
    Ok(())
}

#[test]
fn test_styles_survive_binding() {
    let config = audit_config();
    let mut workbook = audit_template();
    let mut document = extracted_document();

    bind_template(&config, &mut workbook, &mut document).unwrap();

    let synthese = workbook.sheet("Synthese").unwrap();
    let b2 = synthese.cell(&CellAddress::parse("B2").unwrap()).unwrap();
    assert_eq!(b2.style.font.as_deref(), Some("bold"));

    let b5 = synthese.cell(&CellAddress::parse("B5").unwrap()).unwrap();
    assert_eq!(b5.style.number_format.as_deref(), Some("#,##0.00 €"));
    assert_eq!(b5.value, CellValue::Number(1847.32));
}

#[test]
fn test_binding_is_best_effort_on_sparse_documents() {
    let config = audit_config();
    let mut workbook = audit_template();
    // No supplier, no invoice, no lines.
    let mut document = json!({ "client": { "nom": "Transports Bernard" } });

    let report = bind_template(&config, &mut workbook, &mut document).unwrap();

    assert_eq!(
        text_of(&workbook, "Synthese", "B2").as_deref(),
        Some("Transports Bernard")
    );
    // The missing section produced a warning, not a failure.
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("lignes_mobiles")));
    assert!(number_of(&workbook, "Synthese", "B5").is_none());
}

#[test]
fn test_sector_padding_guarantees_rows() {
    let mut config = audit_config();
    config.sector_count = Some(3);

    let mut workbook = audit_template();
    let mut document = json!({
        "client": { "nom": "Transports Bernard" },
        "lignes_mobiles": [{ "numero": "0612345678", "forfait": "Pro 80Go", "tarif": 24.9 }]
    });

    let report = bind_template(&config, &mut workbook, &mut document).unwrap();

    // The single real line was written; the padding rows exist in the
    // document but contribute no cells.
    assert_eq!(document["lignes_mobiles"].as_array().unwrap().len(), 3);
    assert_eq!(report.rows_written, 1);
    assert_eq!(text_of(&workbook, "Lignes", "B3").as_deref(), Some("Pro 80Go"));
    assert!(text_of(&workbook, "Lignes", "B4").is_none());
}

#[test]
fn test_padding_never_truncates_real_data() {
    let mut document = json!({ "materiels": [{}, {}, {}] });
    pad_sector_arrays(&mut document, 2);
    assert_eq!(document["materiels"].as_array().unwrap().len(), 3);
}

#[test]
fn test_template_parse_failure_is_fatal() {
    let result = Workbook::from_json("not a workbook");
    assert!(matches!(result, Err(TemplateBindError::TemplateParse(_))));
}

const INSTRUCTION: &str = "Analyse les factures jointes et extrais les informations suivantes.\n\n\
    Structure de sortie attendue :\n\n{}\n\n\
    Champs à extraire : uniquement ceux de la structure ci-dessus.\n";

#[test]
fn test_instruction_sync_round_trip() {
    let config = TemplateConfig {
        fields: vec!["client.nom".to_string(), "lignes[].forfait".to_string()],
        ..Default::default()
    };
    let binder = TemplateBinder::new(config);

    let synced = binder.sync_instruction(INSTRUCTION, false);

    // Ensure-present inserted both paths with placeholders.
    let skeleton = embedded_skeleton(&synced);
    assert_eq!(skeleton["client"]["nom"], json!("..."));
    assert_eq!(skeleton["lignes"][0]["forfait"], json!("..."));

    // Syncing again, with prune, changes nothing.
    let again = binder.sync_instruction(&synced, true);
    assert_eq!(embedded_skeleton(&again), skeleton);
}

#[test]
fn test_instruction_sync_prunes_removed_fields() {
    let full_config = TemplateConfig {
        fields: vec![
            "client.nom".to_string(),
            "client.siret".to_string(),
            "lignes[].forfait".to_string(),
        ],
        ..Default::default()
    };
    let synced = TemplateBinder::new(full_config).sync_instruction(INSTRUCTION, false);

    // The operator deconfigures siret and the whole lines section.
    let trimmed_config = TemplateConfig {
        fields: vec!["client.nom".to_string()],
        ..Default::default()
    };
    let resynced = TemplateBinder::new(trimmed_config).sync_instruction(&synced, true);

    let skeleton = embedded_skeleton(&resynced);
    assert_eq!(skeleton, json!({ "client": { "nom": "..." } }));

    // The surrounding prose is untouched.
    assert!(resynced.starts_with("Analyse les factures jointes"));
    assert!(resynced.contains("Champs à extraire"));
}

#[test]
fn test_instruction_without_skeleton_passes_through() {
    let config = TemplateConfig {
        fields: vec!["client.nom".to_string()],
        ..Default::default()
    };
    let instruction = "Une consigne libre sans structure embarquée.";
    assert_eq!(
        TemplateBinder::new(config).sync_instruction(instruction, true),
        instruction
    );
}

#[test]
fn test_alias_layers_against_heterogeneous_documents() {
    // Flat snake_case document.
    let doc = json!({ "client_nom": "Acme" });
    assert_eq!(resolve_field(&doc, "client.nom"), Some(&json!("Acme")));

    // Nested document through the synonym table.
    let doc = json!({ "client": { "nom": "Dupont" } });
    assert_eq!(resolve_field(&doc, "contact_nom"), Some(&json!("Dupont")));

    // No entry, no deep search: unresolved.
    let doc = json!({ "fournisseur": { "nom": "Orange" }, "client": {} });
    assert_eq!(resolve_field(&doc, "nom"), None);
}

fn embedded_skeleton(instruction: &str) -> Value {
    let start = instruction
        .find(STRUCTURE_HEADER)
        .and_then(|h| instruction[h..].find('{').map(|b| h + b))
        .expect("structure header and brace");
    let fields = start + instruction[start..].find(FIELDS_HEADER).expect("fields header");
    let end = start + instruction[start..fields].rfind('}').expect("closing brace") + 1;
    serde_json::from_str(&instruction[start..end]).expect("skeleton parses")
}
