//! Layered resolution of a canonical field name against an extracted
//! document of unknown shape.
//!
//! Resolution stops at the static synonym table. There is deliberately no
//! recursive search-everywhere fallback: a common key like `nom` must not
//! bind to whichever entity happens to carry it first (a supplier's name is
//! not the contact's name). A field missing from the table stays unfilled;
//! extending the table is the only supported fix.

use serde_json::Value;

/// Canonical field names mapped to ordered candidate dotted paths.
/// Earlier candidates win.
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("client_nom", &["client.nom", "client.raison_sociale", "societe.nom"]),
    ("client_adresse", &["client.adresse", "societe.adresse", "site.adresse"]),
    ("client_siret", &["client.siret", "societe.siret"]),
    ("contact_nom", &["client.nom", "contact.nom", "contacts.0.nom"]),
    ("contact_prenom", &["client.prenom", "contact.prenom", "contacts.0.prenom"]),
    ("contact_email", &["client.email", "contact.email", "contacts.0.email"]),
    (
        "contact_telephone",
        &["client.telephone", "contact.telephone", "contacts.0.telephone"],
    ),
    ("fournisseur_nom", &["fournisseur.nom", "operateur.nom", "operateur"]),
    ("date_facture", &["facture.date", "facture.date_emission", "date"]),
    ("numero_facture", &["facture.numero", "facture.reference"]),
    ("periode_facturation", &["facture.periode", "periode"]),
    ("montant_ht", &["facture.montant_ht", "facture.total_ht", "totaux.ht"]),
    ("montant_ttc", &["facture.montant_ttc", "facture.total_ttc", "totaux.ttc"]),
    ("montant_tva", &["facture.montant_tva", "facture.tva", "totaux.tva"]),
];

/// Common repeating-section aliases mapped to ordered candidate paths,
/// tried by the fill engine when the primary resolution of a section alias
/// does not yield an array.
const SECTION_ALIASES: &[(&str, &[&str])] = &[
    ("lignes_mobiles", &["lignes.mobiles", "mobiles", "parc.mobile"]),
    ("lignes_fixes", &["lignes.fixes", "fixes", "parc.fixe"]),
    ("lignes_internet", &["lignes.internet", "internet", "acces_internet"]),
    ("materiels", &["materiels", "equipements", "materiel"]),
];

pub fn alias_candidates(field: &str) -> Option<&'static [&'static str]> {
    FIELD_ALIASES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, candidates)| *candidates)
}

pub fn section_candidates(alias: &str) -> Option<&'static [&'static str]> {
    SECTION_ALIASES
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, candidates)| *candidates)
}

/// Resolves `field` against `document`. Layers, first usable match wins:
///
/// 1. exact top-level key;
/// 2. `field` as a literal dotted path (numeric segments index arrays);
/// 3. the same lookup with separators rewritten: underscores to dots for a
///    nested lookup, dots to underscores for a flat top-level key;
/// 4. the static synonym table, candidates in order.
///
/// `null` never counts as a match. The document is never mutated.
pub fn resolve_field<'a>(document: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(field).filter(|v| !v.is_null()) {
        return Some(value);
    }

    if let Some(value) = lookup_path(document, field) {
        return Some(value);
    }

    if field.contains('_') {
        let dotted = field.replace('_', ".");
        if let Some(value) = lookup_path(document, &dotted) {
            return Some(value);
        }
    }
    if field.contains('.') {
        let flat = field.replace('.', "_");
        if let Some(value) = document.get(&flat).filter(|v| !v.is_null()) {
            return Some(value);
        }
    }

    let candidates = alias_candidates(field)?;
    candidates
        .iter()
        .filter_map(|candidate| lookup_path(document, candidate))
        .find(|value| value.as_str() != Some(""))
}

/// Resolves a repeating-section alias to a non-empty array: first through
/// [`resolve_field`], then through the section-alias table. Empty arrays
/// count as "no match" so a later candidate can still win.
pub fn resolve_section_array<'a>(document: &'a Value, alias: &str) -> Option<&'a Vec<Value>> {
    if let Some(items) = resolve_field(document, alias)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
    {
        return Some(items);
    }

    let candidates = section_candidates(alias)?;
    candidates
        .iter()
        .filter_map(|candidate| lookup_path(document, candidate))
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
}

/// Dotted-path lookup against nested containers. Purely numeric segments
/// index arrays. Returns `None` for `null` results so callers can fall
/// through to the next layer.
fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}
