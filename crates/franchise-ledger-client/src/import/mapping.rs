//! Location → franchise code lookup over the active KitchenMapping rows.
//!
//! Resolution order: exact text, then case-folded text, then a fuzzy pass.
//! The fuzzy pass first compares alphanumeric-only keys, then falls back to
//! substring containment in either direction; the longest mapped location
//! wins and a tie between different codes resolves to nothing.

use tracing::info;

use crate::ledger::Ledger;
use crate::records::{KitchenMapping, format_flag, read_kitchen_mappings};
use crate::schema::col;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchKind {
    Exact,
    CaseFolded,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedLocation<'a> {
    pub(crate) mapping: &'a KitchenMapping,
    pub(crate) kind: MatchKind,
}

pub(crate) struct LocationResolver {
    entries: Vec<Entry>,
}

struct Entry {
    mapping: KitchenMapping,
    folded: String,
    key: String,
}

impl LocationResolver {
    pub(crate) fn new(mappings: Vec<KitchenMapping>) -> Self {
        let entries = mappings
            .into_iter()
            .filter(|mapping| mapping.active && !mapping.franchise_code.trim().is_empty())
            .map(|mapping| Entry {
                folded: fold(&mapping.location),
                key: alphanumeric_key(&mapping.location),
                mapping,
            })
            .collect();
        Self { entries }
    }

    pub(crate) fn resolve(&self, location: &str) -> Option<ResolvedLocation<'_>> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.mapping.location.trim() == trimmed)
        {
            return Some(entry.resolved(MatchKind::Exact));
        }

        let folded = fold(trimmed);
        if let Some(entry) = self.entries.iter().find(|entry| entry.folded == folded) {
            return Some(entry.resolved(MatchKind::CaseFolded));
        }

        let key = alphanumeric_key(trimmed);
        if key.is_empty() {
            return None;
        }
        if let Some(entry) = self.entries.iter().find(|entry| entry.key == key) {
            return Some(entry.resolved(MatchKind::Fuzzy));
        }

        let containing = self
            .entries
            .iter()
            .filter(|entry| {
                !entry.key.is_empty() && (entry.key.contains(&key) || key.contains(&entry.key))
            })
            .collect::<Vec<&Entry>>();
        let longest = containing.iter().map(|entry| entry.key.len()).max()?;
        let mut best = containing
            .into_iter()
            .filter(|entry| entry.key.len() == longest);
        let first = best.next()?;
        if best.any(|other| fold(&other.mapping.franchise_code) != fold(&first.mapping.franchise_code)) {
            return None;
        }
        Some(first.resolved(MatchKind::Fuzzy))
    }
}

impl Entry {
    fn resolved(&self, kind: MatchKind) -> ResolvedLocation<'_> {
        ResolvedLocation {
            mapping: &self.mapping,
            kind,
        }
    }
}

fn fold(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ").to_lowercase()
}

fn alphanumeric_key(value: &str) -> String {
    value
        .chars()
        .filter(|character| character.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Appends a KitchenMapping row. An active mapping may not repeat the
/// case-folded location of another active mapping.
pub fn add_kitchen_mapping(ledger: &Ledger<'_>, mapping: &KitchenMapping) -> ClientResult<usize> {
    let location = mapping.location.trim();
    let franchise_code = mapping.franchise_code.trim();
    if location.is_empty() || franchise_code.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Both location and franchise code are required.",
            Some("mapping add"),
        ));
    }

    let sheet = &ledger.sheets().kitchen_mapping;
    let existing = read_kitchen_mappings(ledger.store(), sheet)?;
    let folded = fold(location);
    if mapping.active
        && existing
            .records
            .iter()
            .any(|current| current.active && fold(&current.location) == folded)
    {
        return Err(ClientError::invalid_argument_for_command(
            &format!("An active mapping for location `{location}` already exists."),
            Some("mapping add"),
        ));
    }

    let mut values = vec![
        (col::LOCATION, location.to_string()),
        (col::FRANCHISE_CODE, franchise_code.to_string()),
        (col::ACTIVE, format_flag(mapping.active)),
    ];
    if let Some(name) = mapping.franchise_name.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        values.push((col::FRANCHISE_NAME, name.to_string()));
    }
    if let Some(notes) = mapping.notes.as_deref().map(str::trim).filter(|notes| !notes.is_empty()) {
        values.push((col::NOTES, notes.to_string()));
    }

    let row_index = ledger
        .store()
        .append_row(sheet, &existing.schema.build_row(&values))?;
    info!(location, franchise_code, row_index, "kitchen mapping added");
    Ok(row_index)
}

/// Dedup form of a location: trimmed, case-folded, inner whitespace collapsed.
pub(crate) fn normalize_location(value: &str) -> String {
    fold(value)
}

#[cfg(test)]
mod tests {
    use super::{LocationResolver, MatchKind, add_kitchen_mapping};
    use crate::config::LedgerConfig;
    use crate::ledger::Ledger;
    use crate::records::KitchenMapping;
    use crate::schema::KITCHEN_MAPPING;
    use crate::store::MemorySheetStore;

    fn mapping(location: &str, code: &str, active: bool) -> KitchenMapping {
        KitchenMapping {
            location: location.to_string(),
            franchise_code: code.to_string(),
            franchise_name: None,
            active,
            notes: None,
        }
    }

    fn resolver() -> LocationResolver {
        LocationResolver::new(vec![
            mapping("Downtown", "FR-01", true),
            mapping("Harbour Front", "FR-02", true),
            mapping("Airport", "FR-03", false),
            mapping("Mall North", "FR-04", true),
            mapping("Mall South", "FR-05", true),
        ])
    }

    fn code_and_kind(resolver: &LocationResolver, location: &str) -> Option<(String, MatchKind)> {
        resolver
            .resolve(location)
            .map(|found| (found.mapping.franchise_code.clone(), found.kind))
    }

    #[test]
    fn exact_then_case_folded_then_fuzzy() {
        let resolver = resolver();
        assert_eq!(
            code_and_kind(&resolver, "Downtown"),
            Some(("FR-01".to_string(), MatchKind::Exact))
        );
        assert_eq!(
            code_and_kind(&resolver, "harbour   FRONT"),
            Some(("FR-02".to_string(), MatchKind::CaseFolded))
        );
        assert_eq!(
            code_and_kind(&resolver, "Harbour-Front"),
            Some(("FR-02".to_string(), MatchKind::Fuzzy))
        );
        assert_eq!(
            code_and_kind(&resolver, "Downtown Kitchen #2"),
            Some(("FR-01".to_string(), MatchKind::Fuzzy))
        );
    }

    #[test]
    fn inactive_and_tied_mappings_do_not_resolve() {
        let resolver = resolver();
        assert_eq!(code_and_kind(&resolver, "Airport"), None);
        assert_eq!(code_and_kind(&resolver, "Mall"), None);
        assert_eq!(code_and_kind(&resolver, "Main St"), None);
    }

    #[test]
    fn adding_a_second_active_mapping_for_a_location_fails() {
        let store = MemorySheetStore::new();
        store.seed("KitchenMapping", vec![KITCHEN_MAPPING.default_header()]);
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);

        let first = add_kitchen_mapping(&ledger, &mapping(" Main St ", "FR-09", true));
        assert!(matches!(first, Ok(1)));
        let second = add_kitchen_mapping(&ledger, &mapping("main st", "FR-10", true));
        assert!(matches!(second, Err(error) if error.code == "invalid_argument"));
        let retired = add_kitchen_mapping(&ledger, &mapping("main st", "FR-01", false));
        assert!(matches!(retired, Ok(2)));

        let rows = store.rows("KitchenMapping");
        assert_eq!(rows[1][0], "Main St");
        assert_eq!(rows[2][3], "FALSE");
    }
}
