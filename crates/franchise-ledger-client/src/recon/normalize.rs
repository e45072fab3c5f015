/// Canonical form of an invoice number for matching: every `#` removed,
/// surrounding whitespace trimmed, lowercased.
///
/// Apply to both sides of a comparison. Comparing a normalized key against a
/// raw cell is the usual way matches go missing.
pub fn normalize_invoice_number(raw: &str) -> String {
    raw.replace('#', "").trim().to_lowercase()
}
