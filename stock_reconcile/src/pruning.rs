//! Stale-row detection against a canonical import.
//!
//! Full-replace diff: a row survives only if the canonical import holds an
//! entry with the same name, expansion and exact quantity. Name and
//! expansion are compared trimmed and case-folded; returned rows keep their
//! stored values.

use crate::models::{normalize, normalize_opt, ImportLine, InventoryCard};
use std::collections::HashSet;

/// Comparison key of the full-replace diff: normalized name, normalized
/// expansion (absent reads as empty) and exact quantity.
pub type StockKey = (String, String, i64);

pub fn line_key(line: &ImportLine) -> StockKey {
    (
        normalize(&line.name),
        normalize_opt(line.expansion_name.as_deref()),
        line.quantity,
    )
}

pub fn card_key(card: &InventoryCard) -> StockKey {
    (
        normalize(&card.name),
        normalize_opt(card.expansion_name.as_deref()),
        card.quantity,
    )
}

/// Returns the inventory rows with no exact counterpart in `canonical`.
pub fn stale_rows(canonical: &[ImportLine], inventory: &[InventoryCard]) -> Vec<InventoryCard> {
    let truth: HashSet<StockKey> = canonical.iter().map(line_key).collect();

    let stale: Vec<InventoryCard> = inventory
        .iter()
        .filter(|card| !truth.contains(&card_key(card)))
        .cloned()
        .collect();

    log::debug!(
        "{} of {} inventory rows are stale against {} canonical entries",
        stale.len(),
        inventory.len(),
        canonical.len()
    );
    stale
}
