//! Want-list reconciliation against on-hand stock.
//!
//! Names are compared exactly as stored, without trimming or case folding.
//! Only the first inventory row carrying a name is consulted, so the same
//! card spread over several expansions or finishes is not summed.

use crate::models::{FilteredCard, ImportLine, InventoryCard};
use serde::Serialize;
use std::collections::HashMap;

/// Want-list entries split into satisfiable and lacking ones.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WantListReport {
    pub found: Vec<FilteredCard>,
    pub missing: Vec<FilteredCard>,
}

/// Splits `want_list` into found and missing entries.
///
/// - No row with the name: missing with quantity 1, whatever was requested.
/// - Requested more than the first row has available: missing with the deficit.
/// - Otherwise: found with the requested quantity.
///
/// Both lists are sorted by name (ordinal).
pub fn reconcile(want_list: &[ImportLine], inventory: &[InventoryCard]) -> WantListReport {
    let mut report = WantListReport::default();
    if want_list.is_empty() {
        return report;
    }

    let mut first_by_name: HashMap<&str, &InventoryCard> = HashMap::new();
    for card in inventory {
        first_by_name.entry(card.name.as_str()).or_insert(card);
    }

    for line in want_list {
        match first_by_name.get(line.name.as_str()) {
            None => report.missing.push(FilteredCard {
                name: line.name.clone(),
                quantity: 1,
            }),
            Some(card) => {
                let available = card.available();
                if line.quantity > available {
                    report.missing.push(FilteredCard {
                        name: line.name.clone(),
                        quantity: line.quantity - available,
                    });
                } else {
                    report.found.push(FilteredCard {
                        name: line.name.clone(),
                        quantity: line.quantity,
                    });
                }
            }
        }
    }

    report.found.sort_by(|a, b| a.name.cmp(&b.name));
    report.missing.sort_by(|a, b| a.name.cmp(&b.name));

    log::debug!(
        "Want-list reconciled: {} found, {} missing",
        report.found.len(),
        report.missing.len()
    );
    report
}
