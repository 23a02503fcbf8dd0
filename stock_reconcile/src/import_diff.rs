//! Import batch diffing: which entries of an incoming batch are new stock.
//!
//! Two passes over the batch:
//! 1. Entries whose normalized name is unknown to the inventory are new.
//!    Known entries have their quantity folded into a per-name running total.
//! 2. Remaining entries are new unless an inventory row stores them as one
//!    face of a split card (`"A // B"`) with the same quantity.
//!
//! The per-name totals are built from an explicit quantity column. A
//! projection without quantity would silently turn every total into zero.

use crate::models::{normalize, ImportLine, InventoryCard};
use std::collections::HashMap;

/// Separator between the faces of split and double-faced card names.
pub const FACE_SEPARATOR: &str = " // ";

/// Receives the diagnostic counts of a diff run.
pub trait DiffObserver {
    fn record_diff(&self, considered: usize, new_entries: usize);
}

/// Writes diff counts to the operational log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DiffObserver for LogObserver {
    fn record_diff(&self, considered: usize, new_entries: usize) {
        log::info!(
            "Import diff: {} inventory rows considered, {} new entries",
            considered,
            new_entries
        );
    }
}

/// Returns the entries of `batch` not already accounted for by `inventory`,
/// in batch order and without repeats.
pub fn new_entries(
    batch: &[ImportLine],
    inventory: &[InventoryCard],
    observer: &dyn DiffObserver,
) -> Vec<ImportLine> {
    let mut known: HashMap<String, i64> = HashMap::new();
    for card in inventory {
        *known.entry(normalize(&card.name)).or_insert(0) += card.quantity;
    }

    let mut is_new = vec![false; batch.len()];
    for (flag, line) in is_new.iter_mut().zip(batch) {
        match known.get_mut(&normalize(&line.name)) {
            Some(total) => *total += line.quantity,
            None => *flag = true,
        }
    }

    let composites: Vec<(String, i64)> = inventory
        .iter()
        .map(|card| (normalize(&card.name), card.quantity))
        .filter(|(name, _)| name.contains(FACE_SEPARATOR))
        .collect();

    for (flag, line) in is_new.iter_mut().zip(batch) {
        if *flag {
            continue;
        }
        if !is_split_face(&composites, line) {
            *flag = true;
        }
    }

    let result: Vec<ImportLine> = batch
        .iter()
        .zip(&is_new)
        .filter(|(_, flag)| **flag)
        .map(|(line, _)| line.clone())
        .collect();

    observer.record_diff(inventory.len(), result.len());
    result
}

/// True if some composite inventory name carries `line` as a face with the
/// same quantity.
fn is_split_face(composites: &[(String, i64)], line: &ImportLine) -> bool {
    let face = normalize(&line.name);
    let front = format!("{face}{FACE_SEPARATOR}");
    let back = format!("{FACE_SEPARATOR}{face}");
    composites.iter().any(|(name, quantity)| {
        (name.contains(&front) || name.contains(&back)) && *quantity == line.quantity
    })
}
