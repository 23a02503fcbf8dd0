//! Keyset pagination over a filtered inventory view.
//!
//! Pages are addressed by the last identity seen rather than an offset, so
//! the cost of a page does not grow with the number of pages before it.
//! A `next_cursor` of `0` means the page was empty.

use crate::models::{CardFilter, InventoryCard};
use serde::Serialize;

/// Cursor value that starts a listing.
pub const START_CURSOR: i64 = 0;

/// One page of inventory rows.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<InventoryCard>,
    pub next_cursor: i64,
}

impl Page {
    /// Builds a page from its rows, deriving the cursor from the last one.
    pub fn from_items(items: Vec<InventoryCard>) -> Self {
        let next_cursor = items.last().map_or(START_CURSOR, |card| card.id);
        Self { items, next_cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Returns up to `page_size` rows matching `filter` with an id greater than
/// `cursor`, ascending by id.
pub fn paginate(
    inventory: &[InventoryCard],
    cursor: i64,
    page_size: usize,
    filter: &CardFilter,
) -> Page {
    let mut matching: Vec<&InventoryCard> = inventory
        .iter()
        .filter(|card| card.id > cursor && filter.matches(card))
        .collect();
    // Only the lowest `page_size` ids need ordering
    if matching.len() > page_size {
        matching.select_nth_unstable_by_key(page_size, |card| card.id);
        matching.truncate(page_size);
    }
    matching.sort_unstable_by_key(|card| card.id);

    Page::from_items(matching.into_iter().cloned().collect())
}
