//! Duplicate detection over an inventory snapshot.

use crate::models::InventoryCard;
use std::collections::HashMap;

/// Full identity of a row. Two rows sharing it describe the same stock.
#[derive(Debug, PartialEq, Eq, Hash)]
struct IdentityKey<'a> {
    name: &'a str,
    language: &'a str,
    expansion_name: Option<&'a str>,
    card_number: &'a str,
    quantity: i64,
    foil: bool,
}

impl<'a> IdentityKey<'a> {
    fn of(card: &'a InventoryCard) -> Self {
        Self {
            name: &card.name,
            language: &card.language,
            expansion_name: card.expansion_name.as_deref(),
            card_number: &card.card_number,
            quantity: card.quantity,
            foil: card.foil,
        }
    }
}

/// Returns the redundant rows of `inventory`.
///
/// The first row of each identity cluster (in snapshot order) is kept; every
/// later member is reported. Clusters are emitted in discovery order.
pub fn find_duplicates(inventory: &[InventoryCard]) -> Vec<InventoryCard> {
    let mut cluster_of: HashMap<IdentityKey<'_>, usize> = HashMap::new();
    let mut clusters: Vec<Vec<&InventoryCard>> = Vec::new();

    for card in inventory {
        let index = *cluster_of.entry(IdentityKey::of(card)).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[index].push(card);
    }

    let duplicates: Vec<InventoryCard> = clusters
        .iter()
        .filter(|members| members.len() > 1)
        .flat_map(|members| members.iter().skip(1).map(|card| (*card).clone()))
        .collect();

    if !duplicates.is_empty() {
        log::debug!(
            "Found {} duplicate rows in {} inventory rows",
            duplicates.len(),
            inventory.len()
        );
    }
    duplicates
}
