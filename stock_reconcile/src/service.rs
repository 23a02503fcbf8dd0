//! Request-level workflows: fetch a snapshot, run the engine, commit the result.
//!
//! Store failures propagate unchanged; nothing is retried. Each write goes
//! through a single store call, so a failed call commits nothing of that batch.

use crate::availability::{reconcile, WantListReport};
use crate::duplicates::find_duplicates;
use crate::error::Result;
use crate::import_diff::{new_entries, DiffObserver, LogObserver};
use crate::models::{CardFilter, ImportLine, InventoryCard};
use crate::pagination::Page;
use crate::pruning::{card_key, line_key, stale_rows, StockKey};
use crate::store::{CardStore, Projection};
use serde::Serialize;
use std::collections::HashSet;

/// Counts from a canonical sync run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// New entries inserted from the canonical import
    pub inserted: usize,
    /// Rows removed because the canonical import no longer has them
    pub pruned: usize,
    /// Redundant rows removed afterwards
    pub deduplicated: usize,
}

pub struct InventoryService<S: CardStore> {
    store: S,
    observer: Box<dyn DiffObserver>,
}

impl<S: CardStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self::with_observer(store, Box::new(LogObserver))
    }

    pub fn with_observer(store: S, observer: Box<dyn DiffObserver>) -> Self {
        Self { store, observer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks a want-list against current stock. Absent or empty input
    /// returns an empty report without reading the store.
    pub fn compare_want_list(&self, want_list: Option<&[ImportLine]>) -> Result<WantListReport> {
        let want_list = match want_list {
            Some(lines) if !lines.is_empty() => lines,
            _ => return Ok(WantListReport::default()),
        };
        let inventory = self.store.fetch_all(Projection::Full)?;
        Ok(reconcile(want_list, &inventory))
    }

    /// Inserts the entries of `batch` that are new stock and returns them.
    pub fn import(&mut self, batch: &[ImportLine]) -> Result<Vec<InventoryCard>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let inventory = self.store.fetch_all(Projection::Matching)?;
        let cards: Vec<InventoryCard> = new_entries(batch, &inventory, self.observer.as_ref())
            .iter()
            .map(ImportLine::to_inventory_card)
            .collect();
        if !cards.is_empty() {
            self.store.insert_many(&cards)?;
        }
        Ok(cards)
    }

    /// Rows that `canonical` no longer reflects, without removing them.
    pub fn stale(&self, canonical: &[ImportLine]) -> Result<Vec<InventoryCard>> {
        let inventory = self.store.fetch_all(Projection::Full)?;
        Ok(stale_rows(canonical, &inventory))
    }

    /// Removes the rows that `canonical` no longer reflects and returns them.
    pub fn prune(&mut self, canonical: &[ImportLine]) -> Result<Vec<InventoryCard>> {
        let stale = self.stale(canonical)?;
        if !stale.is_empty() {
            self.store.remove_many(&stale)?;
        }
        Ok(stale)
    }

    /// Redundant rows, without removing them.
    pub fn duplicates(&self) -> Result<Vec<InventoryCard>> {
        let inventory = self.store.fetch_all(Projection::Full)?;
        Ok(find_duplicates(&inventory))
    }

    /// Removes redundant rows and returns them.
    pub fn deduplicate(&mut self) -> Result<Vec<InventoryCard>> {
        let duplicates = self.duplicates()?;
        if !duplicates.is_empty() {
            self.store.remove_many(&duplicates)?;
        }
        Ok(duplicates)
    }

    /// Brings the inventory in line with a fresh canonical import:
    /// prune stale rows, insert what the surviving rows do not already
    /// hold, then drop duplicates.
    ///
    /// A canonical entry whose pruner key (name, expansion, quantity) is
    /// already held by a surviving row is never re-inserted, so a row
    /// stored as `bolt/lea/4` is not doubled by a canonical `Bolt/LEA/4`.
    pub fn sync_canonical(&mut self, canonical: &[ImportLine]) -> Result<SyncStats> {
        let pruned = self.prune(canonical)?.len();

        let survivors = self.store.fetch_all(Projection::Matching)?;
        let held: HashSet<StockKey> = survivors.iter().map(card_key).collect();
        let cards: Vec<InventoryCard> = new_entries(canonical, &survivors, self.observer.as_ref())
            .iter()
            .filter(|line| !held.contains(&line_key(line)))
            .map(ImportLine::to_inventory_card)
            .collect();
        if !cards.is_empty() {
            self.store.insert_many(&cards)?;
        }
        let inserted = cards.len();

        let deduplicated = self.deduplicate()?.len();
        let stats = SyncStats {
            inserted,
            pruned,
            deduplicated,
        };
        log::info!(
            "Canonical sync: {} inserted, {} pruned, {} duplicates removed",
            stats.inserted,
            stats.pruned,
            stats.deduplicated
        );
        Ok(stats)
    }

    /// One keyset page of the filtered inventory.
    pub fn list(&self, cursor: i64, page_size: usize, filter: &CardFilter) -> Result<Page> {
        self.store.page(cursor, page_size, filter)
    }

    /// Rows still waiting for catalog data.
    pub fn unsynced(&self) -> Result<Vec<InventoryCard>> {
        self.store.fetch_unsynced()
    }

    /// Writes back rows enriched by the card catalog.
    pub fn apply_catalog_data(&mut self, cards: &[InventoryCard]) -> Result<usize> {
        if cards.is_empty() {
            return Ok(0);
        }
        self.store.update_many(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilteredCard;
    use crate::store::SqliteStore;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingObserver(Rc<Cell<usize>>);

    impl DiffObserver for CountingObserver {
        fn record_diff(&self, _considered: usize, _new_entries: usize) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn make_card(name: &str, expansion: &str, quantity: i64) -> InventoryCard {
        InventoryCard {
            name: name.to_string(),
            expansion_name: Some(expansion.to_string()),
            language: "English".to_string(),
            quantity,
            ..InventoryCard::default()
        }
    }

    fn service_with(cards: &[InventoryCard]) -> InventoryService<SqliteStore> {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_many(cards).unwrap();
        InventoryService::new(store)
    }

    fn names(cards: &[InventoryCard]) -> Vec<&str> {
        cards.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn want_list_absent_or_empty_is_empty_report() {
        let service = service_with(&[make_card("Opt", "XLN", 4)]);
        assert_eq!(service.compare_want_list(None).unwrap(), WantListReport::default());
        assert_eq!(
            service.compare_want_list(Some(&[][..])).unwrap(),
            WantListReport::default()
        );
    }

    #[test]
    fn want_list_uses_reserved_quantities() {
        let mut reserved = make_card("Sol Ring", "C21", 2);
        reserved.in_use = 2;
        let service = service_with(&[make_card("Opt", "XLN", 4), reserved]);

        let wants = vec![ImportLine::new("Opt", 2), ImportLine::new("Sol Ring", 1)];
        let report = service.compare_want_list(Some(wants.as_slice())).unwrap();
        assert_eq!(
            report.found,
            vec![FilteredCard {
                name: "Opt".to_string(),
                quantity: 2
            }]
        );
        assert_eq!(
            report.missing,
            vec![FilteredCard {
                name: "Sol Ring".to_string(),
                quantity: 1
            }]
        );
    }

    #[test]
    fn import_inserts_only_new_entries() {
        let mut service = service_with(&[
            make_card("Fire", "APC", 2),
            make_card("Fire // Ice", "APC", 2),
        ]);
        let batch = vec![
            ImportLine::new("Fire", 2).with_expansion("APC"),
            ImportLine::new("Black Lotus", 1).with_expansion("LEA"),
        ];

        let inserted = service.import(&batch).unwrap();
        assert_eq!(names(&inserted), vec!["Black Lotus"]);
        assert_eq!(service.store().count().unwrap(), 3);
    }

    #[test]
    fn import_reports_to_injected_observer() {
        let calls = Rc::new(Cell::new(0));
        let store = SqliteStore::open_in_memory().unwrap();
        let mut service =
            InventoryService::with_observer(store, Box::new(CountingObserver(calls.clone())));
        service.import(&[ImportLine::new("Opt", 1)]).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn empty_import_touches_nothing() {
        let mut service = service_with(&[]);
        assert!(service.import(&[]).unwrap().is_empty());
        assert_eq!(service.store().count().unwrap(), 0);
    }

    #[test]
    fn prune_removes_stale_rows() {
        let mut service = service_with(&[
            make_card("bolt", "lea", 4),
            make_card("bolt", "lea", 3),
        ]);
        let canonical = vec![ImportLine::new("Bolt", 4).with_expansion("LEA")];

        let preview = service.stale(&canonical).unwrap();
        assert_eq!(preview.len(), 1);
        assert_eq!(service.store().count().unwrap(), 2);

        let removed = service.prune(&canonical).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].quantity, 3);
        assert_eq!(service.store().count().unwrap(), 1);
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let mut service = service_with(&[
            make_card("Opt", "XLN", 1),
            make_card("Opt", "XLN", 1),
            make_card("Opt", "XLN", 1),
            make_card("Ponder", "M12", 1),
            make_card("Preordain", "M11", 1),
        ]);
        assert_eq!(service.duplicates().unwrap().len(), 2);
        let removed = service.deduplicate().unwrap();
        assert_eq!(removed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(service.deduplicate().unwrap().is_empty());
        assert_eq!(service.store().count().unwrap(), 3);
    }

    #[test]
    fn sync_converges_on_canonical_import() {
        let mut service = service_with(&[
            make_card("Lightning Bolt", "LEA", 4),
            make_card("Counterspell", "LEA", 2),
        ]);
        let canonical = vec![
            ImportLine::new("Lightning Bolt", 4).with_expansion("LEA"),
            ImportLine::new("Dark Ritual", 3).with_expansion("LEA"),
        ];

        let stats = service.sync_canonical(&canonical).unwrap();
        assert_eq!(
            stats,
            SyncStats {
                inserted: 1,
                pruned: 1,
                deduplicated: 0,
            }
        );

        let rows = service.store().fetch_all(Projection::Full).unwrap();
        assert_eq!(names(&rows), vec!["Lightning Bolt", "Dark Ritual"]);
        assert_eq!(rows[0].id, 1, "held rows are left in place");

        let again = service.sync_canonical(&canonical).unwrap();
        assert_eq!(again, SyncStats::default());
        assert_eq!(service.store().count().unwrap(), 2);
    }

    #[test]
    fn sync_does_not_double_rows_held_under_other_spelling() {
        let mut service = service_with(&[
            make_card("bolt", "lea", 4),
            make_card("Lightning Bolt", "LEA", 4),
        ]);
        let mut numbered = ImportLine::new("Lightning Bolt", 4).with_expansion("LEA");
        numbered.card_number = Some("161".to_string());
        numbered.foil = Some(true);
        let canonical = vec![ImportLine::new("Bolt", 4).with_expansion("LEA"), numbered];

        let stats = service.sync_canonical(&canonical).unwrap();
        assert_eq!(stats, SyncStats::default());

        let rows = service.store().fetch_all(Projection::Full).unwrap();
        assert_eq!(names(&rows), vec!["bolt", "Lightning Bolt"]);
        assert_eq!(rows.iter().map(|c| c.quantity).sum::<i64>(), 8);
    }

    #[test]
    fn sync_reports_diff_to_observer() {
        let calls = Rc::new(Cell::new(0));
        let store = SqliteStore::open_in_memory().unwrap();
        let mut service =
            InventoryService::with_observer(store, Box::new(CountingObserver(calls.clone())));
        service.sync_canonical(&[ImportLine::new("Opt", 1)]).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(service.store().count().unwrap(), 1);
    }

    #[test]
    fn list_pages_through_store() {
        let cards: Vec<InventoryCard> = (1..=5)
            .map(|i| make_card(&format!("Card {i}"), "TST", 1))
            .collect();
        let service = service_with(&cards);
        let filter = CardFilter::default();

        let first = service.list(0, 2, &filter).unwrap();
        assert_eq!(first.next_cursor, 2);
        let last = service.list(4, 2, &filter).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_cursor, 5);
    }

    #[test]
    fn catalog_backfill_clears_unsynced_rows() {
        let mut service = service_with(&[make_card("Opt", "XLN", 1), make_card("Ponder", "M12", 1)]);
        let mut pending = service.unsynced().unwrap();
        assert_eq!(pending.len(), 2);

        pending[0].type_line = Some("Instant".to_string());
        pending[0].color_identity = Some("U".to_string());
        pending[0].cmc = Some(1.0);
        assert_eq!(service.apply_catalog_data(&pending[..1]).unwrap(), 1);

        let still_pending = service.unsynced().unwrap();
        assert_eq!(names(&still_pending), vec!["Ponder"]);
        assert_eq!(service.apply_catalog_data(&[]).unwrap(), 0);
    }
}
