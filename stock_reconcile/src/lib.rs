//! Stock Reconcile - MTG inventory reconciliation engine
//!
//! Checks want-lists against on-hand stock, diffs import batches, prunes
//! rows a canonical import no longer reflects, removes duplicates and pages
//! through the inventory by keyset. The matching logic is pure; the SQLite
//! store and the file readers sit at the edges.

pub mod availability;
pub mod duplicates;
pub mod error;
pub mod import_diff;
pub mod io;
pub mod models;
pub mod pagination;
pub mod pruning;
pub mod service;
pub mod store;

pub use availability::{reconcile, WantListReport};
pub use duplicates::find_duplicates;
pub use error::{Error, ReconcileError, Result};
pub use import_diff::{new_entries, DiffObserver, LogObserver};
pub use models::{CardFilter, FilteredCard, ImportLine, InventoryCard};
pub use pagination::{paginate, Page};
pub use pruning::stale_rows;
pub use service::{InventoryService, SyncStats};
pub use store::{CardStore, Projection, SqliteStore};
