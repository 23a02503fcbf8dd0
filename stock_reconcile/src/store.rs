//! Inventory store: the boundary between the matching engine and persistence.
//!
//! Uses parameterized queries exclusively (no SQL string concatenation of
//! caller data). Every batch write runs in one transaction, so a failing
//! batch leaves the table untouched.

use crate::error::Result;
use crate::models::{CardFilter, InventoryCard};
use crate::pagination::{paginate, Page};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// Which columns a snapshot loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Every column
    Full,
    /// id, name, expansion name and quantity; enough for import diffing
    Matching,
}

/// Read/write contract of the inventory store.
pub trait CardStore {
    /// Loads every row, ascending by id.
    fn fetch_all(&self, projection: Projection) -> Result<Vec<InventoryCard>>;

    /// Inserts rows, assigning fresh ids. Ids on the input are ignored.
    fn insert_many(&mut self, cards: &[InventoryCard]) -> Result<usize>;

    /// Overwrites rows by id.
    fn update_many(&mut self, cards: &[InventoryCard]) -> Result<usize>;

    /// Deletes rows by id.
    fn remove_many(&mut self, cards: &[InventoryCard]) -> Result<usize>;

    /// Rows the card catalog has not backfilled yet (no type line).
    fn fetch_unsynced(&self) -> Result<Vec<InventoryCard>>;

    /// One keyset page of the filtered inventory.
    fn page(&self, cursor: i64, page_size: usize, filter: &CardFilter) -> Result<Page> {
        let snapshot = self.fetch_all(Projection::Full)?;
        Ok(paginate(&snapshot, cursor, page_size, filter))
    }
}

const SELECT_CARDS: &str = "SELECT id, name, expansion_name, language, card_number, quantity,
            in_use, foil, color_identity, type_line, cmc, image_uri, is_commander
     FROM inventory_cards";

/// SQLite-backed inventory.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and initialises the schema.
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Inventory DB: {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        register_fold_case(&conn)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Total number of rows
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM inventory_cards", [], |row| row.get(0))?)
    }

    fn query_cards(&self, sql: &str) -> Result<Vec<InventoryCard>> {
        let mut stmt = self.conn.prepare(sql)?;
        let cards = stmt
            .query_map([], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }
}

/// Creates the `inventory_cards` table if it does not already exist.
///
/// AUTOINCREMENT keeps ids from being reused after deletes, so a cursor
/// never points behind rows inserted later.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS inventory_cards (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            expansion_name  TEXT,
            language        TEXT NOT NULL,
            card_number     TEXT NOT NULL,
            quantity        INTEGER NOT NULL,
            in_use          INTEGER NOT NULL DEFAULT 0,
            foil            INTEGER NOT NULL DEFAULT 0,
            color_identity  TEXT,
            type_line       TEXT,
            cmc             REAL,
            image_uri       TEXT,
            is_commander    INTEGER,
            imported_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_inventory_cards_name ON inventory_cards(name);",
    )
}

/// Registers `fold_case(text)`, a Unicode lowercase. SQLite's own `lower()`
/// only folds ASCII, which would make filters case-sensitive for names
/// like "Æther Vial".
fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryCard> {
    Ok(InventoryCard {
        id: row.get(0)?,
        name: row.get(1)?,
        expansion_name: row.get(2)?,
        language: row.get(3)?,
        card_number: row.get(4)?,
        quantity: row.get(5)?,
        in_use: row.get(6)?,
        foil: row.get(7)?,
        color_identity: row.get(8)?,
        type_line: row.get(9)?,
        cmc: row.get(10)?,
        image_uri: row.get(11)?,
        is_commander: row.get(12)?,
    })
}

/// Returns today's date as `YYYY-MM-DD` using local system time.
fn today_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

impl CardStore for SqliteStore {
    fn fetch_all(&self, projection: Projection) -> Result<Vec<InventoryCard>> {
        match projection {
            Projection::Full => self.query_cards(&format!("{SELECT_CARDS} ORDER BY id")),
            Projection::Matching => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, expansion_name, quantity FROM inventory_cards ORDER BY id",
                )?;
                let cards = stmt
                    .query_map([], |row| {
                        Ok(InventoryCard {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            expansion_name: row.get(2)?,
                            quantity: row.get(3)?,
                            ..InventoryCard::default()
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(cards)
            }
        }
    }

    fn insert_many(&mut self, cards: &[InventoryCard]) -> Result<usize> {
        let today = today_date();
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO inventory_cards (
                    name, expansion_name, language, card_number, quantity, in_use, foil,
                    color_identity, type_line, cmc, image_uri, is_commander, imported_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for card in cards {
                stmt.execute(params![
                    card.name,
                    card.expansion_name,
                    card.language,
                    card.card_number,
                    card.quantity,
                    card.in_use,
                    card.foil,
                    card.color_identity,
                    card.type_line,
                    card.cmc,
                    card.image_uri,
                    card.is_commander,
                    today,
                ])?;
                count += 1;
            }
        }
        tx.commit()?;
        log::info!("Inserted {} inventory rows", count);
        Ok(count)
    }

    fn update_many(&mut self, cards: &[InventoryCard]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE inventory_cards SET
                    name = ?2, expansion_name = ?3, language = ?4, card_number = ?5,
                    quantity = ?6, in_use = ?7, foil = ?8, color_identity = ?9,
                    type_line = ?10, cmc = ?11, image_uri = ?12, is_commander = ?13
                 WHERE id = ?1",
            )?;
            for card in cards {
                count += stmt.execute(params![
                    card.id,
                    card.name,
                    card.expansion_name,
                    card.language,
                    card.card_number,
                    card.quantity,
                    card.in_use,
                    card.foil,
                    card.color_identity,
                    card.type_line,
                    card.cmc,
                    card.image_uri,
                    card.is_commander,
                ])?;
            }
        }
        tx.commit()?;
        log::info!("Updated {} inventory rows", count);
        Ok(count)
    }

    fn remove_many(&mut self, cards: &[InventoryCard]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM inventory_cards WHERE id = ?1")?;
            for card in cards {
                count += stmt.execute(params![card.id])?;
            }
        }
        tx.commit()?;
        log::info!("Removed {} inventory rows", count);
        Ok(count)
    }

    fn fetch_unsynced(&self) -> Result<Vec<InventoryCard>> {
        self.query_cards(&format!(
            "{SELECT_CARDS} WHERE type_line IS NULL ORDER BY id"
        ))
    }

    fn page(&self, cursor: i64, page_size: usize, filter: &CardFilter) -> Result<Page> {
        log::debug!(
            "Listing page after id {} (size {}) with {:?}",
            cursor,
            page_size,
            filter
        );
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_CARDS}
             WHERE id > ?1
               AND (?2 IS NULL OR instr(fold_case(name), fold_case(?2)) > 0)
               AND (?3 IS NULL OR fold_case(color_identity) = fold_case(?3))
               AND (?4 IS NULL OR fold_case(type_line) = fold_case(?4))
               AND (?5 IS NULL OR is_commander = ?5)
               AND (?6 IS NULL OR cmc = ?6)
             ORDER BY id
             LIMIT ?7"
        ))?;
        let items = stmt
            .query_map(
                params![
                    cursor,
                    filter.name_term(),
                    filter.color_identity_term(),
                    filter.type_line_term(),
                    filter.is_commander,
                    filter.cmc,
                    page_size,
                ],
                card_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Page::from_items(items))
    }
}
