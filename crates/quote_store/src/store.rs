use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use log::{debug, warn};
use parking_lot::Mutex;
use quote_model::StoredQuote;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{StoreError, StoreResult};

const CREATE_COTACOES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cotacoes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bid TEXT,
    timestamp TEXT
);
"#;

/// Destination for fetched bids. Every write is bounded by its own timeout.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persists `bid` stamped with the current time and returns the new row id.
    async fn save_bid(&self, bid: &str, timeout: Duration) -> StoreResult<i64>;
}

/// SQLite store holding the `cotacoes` table.
///
/// A single connection is shared behind a mutex and writes run on the blocking
/// pool. Each write carries its own deadline into SQLite and aborts itself once
/// it passes, so an expired write never leaves a row behind and never touches
/// another request's statement.
pub struct SqliteQuoteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteQuoteStore {
    /// Opens (creating if absent) the database file and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        debug!("open | path: {}", path.as_ref().display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(CREATE_COTACOES_TABLE)?;
        Ok(SqliteQuoteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM cotacoes", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn latest(&self) -> StoreResult<Option<StoredQuote>> {
        let conn = self.conn.lock();
        let quote = conn
            .query_row(
                "SELECT id, bid, timestamp FROM cotacoes ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(StoredQuote {
                        id: row.get(0)?,
                        bid: row.get(1)?,
                        timestamp: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(quote)
    }
}

// Checked by SQLite every this many VM instructions while our write runs.
const DEADLINE_CHECK_OPS: i32 = 100;

fn insert_before(
    conn: &Mutex<Connection>,
    bid: &str,
    timestamp: &str,
    deadline: Instant,
    timeout: Duration,
) -> StoreResult<i64> {
    let mut conn = conn.lock();
    if Instant::now() >= deadline {
        return Err(StoreError::Timeout(timeout));
    }

    // The handler is scoped to this write and removed before the lock is released.
    conn.progress_handler(DEADLINE_CHECK_OPS, Some(move || Instant::now() >= deadline));
    let inserted = insert_row(&mut conn, bid, timestamp, deadline, timeout);
    conn.progress_handler(0, None::<fn() -> bool>);

    match inserted {
        Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
            if e.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            Err(StoreError::Timeout(timeout))
        }
        other => other,
    }
}

fn insert_row(
    conn: &mut Connection,
    bid: &str,
    timestamp: &str,
    deadline: Instant,
    timeout: Duration,
) -> StoreResult<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO cotacoes (bid, timestamp) VALUES (?1, ?2)",
        params![bid, timestamp],
    )?;
    let id = tx.last_insert_rowid();

    // dropping the transaction rolls the row back
    if Instant::now() >= deadline {
        return Err(StoreError::Timeout(timeout));
    }
    tx.commit()?;
    Ok(id)
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    async fn save_bid(&self, bid: &str, timeout: Duration) -> StoreResult<i64> {
        let deadline = Instant::now() + timeout;
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let conn = Arc::clone(&self.conn);
        let bid = bid.to_string();

        debug!("save_bid | bid: {} | timestamp: {}", bid, timestamp);

        let write = tokio::task::spawn_blocking(move || {
            insert_before(&conn, &bid, &timestamp, deadline, timeout)
        });

        // An abandoned write still stops itself at `deadline`.
        match tokio::time::timeout(timeout, write).await {
            Ok(joined) => joined.map_err(|e| StoreError::Join(e.to_string()))?,
            Err(_) => {
                warn!("save_bid | deadline of {:?} expired", timeout);
                Err(StoreError::Timeout(timeout))
            }
        }
    }
}
