use crate::error::{AnalyticsError, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// DDL for the shipments table. No primary key: raw uploads may carry
/// duplicate shipment ids until the deduplicator runs, and required columns
/// stay nullable so the missing-value handler has something to act on.
pub(crate) const CREATE_SHIPMENTS_SQL: &str = r#"
CREATE TABLE shipments (
    shipment_id    INTEGER,
    customer_id    INTEGER,
    origin         TEXT,
    destination    TEXT,
    weight         INTEGER,
    volume         INTEGER,
    carrier        TEXT,
    mode           TEXT,
    status         TEXT,
    arrival_date   TEXT,
    departure_date TEXT,
    delivered_date TEXT
)
"#;

/// Process-wide handle to the analytical store. All mutation funnels through
/// this one connection so a full-table replace is atomic from any reader's
/// perspective.
pub struct ShipmentStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

/// Snapshot of the store for the admin status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub exists: bool,
    pub loaded: bool,
    pub total_shipments: u64,
}

impl ShipmentStore {
    /// Open (or create) the on-disk store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened shipment store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// In-memory store, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Row count of the shipments table; `StoreNotInitialized` before the
    /// first successful ingest.
    pub fn count_shipments(&self) -> Result<u64> {
        let conn = self.lock();
        ensure_initialized(&conn)?;
        Ok(count_rows(&conn)?)
    }

    /// Whether the backing file exists, whether shipments are loaded, and how
    /// many. The uninitialized store legitimately reports zeros here.
    pub fn status(&self) -> Result<StoreStatus> {
        let conn = self.lock();
        let exists = match &self.path {
            Some(p) => p.exists(),
            None => true,
        };
        if !table_exists(&conn)? {
            return Ok(StoreStatus {
                exists,
                loaded: false,
                total_shipments: 0,
            });
        }
        let total = count_rows(&conn)?;
        Ok(StoreStatus {
            exists,
            loaded: total > 0,
            total_shipments: total,
        })
    }

    /// Drop the persisted data set if present. Returns whether a deletion
    /// actually occurred; an idempotent no-op otherwise.
    pub fn reset(&self) -> Result<bool> {
        let conn = self.lock();
        if !table_exists(&conn)? {
            return Ok(false);
        }
        conn.execute("DROP TABLE shipments", [])?;
        info!("Shipment data set dropped");
        Ok(true)
    }
}

pub(crate) fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'shipments'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn count_rows(conn: &Connection) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM shipments", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Storage faults must stay distinguishable from zero results: every read
/// path calls this before querying.
pub(crate) fn ensure_initialized(conn: &Connection) -> Result<()> {
    if table_exists(conn)? {
        Ok(())
    } else {
        Err(AnalyticsError::StoreNotInitialized)
    }
}
