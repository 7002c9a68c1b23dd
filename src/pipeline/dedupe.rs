//! Deduplicator: collapses rows sharing a `shipment_id` to the
//! earliest-arriving row.

use crate::db::{ensure_initialized, ShipmentStore};
use crate::error::Result;
use crate::observability;
use rusqlite::Connection;
use tracing::info;

/// Keep one row per shipment_id: the earliest `arrival_date` wins, rows
/// without an arrival date lose to dated rows, and remaining ties resolve
/// to the lowest rowid (the first-encountered row in upload order). Rows
/// without a shipment_id are never collapsed; the missing-value handler
/// surfaces those instead.
const DEDUPE_SQL: &str = r#"
DELETE FROM shipments
WHERE shipment_id IS NOT NULL
  AND rowid NOT IN (
    SELECT rowid FROM (
        SELECT rowid,
               ROW_NUMBER() OVER (
                   PARTITION BY shipment_id
                   ORDER BY arrival_date IS NULL, arrival_date, rowid
               ) AS rn
        FROM shipments
        WHERE shipment_id IS NOT NULL
    )
    WHERE rn = 1
)
"#;

/// Remove duplicate shipments in place, returning the number of rows
/// discarded. Idempotent: a second run removes nothing.
pub fn dedupe(store: &ShipmentStore) -> Result<u64> {
    let conn = store.lock();
    ensure_initialized(&conn)?;
    let removed = run(&conn)?;
    info!(removed, "Deduplication pass complete");
    Ok(removed)
}

pub(crate) fn run(conn: &Connection) -> Result<u64> {
    let removed = conn.execute(DEDUPE_SQL, [])? as u64;
    observability::dedupe::run();
    observability::dedupe::rows_removed(removed);
    Ok(removed)
}
