//! Ingestion pipeline: replaces the working data set from an uploaded CSV
//! blob, applying the record validator and triggering deduplication.

use crate::db::{count_rows, ShipmentStore, CREATE_SHIPMENTS_SQL};
use crate::domain::ShipmentRow;
use crate::error::{AnalyticsError, Result};
use crate::observability;
use crate::pipeline::{dedupe, validator};
use rusqlite::params;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one upload, mirrored onto the HTTP response.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Rows loaded into the store by the replace, before deduplication.
    pub total_uploaded: u64,
    pub duplicates_removed: u64,
    /// Rows remaining after deduplication.
    pub total_shipments: u64,
    /// Rows excluded by the record validator.
    pub rejected_rows: u64,
    pub violations: Vec<String>,
}

/// Uploads are gated on the `.csv` extension before any parsing happens.
pub fn ensure_csv_filename(filename: &str) -> Result<()> {
    if filename.to_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(AnalyticsError::UnsupportedUpload(format!(
            "only .csv files are accepted, got '{filename}'"
        )))
    }
}

/// Parse, validate, and load an uploaded CSV blob, then deduplicate.
///
/// The previous data set survives untouched on any parse or schema failure;
/// on success it is unconditionally discarded. The replace runs inside a
/// single transaction so concurrent readers never observe a half-loaded
/// table.
pub fn ingest_csv(store: &ShipmentStore, data: &[u8]) -> Result<IngestReport> {
    let started = Instant::now();
    let result = ingest_inner(store, data);
    match &result {
        Ok(report) => {
            observability::ingest::upload_success();
            observability::ingest::rows_ingested(report.total_shipments);
            observability::ingest::rows_rejected(report.rejected_rows);
            observability::ingest::duration(started.elapsed().as_secs_f64());
        }
        Err(_) => observability::ingest::upload_error(),
    }
    result
}

fn ingest_inner(store: &ShipmentStore, data: &[u8]) -> Result<IngestReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AnalyticsError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    // Schema check happens before any load; a mismatch leaves the previous
    // data set untouched.
    validator::check_columns(&headers)?;

    let mut rows: Vec<ShipmentRow> = Vec::new();
    for record in reader.deserialize() {
        let row: ShipmentRow = record.map_err(|e| AnalyticsError::Parse(e.to_string()))?;
        rows.push(row);
    }

    let (valid, violations) = validator::partition(rows);
    for violation in &violations {
        warn!("rejected {}", violation.describe());
    }

    let mut conn = store.lock();
    let tx = conn.transaction()?;
    tx.execute("DROP TABLE IF EXISTS shipments", [])?;
    tx.execute(CREATE_SHIPMENTS_SQL, [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO shipments (shipment_id, customer_id, origin, destination, weight, \
             volume, carrier, mode, status, arrival_date, departure_date, delivered_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for row in &valid {
            stmt.execute(params![
                row.shipment_id,
                row.customer_id,
                row.origin,
                row.destination,
                row.weight,
                row.volume,
                row.carrier,
                row.mode,
                row.status,
                row.arrival_date,
                row.departure_date,
                row.delivered_date,
            ])?;
        }
    }
    tx.commit()?;

    let total_uploaded = count_rows(&conn)?;
    let duplicates_removed = dedupe::run(&conn)?;
    let total_shipments = count_rows(&conn)?;
    drop(conn);

    info!(
        total_uploaded,
        duplicates_removed,
        total_shipments,
        rejected = violations.len(),
        "Upload ingested"
    );

    Ok(IngestReport {
        total_uploaded,
        duplicates_removed,
        total_shipments,
        rejected_rows: violations.len() as u64,
        violations: violations.iter().map(|v| v.describe()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_extension() {
        assert!(ensure_csv_filename("shipments.csv").is_ok());
        assert!(ensure_csv_filename("SHIPMENTS.CSV").is_ok());
        assert!(matches!(
            ensure_csv_filename("shipments.xlsx"),
            Err(AnalyticsError::UnsupportedUpload(_))
        ));
    }
}
