//! Read-only query layer over the current shipment data set. Every
//! operation surfaces a missing table as `StoreNotInitialized` rather than
//! an empty result.

pub mod consolidation;
pub mod metrics;

use crate::db::{ensure_initialized, ShipmentStore};
use crate::domain::{projection, Carrier, Destination, ShipmentRow, ShipmentStatus};
use crate::error::Result;
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, ToSql};
use serde::Serialize;

pub const MAX_PAGE_SIZE: u64 = 1000;

/// Optional row filters for the shipment listing.
#[derive(Debug, Clone, Default)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub destination: Option<Destination>,
    pub carrier: Option<Carrier>,
    pub arrival_date_start: Option<NaiveDate>,
    pub arrival_date_end: Option<NaiveDate>,
    /// Matches either shipment_id or customer_id.
    pub search: Option<i64>,
}

impl ShipmentFilter {
    fn to_sql(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = self.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(destination) = self.destination {
            clauses.push("destination = ?");
            params.push(Box::new(destination.as_str()));
        }
        if let Some(carrier) = self.carrier {
            clauses.push("carrier = ?");
            params.push(Box::new(carrier.as_str()));
        }
        if let Some(start) = self.arrival_date_start {
            clauses.push("arrival_date >= ?");
            params.push(Box::new(start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.arrival_date_end {
            clauses.push("arrival_date <= ?");
            params.push(Box::new(end.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = self.search {
            clauses.push("(shipment_id = ? OR customer_id = ?)");
            params.push(Box::new(search));
            params.push(Box::new(search));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (where_sql, params)
    }
}

/// One page of the filtered listing, plus the filter-wide row count.
#[derive(Debug, Serialize)]
pub struct ShipmentPage {
    pub total_count: u64,
    pub shipments: Vec<ShipmentRow>,
}

/// Paginated, filtered listing ordered by shipment_id ascending. Pages past
/// the end return an empty list with the true total. `page` is clamped to
/// ≥ 1 and `page_size` to `[1, MAX_PAGE_SIZE]`.
pub fn list_shipments(
    store: &ShipmentStore,
    page: u64,
    page_size: u64,
    filter: &ShipmentFilter,
) -> Result<ShipmentPage> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    let conn = store.lock();
    ensure_initialized(&conn)?;

    let (where_sql, params) = filter.to_sql();
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let count_sql = format!("SELECT COUNT(*) FROM shipments {where_sql}");
    let total_count: i64 = conn.query_row(&count_sql, &param_refs[..], |row| row.get(0))?;

    let page_sql = format!(
        "SELECT {} FROM shipments {} ORDER BY shipment_id LIMIT ? OFFSET ?",
        projection(),
        where_sql
    );
    let limit = page_size as i64;
    let offset = offset as i64;
    let mut page_refs = param_refs;
    page_refs.push(&limit);
    page_refs.push(&offset);

    let mut stmt = conn.prepare(&page_sql)?;
    let shipments = stmt
        .query_map(&page_refs[..], ShipmentRow::from_sql)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(ShipmentPage {
        total_count: total_count as u64,
        shipments,
    })
}

/// Single-record lookup. A miss is a valid `None`, never an error.
pub fn get_shipment(store: &ShipmentStore, shipment_id: i64) -> Result<Option<ShipmentRow>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let sql = format!(
        "SELECT {} FROM shipments WHERE shipment_id = ?1",
        projection()
    );
    let row = conn
        .query_row(&sql, [shipment_id], ShipmentRow::from_sql)
        .optional()?;
    Ok(row)
}
