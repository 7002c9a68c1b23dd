//! Aggregate metrics: warehouse utilization, summary statistics, and the
//! time-series views backing the dashboard charts.

use crate::db::{ensure_initialized, ShipmentStore};
use crate::error::Result;
use chrono::NaiveDate;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Which rows count as occupying warehouse space. `ReceivedOnly` matches
/// the physical reading: stock that has left the warehouse no longer takes
/// up room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationScope {
    ReceivedOnly,
    AllRows,
}

#[derive(Debug, Clone, Serialize)]
pub struct Utilization {
    pub total_volume: i64,
    pub utilization_percent: f64,
}

/// Occupied volume and percentage of the configured capacity, unrounded.
pub fn warehouse_utilization(
    store: &ShipmentStore,
    scope: UtilizationScope,
    capacity_cm3: i64,
) -> Result<Utilization> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let sql = match scope {
        UtilizationScope::ReceivedOnly => {
            "SELECT COALESCE(SUM(volume), 0) FROM shipments WHERE status = 'received'"
        }
        UtilizationScope::AllRows => "SELECT COALESCE(SUM(volume), 0) FROM shipments",
    };
    let total_volume: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    drop(conn);

    Ok(Utilization {
        total_volume,
        utilization_percent: total_volume as f64 / capacity_cm3 as f64 * 100.0,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryStatistics {
    pub total_shipments: u64,
    pub on_time: u64,
    pub delayed: u64,
    pub warehouse_utilization: Utilization,
}

/// Overall summary: totals, delivered ("on time") versus everything still
/// in flight, and the utilization snapshot from [`warehouse_utilization`].
pub fn summary_statistics(
    store: &ShipmentStore,
    scope: UtilizationScope,
    capacity_cm3: i64,
) -> Result<SummaryStatistics> {
    let (total, on_time, delayed) = {
        let conn = store.lock();
        ensure_initialized(&conn)?;
        conn.query_row(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN status = 'delivered' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN status != 'delivered' THEN 1 ELSE 0 END), 0) \
             FROM shipments",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?
    };

    let warehouse_utilization = warehouse_utilization(store, scope, capacity_cm3)?;

    Ok(SummaryStatistics {
        total_shipments: total as u64,
        on_time: on_time as u64,
        delayed: delayed as u64,
        warehouse_utilization,
    })
}

fn arrival_range_sql(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(start) = start {
        clauses.push("arrival_date >= ?");
        params.push(Box::new(start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = end {
        clauses.push("arrival_date <= ?");
        params.push(Box::new(end.format("%Y-%m-%d").to_string()));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierDayCount {
    pub arrival_date: String,
    pub carrier: String,
    pub count: u64,
}

/// Shipments received per carrier per day, optionally bounded by an
/// inclusive arrival-date range.
pub fn received_by_carrier(
    store: &ShipmentStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<CarrierDayCount>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let (where_sql, params) = arrival_range_sql(start, end);
    let sql = format!(
        "SELECT arrival_date, carrier, COUNT(*) FROM shipments {where_sql} \
         GROUP BY arrival_date, carrier ORDER BY arrival_date, carrier"
    );
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(&param_refs[..], |row| {
            Ok(CarrierDayCount {
                arrival_date: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                carrier: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                count: row.get::<_, i64>(2)? as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeVolume {
    pub mode: String,
    pub total_volume: i64,
}

/// Total shipment volume per mode, one row per distinct mode present.
pub fn volume_by_mode(store: &ShipmentStore) -> Result<Vec<ModeVolume>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let mut stmt = conn.prepare(
        "SELECT mode, COALESCE(SUM(volume), 0) FROM shipments \
         WHERE mode IS NOT NULL GROUP BY mode ORDER BY mode",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ModeVolume {
                mode: row.get(0)?,
                total_volume: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayThroughput {
    pub arrival_date: String,
    pub packages_received: u64,
}

/// Packages received per day, optionally bounded by an inclusive
/// arrival-date range.
pub fn throughput_over_time(
    store: &ShipmentStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<DayThroughput>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let (where_sql, params) = arrival_range_sql(start, end);
    let sql = format!(
        "SELECT arrival_date, COUNT(*) FROM shipments {where_sql} \
         GROUP BY arrival_date ORDER BY arrival_date"
    );
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(&param_refs[..], |row| {
            Ok(DayThroughput {
                arrival_date: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                packages_received: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
