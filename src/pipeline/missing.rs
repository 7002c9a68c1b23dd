//! Missing-value handler: surfaces incomplete records or fills numeric
//! gaps with zero, per caller-chosen strategy.

use crate::db::{ensure_initialized, ShipmentStore};
use crate::domain::{projection, ShipmentRow, REQUIRED_COLUMNS};
use crate::error::{AnalyticsError, Result};
use crate::observability;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValueStrategy {
    /// Return every row with a null in any required column; no mutation.
    Reject,
    /// Zero out null `weight`/`volume` in place.
    FillZero,
}

impl FromStr for MissingValueStrategy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reject" => Ok(MissingValueStrategy::Reject),
            "fill_zero" => Ok(MissingValueStrategy::FillZero),
            other => Err(AnalyticsError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for MissingValueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingValueStrategy::Reject => "reject",
            MissingValueStrategy::FillZero => "fill_zero",
        };
        f.write_str(name)
    }
}

/// Apply the chosen strategy. `Reject` returns the incomplete rows in full
/// projection; `FillZero` mutates the store and returns an empty list.
pub fn handle(store: &ShipmentStore, strategy: MissingValueStrategy) -> Result<Vec<ShipmentRow>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    match strategy {
        MissingValueStrategy::Reject => {
            let null_filter: Vec<String> = REQUIRED_COLUMNS
                .iter()
                .map(|c| format!("{c} IS NULL"))
                .collect();
            let sql = format!(
                "SELECT {} FROM shipments WHERE {} ORDER BY rowid",
                projection(),
                null_filter.join(" OR ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], ShipmentRow::from_sql)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            observability::missing::rejected_rows(rows.len());
            Ok(rows)
        }
        MissingValueStrategy::FillZero => {
            let weights = conn.execute("UPDATE shipments SET weight = 0 WHERE weight IS NULL", [])?;
            let volumes = conn.execute("UPDATE shipments SET volume = 0 WHERE volume IS NULL", [])?;
            observability::missing::fill_zero_run();
            info!(weights, volumes, "Filled null numeric fields with zero");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_strategies() {
        assert_eq!(
            "reject".parse::<MissingValueStrategy>().unwrap(),
            MissingValueStrategy::Reject
        );
        assert_eq!(
            "fill_zero".parse::<MissingValueStrategy>().unwrap(),
            MissingValueStrategy::FillZero
        );
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let err = "drop_rows".parse::<MissingValueStrategy>().unwrap_err();
        match err {
            AnalyticsError::InvalidStrategy(name) => assert_eq!(name, "drop_rows"),
            other => panic!("expected InvalidStrategy, got {other:?}"),
        }
    }
}
