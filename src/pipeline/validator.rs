//! Record validator: enforces the shipment schema and the cross-field
//! date/status invariants at ingestion time.

use crate::domain::{
    Carrier, Destination, Mode, ShipmentRow, ShipmentStatus, CUSTOMER_ID_MAX, CUSTOMER_ID_MIN,
    EXPECTED_COLUMNS, SHIPMENT_ID_FLOOR,
};
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row that failed validation, with its 1-based position in the upload.
#[derive(Debug)]
pub struct RowViolation {
    pub row_number: usize,
    pub error: AnalyticsError,
}

impl RowViolation {
    pub fn describe(&self) -> String {
        format!("row {}: {}", self.row_number, self.error)
    }
}

/// Verify the uploaded column set exactly matches the expected schema.
/// Runs before any data is loaded; a mismatch names both the missing and
/// the unexpected columns.
pub fn check_columns(headers: &[String]) -> Result<()> {
    let expected: BTreeSet<&str> = EXPECTED_COLUMNS.iter().copied().collect();
    let incoming: BTreeSet<&str> = headers.iter().map(|h| h.trim()).collect();

    let missing: Vec<String> = expected
        .difference(&incoming)
        .map(|c| c.to_string())
        .collect();
    let extra: Vec<String> = incoming
        .difference(&expected)
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(AnalyticsError::SchemaMismatch { missing, extra })
    }
}

/// Check one row's field bounds and cross-field rules, canonicalizing its
/// date strings in place.
///
/// A null in a required column is not a violation here: missing values are
/// surfaced or filled by the missing-value handler, so such rows must reach
/// the store intact.
pub fn validate_row(row: &mut ShipmentRow) -> Result<()> {
    if let Some(id) = row.shipment_id {
        if id < SHIPMENT_ID_FLOOR {
            return Err(AnalyticsError::InvariantViolation {
                field: "shipment_id",
                rule: format!("shipment_id must be at least {SHIPMENT_ID_FLOOR}, got {id}"),
            });
        }
    }
    if let Some(id) = row.customer_id {
        if !(CUSTOMER_ID_MIN..=CUSTOMER_ID_MAX).contains(&id) {
            return Err(AnalyticsError::InvariantViolation {
                field: "customer_id",
                rule: format!(
                    "customer_id must be within [{CUSTOMER_ID_MIN}, {CUSTOMER_ID_MAX}], got {id}"
                ),
            });
        }
    }
    if let Some(origin) = row.origin.as_deref() {
        if origin.len() != 2 || !origin.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AnalyticsError::InvariantViolation {
                field: "origin",
                rule: format!("origin must be two uppercase letters, got '{origin}'"),
            });
        }
    }
    if let Some(dest) = row.destination.as_deref() {
        dest.parse::<Destination>()?;
    }
    if let Some(weight) = row.weight {
        if weight < 0 {
            return Err(AnalyticsError::InvariantViolation {
                field: "weight",
                rule: format!("weight must be non-negative, got {weight}"),
            });
        }
    }
    if let Some(volume) = row.volume {
        if volume < 0 {
            return Err(AnalyticsError::InvariantViolation {
                field: "volume",
                rule: format!("volume must be non-negative, got {volume}"),
            });
        }
    }
    if let Some(carrier) = row.carrier.as_deref() {
        carrier.parse::<Carrier>()?;
    }
    if let Some(mode) = row.mode.as_deref() {
        mode.parse::<Mode>()?;
    }

    let status = match row.status.as_deref() {
        Some(s) => Some(s.parse::<ShipmentStatus>()?),
        None => None,
    };

    row.arrival_date = canonical_date("arrival_date", row.arrival_date.take())?;
    row.departure_date = canonical_date("departure_date", row.departure_date.take())?;
    row.delivered_date = canonical_date("delivered_date", row.delivered_date.take())?;

    // Date presence is fully determined by status.
    match status {
        Some(st @ (ShipmentStatus::Intransit | ShipmentStatus::Delivered)) => {
            if row.departure_date.is_none() {
                return Err(AnalyticsError::InvariantViolation {
                    field: "departure_date",
                    rule: format!("departure_date required when status={st}"),
                });
            }
            if st == ShipmentStatus::Delivered && row.delivered_date.is_none() {
                return Err(AnalyticsError::InvariantViolation {
                    field: "delivered_date",
                    rule: "delivered_date required when status=delivered".to_string(),
                });
            }
        }
        _ => {}
    }

    Ok(())
}

/// Split parsed rows into the loadable set and the per-row violations.
pub fn partition(rows: Vec<ShipmentRow>) -> (Vec<ShipmentRow>, Vec<RowViolation>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut violations = Vec::new();
    for (idx, mut row) in rows.into_iter().enumerate() {
        match validate_row(&mut row) {
            Ok(()) => valid.push(row),
            Err(error) => violations.push(RowViolation {
                row_number: idx + 1,
                error,
            }),
        }
    }
    (valid, violations)
}

/// Parse and reformat a date string so storage always holds zero-padded
/// `YYYY-MM-DD` values that compare correctly as text.
fn canonical_date(field: &'static str, value: Option<String>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| {
                AnalyticsError::InvariantViolation {
                    field,
                    rule: format!("expected a YYYY-MM-DD date, got '{raw}'"),
                }
            })?;
            Ok(Some(parsed.format(DATE_FORMAT).to_string()))
        }
    }
}
