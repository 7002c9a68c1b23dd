//! Cargo consolidation: groups of shipments sharing a destination and a
//! grouping date, eligible for combined handling.

use crate::db::{ensure_initialized, ShipmentStore};
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Which date field anchors a consolidation group. The warehouse default
/// groups received stock by arrival day; the departure policy groups
/// everything already scheduled out, regardless of status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationPolicy {
    ArrivalReceived,
    Departure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidationMember {
    pub shipment_id: i64,
    pub customer_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidationGroup {
    pub destination: String,
    pub date: String,
    pub group_count: u64,
    pub shipments: Vec<ConsolidationMember>,
}

/// Consolidation candidates under the given policy, optionally filtered by
/// destination and grouping date. Only groups with more than one member are
/// reported; a lone shipment is not a consolidation opportunity.
pub fn consolidation(
    store: &ShipmentStore,
    policy: ConsolidationPolicy,
    destination: Option<crate::domain::Destination>,
    date: Option<NaiveDate>,
) -> Result<Vec<ConsolidationGroup>> {
    let conn = store.lock();
    ensure_initialized(&conn)?;

    let date_column = match policy {
        ConsolidationPolicy::ArrivalReceived => "arrival_date",
        ConsolidationPolicy::Departure => "departure_date",
    };

    // Rows without an id, destination, or grouping date cannot join a
    // group; the missing-value handler surfaces those instead.
    let mut clauses = vec![
        "shipment_id IS NOT NULL".to_string(),
        "destination IS NOT NULL".to_string(),
        format!("{date_column} IS NOT NULL"),
    ];
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if policy == ConsolidationPolicy::ArrivalReceived {
        clauses.push("status = 'received'".to_string());
    }
    if let Some(dest) = destination {
        clauses.push("destination = ?".to_string());
        params.push(Box::new(dest.as_str()));
    }
    if let Some(date) = date {
        clauses.push(format!("{date_column} = ?"));
        params.push(Box::new(date.format("%Y-%m-%d").to_string()));
    }

    let sql = format!(
        "SELECT destination, {date_column}, shipment_id, customer_id \
         FROM shipments WHERE {} \
         ORDER BY destination, {date_column}, shipment_id",
        clauses.join(" AND ")
    );
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(&param_refs[..], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(group_rows(rows))
}

/// Fold the ordered member rows into groups, dropping singletons.
fn group_rows(rows: Vec<(String, String, i64, Option<i64>)>) -> Vec<ConsolidationGroup> {
    let mut groups: Vec<ConsolidationGroup> = Vec::new();
    for (destination, date, shipment_id, customer_id) in rows {
        let member = ConsolidationMember {
            shipment_id,
            customer_id,
        };
        match groups.last_mut() {
            Some(group) if group.destination == destination && group.date == date => {
                group.shipments.push(member);
                group.group_count += 1;
            }
            _ => groups.push(ConsolidationGroup {
                destination,
                date,
                group_count: 1,
                shipments: vec![member],
            }),
        }
    }
    groups.retain(|g| g.group_count > 1);
    groups
}

/// Delimited export, one row per group. Members serialize as
/// `shipment_id:customer_id` pairs joined with commas.
pub fn export_csv(groups: &[ConsolidationGroup]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["destination", "date", "group_count", "shipments"])?;
    for group in groups {
        let members: Vec<String> = group
            .shipments
            .iter()
            .map(|m| match m.customer_id {
                Some(customer_id) => format!("{}:{}", m.shipment_id, customer_id),
                None => m.shipment_id.to_string(),
            })
            .collect();
        writer.write_record([
            group.destination.clone(),
            group.date.clone(),
            group.group_count.to_string(),
            members.join(","),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| AnalyticsError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dest: &str, date: &str, id: i64) -> (String, String, i64, Option<i64>) {
        (dest.to_string(), date.to_string(), id, Some(20_000))
    }

    #[test]
    fn drops_groups_of_one() {
        let groups = group_rows(vec![
            row("DOM", "2024-01-01", 4_000_003),
            row("GUY", "2024-01-01", 4_000_001),
            row("GUY", "2024-01-01", 4_000_002),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].destination, "GUY");
        assert_eq!(groups[0].group_count, 2);
        assert_eq!(groups[0].shipments.len(), 2);
    }

    #[test]
    fn splits_same_destination_across_dates() {
        let groups = group_rows(vec![
            row("GUY", "2024-01-01", 4_000_001),
            row("GUY", "2024-01-01", 4_000_002),
            row("GUY", "2024-01-02", 4_000_003),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].date, "2024-01-01");
    }

    #[test]
    fn export_writes_one_row_per_group() {
        let groups = group_rows(vec![
            row("GUY", "2024-01-01", 4_000_001),
            row("GUY", "2024-01-01", 4_000_002),
        ]);
        let bytes = export_csv(&groups).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("destination,date,group_count,shipments")
        );
        assert_eq!(
            lines.next(),
            Some("GUY,2024-01-01,2,\"4000001:20000,4000002:20000\"")
        );
        assert_eq!(lines.next(), None);
    }
}
