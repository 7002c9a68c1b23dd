use anyhow::Result;
use shipment_analytics::db::ShipmentStore;
use shipment_analytics::error::AnalyticsError;
use shipment_analytics::pipeline::dedupe::dedupe;
use shipment_analytics::pipeline::ingest::ingest_csv;
use shipment_analytics::pipeline::missing::{handle, MissingValueStrategy};
use tempfile::tempdir;

const HEADER: &str = "shipment_id,customer_id,origin,destination,weight,volume,carrier,mode,\
                      status,arrival_date,departure_date,delivered_date";

fn csv_of(rows: &[&str]) -> Vec<u8> {
    format!("{HEADER}\n{}\n", rows.join("\n")).into_bytes()
}

#[test]
fn ingest_loads_validates_and_dedupes() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let data = csv_of(&[
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,",
        "4000002,22000,NY,SVG,900,4000,DHL,sea,received,2024-01-02,,",
        "4000003,23000,TX,DOM,500,2500,UPS,air,delivered,2024-01-01,2024-01-03,2024-01-05",
    ]);

    let report = ingest_csv(&store, &data)?;
    assert_eq!(report.total_uploaded, 3);
    assert_eq!(report.duplicates_removed, 0);
    assert_eq!(report.total_shipments, 3);
    assert_eq!(report.rejected_rows, 0);
    assert_eq!(store.count_shipments()?, 3);
    Ok(())
}

#[test]
fn dedupe_keeps_earliest_arrival_and_is_idempotent() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    // Three rows for one shipment id; the 2024-01-02 arrival must survive.
    let data = csv_of(&[
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-05,,",
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-02,,",
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-09,,",
        "4000002,22000,NY,SVG,900,4000,DHL,sea,received,2024-01-02,,",
    ]);

    let report = ingest_csv(&store, &data)?;
    assert_eq!(report.total_uploaded, 4);
    assert_eq!(report.duplicates_removed, 2);
    assert_eq!(report.total_shipments, 2);

    let survivor = shipment_analytics::queries::get_shipment(&store, 4_000_001)?.unwrap();
    assert_eq!(survivor.arrival_date.as_deref(), Some("2024-01-02"));

    // Running it again removes nothing.
    assert_eq!(dedupe(&store)?, 0);
    Ok(())
}

#[test]
fn dedupe_tie_break_keeps_first_uploaded_row() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    // Same id, same earliest arrival; the first row in upload order wins.
    let data = csv_of(&[
        "4000001,21000,FL,GUY,111,8000,FEDEX,air,received,2024-01-01,,",
        "4000001,21000,FL,GUY,222,8000,FEDEX,air,received,2024-01-01,,",
    ]);

    let report = ingest_csv(&store, &data)?;
    assert_eq!(report.duplicates_removed, 1);

    let survivor = shipment_analytics::queries::get_shipment(&store, 4_000_001)?.unwrap();
    assert_eq!(survivor.weight, Some(111));
    Ok(())
}

#[test]
fn schema_mismatch_leaves_previous_data_untouched() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let good = csv_of(&["4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,"]);
    ingest_csv(&store, &good)?;

    // Missing the carrier column entirely.
    let bad = "shipment_id,customer_id,origin,destination,weight,volume,mode,\
               status,arrival_date,departure_date,delivered_date\n\
               4000009,21000,FL,GUY,1,1,air,received,2024-01-01,,\n";
    let err = ingest_csv(&store, bad.as_bytes()).unwrap_err();
    match err {
        AnalyticsError::SchemaMismatch { missing, extra } => {
            assert_eq!(missing, vec!["carrier".to_string()]);
            assert!(extra.is_empty());
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }

    // The previous data set survives intact.
    assert_eq!(store.count_shipments()?, 1);
    assert!(
        shipment_analytics::queries::get_shipment(&store, 4_000_001)?.is_some()
    );
    Ok(())
}

#[test]
fn extra_column_is_named_in_the_mismatch() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let bad = format!("{HEADER},priority\n");
    let err = ingest_csv(&store, bad.as_bytes()).unwrap_err();
    match err {
        AnalyticsError::SchemaMismatch { missing, extra } => {
            assert!(missing.is_empty());
            assert_eq!(extra, vec!["priority".to_string()]);
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn ragged_rows_are_a_parse_error() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let bad = format!("{HEADER}\n4000001,21000,FL\n");
    let err = ingest_csv(&store, bad.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Parse(_)));
    Ok(())
}

#[test]
fn invalid_rows_are_rejected_but_reported() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let data = csv_of(&[
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,",
        // intransit without a departure date violates the status invariant
        "4000002,22000,NY,SVG,900,4000,DHL,sea,intransit,2024-01-02,,",
    ]);

    let report = ingest_csv(&store, &data)?;
    assert_eq!(report.total_uploaded, 1);
    assert_eq!(report.rejected_rows, 1);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].contains("departure_date"));
    Ok(())
}

#[test]
fn reupload_replaces_the_whole_data_set() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    let first = csv_of(&[
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,",
        "4000002,22000,NY,SVG,900,4000,DHL,sea,received,2024-01-02,,",
    ]);
    ingest_csv(&store, &first)?;

    let second = csv_of(&["4000009,30000,GA,BIM,700,3000,USPS,sea,received,2024-02-01,,"]);
    let report = ingest_csv(&store, &second)?;
    assert_eq!(report.total_shipments, 1);
    assert_eq!(store.count_shipments()?, 1);
    assert!(shipment_analytics::queries::get_shipment(&store, 4_000_001)?.is_none());
    Ok(())
}

#[test]
fn missing_value_strategies_follow_the_contract() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    // Second row has a null weight.
    let data = csv_of(&[
        "4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,",
        "4000002,22000,NY,SVG,,4000,DHL,sea,received,2024-01-02,,",
    ]);
    ingest_csv(&store, &data)?;

    // reject surfaces the incomplete row without mutating anything
    let rejected = handle(&store, MissingValueStrategy::Reject)?;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].shipment_id, Some(4_000_002));
    assert_eq!(rejected[0].weight, None);

    // fill_zero zeroes the gap and leaves every other field alone
    let filled = handle(&store, MissingValueStrategy::FillZero)?;
    assert!(filled.is_empty());
    let row = shipment_analytics::queries::get_shipment(&store, 4_000_002)?.unwrap();
    assert_eq!(row.weight, Some(0));
    assert_eq!(row.volume, Some(4000));
    assert_eq!(row.carrier.as_deref(), Some("DHL"));
    assert_eq!(row.arrival_date.as_deref(), Some("2024-01-02"));

    // nothing left to reject afterwards
    assert!(handle(&store, MissingValueStrategy::Reject)?.is_empty());
    Ok(())
}

#[test]
fn reset_reports_whether_anything_was_deleted() -> Result<()> {
    let store = ShipmentStore::open_in_memory()?;
    assert!(!store.reset()?);

    let data = csv_of(&["4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,"]);
    ingest_csv(&store, &data)?;
    assert!(store.reset()?);
    assert!(!store.reset()?);

    // Reads after reset surface the uninitialized store, not empty results.
    let err = store.count_shipments().unwrap_err();
    assert!(matches!(err, AnalyticsError::StoreNotInitialized));
    Ok(())
}

#[test]
fn on_disk_store_reports_status() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shipments.db");
    let store = ShipmentStore::open(&path)?;

    let status = store.status()?;
    assert!(status.exists);
    assert!(!status.loaded);
    assert_eq!(status.total_shipments, 0);

    let data = csv_of(&["4000001,21000,FL,GUY,1200,8000,FEDEX,air,received,2024-01-01,,"]);
    ingest_csv(&store, &data)?;

    let status = store.status()?;
    assert!(status.exists);
    assert!(status.loaded);
    assert_eq!(status.total_shipments, 1);
    Ok(())
}
