//! Thin HTTP surface over the pipeline and query layer. Handlers parse the
//! request, call into the core, and map errors onto status codes; no
//! business logic lives here.

use crate::config::Config;
use crate::db::ShipmentStore;
use crate::error::AnalyticsError;
use crate::pipeline::ingest::{ensure_csv_filename, ingest_csv};
use crate::pipeline::missing::{handle as handle_missing, MissingValueStrategy};
use crate::queries::consolidation::{consolidation, export_csv};
use crate::queries::metrics::{
    received_by_carrier, summary_statistics, throughput_over_time, volume_by_mode,
    warehouse_utilization,
};
use crate::queries::{get_shipment, list_shipments, ShipmentFilter};
use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Extension, Router,
};
use chrono::NaiveDate;
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ShipmentStore>,
    pub config: Arc<Config>,
}

fn error_response(err: AnalyticsError) -> Response {
    let status = match &err {
        AnalyticsError::SchemaMismatch { .. }
        | AnalyticsError::Parse(_)
        | AnalyticsError::InvariantViolation { .. }
        | AnalyticsError::InvalidStrategy(_)
        | AnalyticsError::UnsupportedUpload(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::StoreNotInitialized => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "detail": err.to_string() }))).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shipment-analytics",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    filename: Option<String>,
}

async fn upload(
    Extension(state): Extension<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response {
    let filename = params.filename.unwrap_or_else(|| "upload".to_string());
    if let Err(e) = ensure_csv_filename(&filename) {
        return error_response(e);
    }
    match ingest_csv(&state.store, &body) {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct MissingValueParams {
    strategy: String,
}

async fn missing_values(
    Extension(state): Extension<AppState>,
    Query(params): Query<MissingValueParams>,
) -> Response {
    let strategy: MissingValueStrategy = match params.strategy.parse() {
        Ok(s) => s,
        Err(e) => return error_response(e),
    };
    match handle_missing(&state.store, strategy) {
        Ok(rows) => Json(serde_json::json!({
            "strategy": strategy.to_string(),
            "rejected_rows": rows,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn db_status(Extension(state): Extension<AppState>) -> Response {
    match state.store.status() {
        Ok(status) => Json(status).into_response(),
        Err(e) => error_response(e),
    }
}

async fn db_delete(Extension(state): Extension<AppState>) -> Response {
    match state.store.reset() {
        Ok(true) => Json(serde_json::json!({
            "message": "shipment data set deleted",
            "deleted": true
        }))
        .into_response(),
        Ok(false) => Json(serde_json::json!({
            "message": "no shipment data set to delete",
            "deleted": false
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u64>,
    page_size: Option<u64>,
    status: Option<crate::domain::ShipmentStatus>,
    destination: Option<crate::domain::Destination>,
    carrier: Option<crate::domain::Carrier>,
    arrival_date_start: Option<NaiveDate>,
    arrival_date_end: Option<NaiveDate>,
    search: Option<i64>,
}

async fn shipments(
    Extension(state): Extension<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(100);
    let filter = ShipmentFilter {
        status: params.status,
        destination: params.destination,
        carrier: params.carrier,
        arrival_date_start: params.arrival_date_start,
        arrival_date_end: params.arrival_date_end,
        search: params.search,
    };
    match list_shipments(&state.store, page, page_size, &filter) {
        Ok(result) => Json(serde_json::json!({
            "page": page,
            "page_size": page_size,
            "total_count": result.total_count,
            "shipments": result.shipments,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn shipment_details(
    Extension(state): Extension<AppState>,
    Path(shipment_id): Path<i64>,
) -> Response {
    match get_shipment(&state.store, shipment_id) {
        Ok(Some(row)) => Json(row).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "detail": format!("Shipment {shipment_id} not found")
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ConsolidationParams {
    destination: Option<crate::domain::Destination>,
    date: Option<NaiveDate>,
}

async fn cargo_consolidation(
    Extension(state): Extension<AppState>,
    Query(params): Query<ConsolidationParams>,
) -> Response {
    let policy = state.config.consolidation.policy;
    match consolidation(&state.store, policy, params.destination, params.date) {
        Ok(groups) => Json(serde_json::json!({ "cargo_consolidation": groups })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn cargo_consolidation_export(
    Extension(state): Extension<AppState>,
    Query(params): Query<ConsolidationParams>,
) -> Response {
    let policy = state.config.consolidation.policy;
    let groups = match consolidation(&state.store, policy, params.destination, params.date) {
        Ok(groups) => groups,
        Err(e) => return error_response(e),
    };
    match export_csv(&groups) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"consolidation.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn warehouse(Extension(state): Extension<AppState>) -> Response {
    let scope = state.config.warehouse.utilization_scope;
    let capacity = state.config.warehouse.capacity_cm3;
    match warehouse_utilization(&state.store, scope, capacity) {
        Ok(utilization) => {
            Json(serde_json::json!({ "warehouse_utilization": utilization })).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn summary(Extension(state): Extension<AppState>) -> Response {
    let scope = state.config.warehouse.utilization_scope;
    let capacity = state.config.warehouse.capacity_cm3;
    match summary_statistics(&state.store, scope, capacity) {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct DateRangeParams {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

async fn carrier_series(
    Extension(state): Extension<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    match received_by_carrier(&state.store, params.start_date, params.end_date) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response(e),
    }
}

async fn mode_volumes(Extension(state): Extension<AppState>) -> Response {
    match volume_by_mode(&state.store) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response(e),
    }
}

async fn throughput(
    Extension(state): Extension<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    match throughput_over_time(&state.store, params.start_date, params.end_date) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response(e),
    }
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/missing-values", post(missing_values))
        .route("/admin/db-status", get(db_status))
        .route("/admin/db", delete(db_delete))
        .route("/metrics/shipments", get(shipments))
        .route("/metrics/shipments/:shipment_id", get(shipment_details))
        .route("/metrics/consolidation", get(cargo_consolidation))
        .route(
            "/metrics/consolidation/export",
            get(cargo_consolidation_export),
        )
        .route("/metrics/warehouse", get(warehouse))
        .route("/metrics/summary", get(summary))
        .route("/metrics/received-by-carrier", get(carrier_series))
        .route("/metrics/volume-by-mode", get(mode_volumes))
        .route("/metrics/throughput", get(throughput))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📦 Upload:       http://localhost:{port}/upload");
    println!("📊 Analytics:    http://localhost:{port}/metrics/summary");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
