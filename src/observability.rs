//! Metrics for the analytics engine, following Prometheus naming
//! conventions. Counter and histogram names live in one catalog enum so
//! call sites never carry magic strings.

use std::fmt;
use std::net::SocketAddr;

/// Every metric emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Upload / ingestion
    UploadSuccess,
    UploadError,
    UploadRowsIngested,
    UploadRowsRejected,
    UploadDuration,

    // Deduplication
    DedupeRuns,
    DedupeRowsRemoved,

    // Missing-value handling
    MissingFillZeroRuns,
    MissingRejectedRows,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::UploadSuccess => "shipments_upload_success_total",
            MetricName::UploadError => "shipments_upload_error_total",
            MetricName::UploadRowsIngested => "shipments_upload_rows_ingested_total",
            MetricName::UploadRowsRejected => "shipments_upload_rows_rejected_total",
            MetricName::UploadDuration => "shipments_upload_duration_seconds",
            MetricName::DedupeRuns => "shipments_dedupe_runs_total",
            MetricName::DedupeRowsRemoved => "shipments_dedupe_rows_removed_total",
            MetricName::MissingFillZeroRuns => "shipments_missing_fill_zero_runs_total",
            MetricName::MissingRejectedRows => "shipments_missing_rejected_rows",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus exporter. Safe to call more than once; later
/// installs log and keep the first exporter.
pub fn init_metrics() {
    let port: u16 = std::env::var("SHIPMENTS_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {e}");
        }
    }
}

pub mod ingest {
    use super::MetricName;

    pub fn upload_success() {
        ::metrics::counter!(MetricName::UploadSuccess.as_str()).increment(1);
    }

    pub fn upload_error() {
        ::metrics::counter!(MetricName::UploadError.as_str()).increment(1);
    }

    pub fn rows_ingested(count: u64) {
        ::metrics::counter!(MetricName::UploadRowsIngested.as_str()).increment(count);
    }

    pub fn rows_rejected(count: u64) {
        ::metrics::counter!(MetricName::UploadRowsRejected.as_str()).increment(count);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::UploadDuration.as_str()).record(secs);
    }
}

pub mod dedupe {
    use super::MetricName;

    pub fn run() {
        ::metrics::counter!(MetricName::DedupeRuns.as_str()).increment(1);
    }

    pub fn rows_removed(count: u64) {
        ::metrics::counter!(MetricName::DedupeRowsRemoved.as_str()).increment(count);
    }
}

pub mod missing {
    use super::MetricName;

    pub fn fill_zero_run() {
        ::metrics::counter!(MetricName::MissingFillZeroRuns.as_str()).increment(1);
    }

    pub fn rejected_rows(count: usize) {
        ::metrics::histogram!(MetricName::MissingRejectedRows.as_str()).record(count as f64);
    }
}
