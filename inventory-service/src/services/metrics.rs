//! Prometheus metrics for inventory-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Counter for gRPC requests by method and status.
pub static GRPC_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "inventory_grpc_requests_total",
        "Total number of gRPC requests",
        &["method", "status"]
    )
    .expect("Failed to register GRPC_REQUESTS")
});

/// Histogram for gRPC request duration by method.
pub static GRPC_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "inventory_grpc_request_duration_seconds",
        "gRPC request duration in seconds",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register GRPC_REQUEST_DURATION")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "inventory_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Records created, by module.
pub static RECORDS_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "inventory_records_created_total",
        "Total number of inventory records created",
        &["module"]
    )
    .expect("Failed to register RECORDS_CREATED")
});

/// Sale events and daily sales entries, by module or ledger.
pub static SALES_RECORDED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "inventory_sales_recorded_total",
        "Total number of sales recorded",
        &["source"]
    )
    .expect("Failed to register SALES_RECORDED")
});

pub static REPORTS_EXPORTED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "inventory_reports_exported_total",
        "Total number of CSV reports exported",
        &["report"]
    )
    .expect("Failed to register REPORTS_EXPORTED")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "inventory_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&GRPC_REQUESTS);
    Lazy::force(&GRPC_REQUEST_DURATION);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&RECORDS_CREATED);
    Lazy::force(&SALES_RECORDED);
    Lazy::force(&REPORTS_EXPORTED);
    Lazy::force(&ERRORS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_grpc_request(method: &str, status: &str) {
    GRPC_REQUESTS.with_label_values(&[method, status]).inc();
}

pub fn record_grpc_request_duration(method: &str, duration_secs: f64) {
    GRPC_REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration_secs);
}

pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}

pub fn record_record_created(module: &str) {
    RECORDS_CREATED.with_label_values(&[module]).inc();
}

pub fn record_sale_event(source: &str) {
    SALES_RECORDED.with_label_values(&[source]).inc();
}

pub fn record_report_export(report: &str) {
    REPORTS_EXPORTED.with_label_values(&[report]).inc();
}
