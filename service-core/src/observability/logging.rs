use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: env filter, OTLP span export and JSON logs.
///
/// When `otlp_endpoint` is `None` only the JSON log layer is installed.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    fn fmt_layer<S>() -> tracing_subscriber::fmt::Layer<
        S,
        tracing_subscriber::fmt::format::JsonFields,
        tracing_subscriber::fmt::format::Format<tracing_subscriber::fmt::format::Json>,
    > {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
    }

    let Some(endpoint) = otlp_endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer())
            .init();
        return;
    };

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio);

    match tracer {
        Ok(tracer) => {
            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(telemetry)
                .with(fmt_layer())
                .init();
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer())
                .init();
            tracing::warn!(
                service = service_name,
                endpoint = endpoint,
                error = %e,
                "OTLP tracer unavailable, logging without span export"
            );
        }
    }
}

static TEST_INIT: Once = Once::new();

/// Plain fmt subscriber routed through the test writer. Safe to call from every test.
pub fn init_test_tracing(filter: &str) {
    TEST_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}
