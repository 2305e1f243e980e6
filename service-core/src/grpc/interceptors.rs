//! gRPC interceptors for cross-cutting concerns.

use tonic::{Request, Status};

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Interceptor that logs incoming trace context and records the request ID
/// on the current span.
///
/// ```ignore
/// let svc = InventoryServiceServer::with_interceptor(service, trace_context_interceptor);
/// ```
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(traceparent) = extract_traceparent(&request) {
        tracing::debug!(traceparent = %traceparent, "Received trace context");
    }

    if let Some(request_id) = extract_request_id(&request) {
        tracing::Span::current().record("request_id", request_id.as_str());
    }

    Ok(request)
}

/// Extract trace context from incoming gRPC request metadata.
pub fn extract_traceparent<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(TRACEPARENT_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract request ID from incoming gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
