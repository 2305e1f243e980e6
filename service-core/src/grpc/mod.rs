//! gRPC utilities shared by the services.
//!
//! Errors become `tonic::Status` through [`IntoStatus`]; the interceptors
//! carry trace context and request ids into handler extensions.

pub mod error;
pub mod interceptors;

pub use error::{GrpcResult, IntoStatus, into_response};
pub use interceptors::{
    REQUEST_ID_KEY, TRACEPARENT_KEY, extract_request_id, extract_traceparent,
    trace_context_interceptor,
};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
