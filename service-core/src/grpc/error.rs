//! Mapping of service errors onto `tonic::Status`.
//!
//! | AppError | gRPC Status |
//! |----------|-------------|
//! | `InternalError`, `DatabaseError`, `ConfigError` | `INTERNAL` |
//! | `ServiceUnavailable` | `UNAVAILABLE` |
//!
//! Service crates implement [`IntoStatus`] for their own error enums so the
//! handlers can finish every call the same way.

use tonic::Status;

use crate::error::AppError;

/// Conversion of an error into the status sent to the caller.
pub trait IntoStatus {
    fn into_status(self) -> Status;
}

impl IntoStatus for AppError {
    fn into_status(self) -> Status {
        match self {
            AppError::ServiceUnavailable => Status::unavailable("Service unavailable"),
            // Internal details are logged, never returned.
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal error");
                Status::internal("Internal server error")
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                Status::internal("Database error")
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                Status::internal("Configuration error")
            }
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.into_status()
    }
}

/// Result type alias for gRPC handlers.
pub type GrpcResult<T> = Result<tonic::Response<T>, Status>;

/// Finish a handler: wrap the body or convert the error.
pub fn into_response<T, E: IntoStatus>(result: Result<T, E>) -> GrpcResult<T> {
    result.map(tonic::Response::new).map_err(IntoStatus::into_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn config_error_is_internal() {
        let status: Status = AppError::ConfigError(anyhow::anyhow!("port out of range")).into();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Configuration error");
    }

    #[test]
    fn database_error_hides_details() {
        let err = AppError::DatabaseError(anyhow::anyhow!("connection refused at 10.0.0.3"));
        let status: Status = err.into();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Database error");
    }

    #[test]
    fn into_response_wraps_ok_and_maps_err() {
        let ok: GrpcResult<u8> = into_response(Ok::<_, AppError>(7));
        assert_eq!(ok.map(tonic::Response::into_inner).ok(), Some(7));

        let err = into_response::<u8, _>(Err(AppError::ServiceUnavailable)).unwrap_err();
        assert_eq!(err.code(), Code::Unavailable);
    }
}
