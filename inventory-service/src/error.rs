//! Error taxonomy for inventory-service.

use crate::reporting::{ExportError, InvalidPeriod, ValidationError};
use service_core::grpc::IntoStatus;
use thiserror::Error;
use tonic::metadata::MetadataValue;
use tonic::Status;

/// Metadata key naming the rejected input on `INVALID_ARGUMENT` responses.
pub const INVALID_FIELD_KEY: &str = "x-invalid-field";

/// A failure reported by the record store. Carries the store's message;
/// the operation is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::new(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriod),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("report export failed: {0}")]
    Export(#[from] ExportError),
}

impl InventoryError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Label used for the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
            Self::InvalidPeriod(_) => "invalid_period",
            Self::NotFound { .. } => "not_found",
            Self::Export(_) => "export",
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl IntoStatus for InventoryError {
    fn into_status(self) -> Status {
        match &self {
            InventoryError::Validation(v) => {
                let mut status = Status::invalid_argument(v.to_string());
                if let Some(field) = v.field() {
                    status
                        .metadata_mut()
                        .insert(INVALID_FIELD_KEY, MetadataValue::from_static(field.as_str()));
                }
                status
            }
            InventoryError::InvalidPeriod(p) => Status::invalid_argument(p.to_string()),
            InventoryError::NotFound { .. } => Status::not_found(self.to_string()),
            InventoryError::Store(s) => {
                tracing::error!(error = %s, "Record store failure");
                Status::unavailable(s.message.clone())
            }
            InventoryError::Export(e) => {
                tracing::error!(error = %e, "Report export failure");
                Status::internal("report export failed")
            }
        }
    }
}

impl From<InventoryError> for Status {
    fn from(err: InventoryError) -> Self {
        err.into_status()
    }
}
