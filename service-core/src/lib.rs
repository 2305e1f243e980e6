//! service-core: Shared infrastructure for the inventory services.
pub mod config;
pub mod error;
pub mod grpc;
pub mod middleware;
pub mod observability;

