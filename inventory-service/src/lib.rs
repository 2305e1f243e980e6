//! Inventory Service - stock, sales and service-job tracking for a small shop.

pub mod config;
pub mod error;
pub mod grpc;
pub mod models;
pub mod reporting;
pub mod services;
pub mod startup;
