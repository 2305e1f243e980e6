//! Services module for inventory-service.

pub mod database;
pub mod inventory;
pub mod metrics;
pub mod store;
pub mod view;

pub use database::Database;
pub use inventory::{
    DashboardSummary, ExportedReport, InventoryService, ModuleSummary, SaleRequest, SalesListing,
};
pub use metrics::{
    get_metrics, init_metrics, record_error, record_grpc_request, record_grpc_request_duration,
};
pub use store::{RecordStore, SortOrder};
pub use view::{ModuleCommand, ModuleView, ViewSnapshot};
