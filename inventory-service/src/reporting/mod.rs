//! Derived metrics, monthly aggregation and CSV export.
//!
//! Nothing in this module touches the store.

pub mod aggregator;
pub mod calculator;
pub mod error;
pub mod export;

pub use aggregator::{aggregate_month, DayGroup, MonthlyReport, Subtotal, YearMonth};
pub use calculator::{
    check_quantity_covers_sales, check_sale, derive_metrics, validate_daily_sale,
    validate_inputs, DerivedMetrics,
};
pub use error::{ExportError, Field, InvalidPeriod, ValidationError};
pub use export::{
    daily_sales_filename, export_csv, export_rows, module_report_filename, CsvRecord,
    ToCsvRecord, CSV_CONTENT_TYPE,
};
