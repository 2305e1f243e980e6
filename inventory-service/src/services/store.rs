//! Query surface of the record store.

use crate::error::StoreError;
use crate::models::{
    DailySaleEntry, InventoryRecord, ModuleKind, NewDailySale, NewSaleEvent, RecordInputs,
    SaleEvent, SalesLedger,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Listing order for a module's records, by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Collections the service reads and writes. Every call is a single round
/// trip; implementations never retry and report failures as `StoreError`.
///
/// Updates replace the whole input set; the service merges patches before
/// calling `update_record`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn select_records(
        &self,
        module: ModuleKind,
        order: SortOrder,
    ) -> Result<Vec<InventoryRecord>, StoreError>;

    async fn get_record(&self, record_id: Uuid) -> Result<Option<InventoryRecord>, StoreError>;

    async fn insert_record(&self, inputs: &RecordInputs) -> Result<InventoryRecord, StoreError>;

    /// Returns `None` when no record has that id.
    async fn update_record(
        &self,
        record_id: Uuid,
        inputs: &RecordInputs,
    ) -> Result<Option<InventoryRecord>, StoreError>;

    /// Returns whether a record was removed. Sale events are left alone.
    async fn delete_record(&self, record_id: Uuid) -> Result<bool, StoreError>;

    /// Sale events referencing any of `record_ids`, oldest first.
    async fn select_sale_events(&self, record_ids: &[Uuid]) -> Result<Vec<SaleEvent>, StoreError>;

    /// Sale events of a module, optionally restricted to one day, oldest first.
    async fn select_sales(
        &self,
        module: ModuleKind,
        sold_on: Option<NaiveDate>,
    ) -> Result<Vec<SaleEvent>, StoreError>;

    async fn insert_sale_event(&self, sale: &NewSaleEvent) -> Result<SaleEvent, StoreError>;

    async fn delete_sale_event(&self, sale_id: Uuid) -> Result<bool, StoreError>;

    /// Entries of `ledger` dated in `[start, end)`, by date then creation time.
    async fn select_daily_sales(
        &self,
        ledger: SalesLedger,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySaleEntry>, StoreError>;

    async fn insert_daily_sale(&self, entry: &NewDailySale) -> Result<DailySaleEntry, StoreError>;

    async fn delete_daily_sale(&self, entry_id: Uuid) -> Result<bool, StoreError>;
}
