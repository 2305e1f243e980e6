//! Module service: loads raw records, annotates them with derived metrics
//! and builds reports.

use crate::error::{InventoryError, InventoryResult};
use crate::models::{
    AnnotatedRecord, DailySaleEntry, InventoryRecord, ModuleKind, NewDailySale, NewSaleEvent,
    RecordInputs, RecordPatch, SaleEvent, SalesLedger,
};
use crate::reporting::{
    aggregate_month, check_quantity_covers_sales, check_sale, daily_sales_filename,
    derive_metrics, export_rows, module_report_filename, validate_daily_sale, validate_inputs,
    Field, MonthlyReport, ValidationError, YearMonth, CSV_CONTENT_TYPE,
};
use crate::services::metrics::{record_record_created, record_report_export, record_sale_event};
use crate::services::store::{RecordStore, SortOrder};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A sale to record against a product record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub record_id: Uuid,
    pub quantity: i64,
    pub sold_on: Option<NaiveDate>,
    pub sold_by: Option<String>,
}

/// Sales of one module, with totals over the returned lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesListing {
    pub sales: Vec<SaleEvent>,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
}

/// A rendered CSV report ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub content: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub module: ModuleKind,
    pub record_count: usize,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub low_stock_count: usize,
    /// Sum of positive balances; overpaid jobs do not offset other debts.
    pub outstanding_balance: Decimal,
}

impl ModuleSummary {
    fn from_records(module: ModuleKind, records: &[AnnotatedRecord]) -> Self {
        let mut summary = Self {
            module,
            record_count: records.len(),
            total_sales: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            low_stock_count: 0,
            outstanding_balance: Decimal::ZERO,
        };
        for record in records {
            let derived = &record.derived;
            summary.total_sales = summary.total_sales.saturating_add(derived.sales);
            summary.total_profit = summary.total_profit.saturating_add(derived.profit);
            if derived.is_low_stock {
                summary.low_stock_count += 1;
            }
            if let Some(balance) = derived.balance.filter(|b| *b > Decimal::ZERO) {
                summary.outstanding_balance = summary.outstanding_balance.saturating_add(balance);
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub modules: Vec<ModuleSummary>,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
}

fn total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn RecordStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // =========================================================================
    // Records
    // =========================================================================

    #[instrument(skip(self, inputs), fields(module = %inputs.module()))]
    pub async fn create_record(&self, inputs: RecordInputs) -> InventoryResult<AnnotatedRecord> {
        validate_inputs(&inputs)?;

        let record = self.store.insert_record(&inputs).await?;
        record_record_created(record.module().as_str());
        info!(record_id = %record.id, "Record created");

        let derived = derive_metrics(&record.inputs, &[] as &[SaleEvent]);
        Ok(AnnotatedRecord { record, derived })
    }

    #[instrument(skip(self))]
    pub async fn get_record(&self, record_id: Uuid) -> InventoryResult<AnnotatedRecord> {
        let record = self.load_record(record_id).await?;
        self.annotate_one(record).await
    }

    /// All records of a module, each with metrics recomputed from its sales.
    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        module: ModuleKind,
        order: SortOrder,
    ) -> InventoryResult<Vec<AnnotatedRecord>> {
        let records = self.store.select_records(module, order).await?;
        self.annotate(records).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_record(
        &self,
        record_id: Uuid,
        patch: RecordPatch,
    ) -> InventoryResult<AnnotatedRecord> {
        let existing = self.load_record(record_id).await?;
        if patch.is_empty() {
            return self.annotate_one(existing).await;
        }

        let merged = patch.apply_to(&existing.inputs)?;
        validate_inputs(&merged)?;
        // Stock may not be reduced below what has already left the shelf.
        if merged.module().is_product() && merged.quantity < existing.inputs.quantity {
            let sold = self.annotate_one(existing).await?.derived.units_sold;
            check_quantity_covers_sales(merged.quantity, sold)?;
        }

        let record = self
            .store
            .update_record(record_id, &merged)
            .await?
            .ok_or_else(|| InventoryError::not_found("record", record_id))?;
        info!(record_id = %record_id, "Record updated");

        self.annotate_one(record).await
    }

    #[instrument(skip(self))]
    pub async fn delete_record(&self, record_id: Uuid) -> InventoryResult<()> {
        if !self.store.delete_record(record_id).await? {
            return Err(InventoryError::not_found("record", record_id));
        }
        info!(record_id = %record_id, "Record deleted");
        Ok(())
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Record a sale at the record's current selling price and rate.
    ///
    /// Stock is read, checked and then written without a lock; two sales
    /// racing on the last units can both pass the check.
    #[instrument(skip(self, request), fields(record_id = %request.record_id, quantity = request.quantity))]
    pub async fn record_sale(
        &self,
        request: SaleRequest,
    ) -> InventoryResult<(SaleEvent, AnnotatedRecord)> {
        let record = self.load_record(request.record_id).await?;
        let before = self.annotate_one(record).await?;
        let current_stock = before.derived.stock.unwrap_or(0);
        let inputs = &before.record.inputs;

        check_sale(inputs, current_stock, request.quantity)?;
        let unit_price = inputs
            .details
            .selling_price()
            .ok_or(ValidationError::Missing(Field::SellingPrice))?;

        let new_sale = NewSaleEvent {
            record_id: before.record.id,
            module: before.record.module(),
            item_name: inputs.name.clone(),
            quantity: request.quantity,
            unit_price,
            unit_cost: inputs.rate,
            sold_on: request.sold_on.unwrap_or_else(|| Utc::now().date_naive()),
            sold_by: request.sold_by,
        };
        let sale = self.store.insert_sale_event(&new_sale).await?;
        record_sale_event(new_sale.module.as_str());
        info!(sale_id = %sale.sale_id, stock_before = current_stock, "Sale recorded");

        let after = self.annotate_one(before.record).await?;
        Ok((sale, after))
    }

    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        module: ModuleKind,
        sold_on: Option<NaiveDate>,
    ) -> InventoryResult<SalesListing> {
        let sales = self.store.select_sales(module, sold_on).await?;
        let total_sales = total(sales.iter().map(SaleEvent::total_amount));
        let total_profit = total(sales.iter().map(SaleEvent::profit));
        Ok(SalesListing {
            sales,
            total_sales,
            total_profit,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: Uuid) -> InventoryResult<()> {
        if !self.store.delete_sale_event(sale_id).await? {
            return Err(InventoryError::not_found("sale", sale_id));
        }
        info!(sale_id = %sale_id, "Sale deleted");
        Ok(())
    }

    // =========================================================================
    // Daily sales ledgers
    // =========================================================================

    #[instrument(skip(self, entry), fields(ledger = entry.ledger.as_str(), date = %entry.date))]
    pub async fn add_daily_sale(&self, entry: NewDailySale) -> InventoryResult<DailySaleEntry> {
        validate_daily_sale(&entry)?;
        let saved = self.store.insert_daily_sale(&entry).await?;
        record_sale_event(entry.ledger.as_str());
        info!(entry_id = %saved.entry_id, "Daily sale added");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete_daily_sale(&self, entry_id: Uuid) -> InventoryResult<()> {
        if !self.store.delete_daily_sale(entry_id).await? {
            return Err(InventoryError::not_found("daily sale", entry_id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(ledger = ledger.as_str(), period = %period))]
    pub async fn monthly_report(
        &self,
        ledger: SalesLedger,
        period: YearMonth,
    ) -> InventoryResult<MonthlyReport> {
        let (start, end) = period.bounds()?;
        let entries = self.store.select_daily_sales(ledger, start, end).await?;
        Ok(aggregate_month(&entries, period)?)
    }

    // =========================================================================
    // Exports
    // =========================================================================

    /// CSV of a module's records in list order, dated `as_of`.
    #[instrument(skip(self))]
    pub async fn export_module_report(
        &self,
        module: ModuleKind,
        as_of: NaiveDate,
    ) -> InventoryResult<ExportedReport> {
        let records = self.list_records(module, SortOrder::NewestFirst).await?;
        record_report_export("module");
        Ok(ExportedReport {
            filename: module_report_filename(module, as_of),
            content_type: CSV_CONTENT_TYPE,
            content: export_rows(&records)?,
            row_count: records.len(),
        })
    }

    #[instrument(skip(self), fields(ledger = ledger.as_str(), period = %period))]
    pub async fn export_daily_sales(
        &self,
        ledger: SalesLedger,
        period: YearMonth,
    ) -> InventoryResult<ExportedReport> {
        let report = self.monthly_report(ledger, period).await?;
        let entries: Vec<DailySaleEntry> = report.entries().cloned().collect();
        record_report_export("daily_sales");
        Ok(ExportedReport {
            filename: daily_sales_filename(ledger, period),
            content_type: CSV_CONTENT_TYPE,
            content: export_rows(&entries)?,
            row_count: entries.len(),
        })
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Headline figures for every module.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> InventoryResult<DashboardSummary> {
        let mut modules = Vec::with_capacity(ModuleKind::ALL.len());
        for module in ModuleKind::ALL {
            let records = self.list_records(module, SortOrder::NewestFirst).await?;
            modules.push(ModuleSummary::from_records(module, &records));
        }
        let total_sales = total(modules.iter().map(|m| m.total_sales));
        let total_profit = total(modules.iter().map(|m| m.total_profit));
        Ok(DashboardSummary {
            modules,
            total_sales,
            total_profit,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load_record(&self, record_id: Uuid) -> InventoryResult<InventoryRecord> {
        self.store
            .get_record(record_id)
            .await?
            .ok_or_else(|| InventoryError::not_found("record", record_id))
    }

    async fn annotate_one(&self, record: InventoryRecord) -> InventoryResult<AnnotatedRecord> {
        let sales = if record.module().is_product() {
            self.store.select_sale_events(&[record.id]).await?
        } else {
            Vec::new()
        };
        let derived = derive_metrics(&record.inputs, &sales);
        Ok(AnnotatedRecord { record, derived })
    }

    /// Attach derived metrics. Only product records have sale events to load.
    async fn annotate(
        &self,
        records: Vec<InventoryRecord>,
    ) -> InventoryResult<Vec<AnnotatedRecord>> {
        let product_ids: Vec<Uuid> = records
            .iter()
            .filter(|r| r.module().is_product())
            .map(|r| r.id)
            .collect();

        let mut sales_by_record: HashMap<Uuid, Vec<SaleEvent>> = HashMap::new();
        for sale in self.store.select_sale_events(&product_ids).await? {
            sales_by_record.entry(sale.record_id).or_default().push(sale);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let sales = sales_by_record.get(&record.id).map(Vec::as_slice).unwrap_or(&[]);
                let derived = derive_metrics(&record.inputs, sales);
                AnnotatedRecord { record, derived }
            })
            .collect())
    }
}
