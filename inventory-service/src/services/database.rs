//! PostgreSQL record store for inventory-service.

use crate::error::StoreError;
use crate::models::{
    DailySaleEntry, GiftCategory, InventoryRecord, ModuleKind, NewDailySale, NewSaleEvent,
    RecordDetails, RecordInputs, RecordRow, SaleEvent, SalesLedger,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{RecordStore, SortOrder};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "record_id, module, name, description, quantity, rate, \
    selling_price, category, custom_category, machine_type, quotation, deposit, expenditure, \
    low_stock_threshold, done_by, record_date, created_utc, updated_utc";

const SALE_COLUMNS: &str = "sale_id, record_id, module, item_name, quantity, unit_price, \
    unit_cost, sold_on, sold_by, created_utc";

const DAILY_SALE_COLUMNS: &str =
    "entry_id, ledger, date, item, code, quantity, unit, bpx, spx, created_utc";

/// Per-module columns of a record, flattened for binding.
struct DetailColumns<'a> {
    selling_price: Option<Decimal>,
    category: Option<&'static str>,
    custom_category: Option<&'a str>,
    machine_type: Option<&'static str>,
    quotation: Option<Decimal>,
    deposit: Option<Decimal>,
}

impl<'a> From<&'a RecordDetails> for DetailColumns<'a> {
    fn from(details: &'a RecordDetails) -> Self {
        let custom_category = match details.category() {
            Some(GiftCategory::Custom(label)) => Some(label.as_str()),
            _ => None,
        };
        Self {
            selling_price: details.selling_price(),
            category: details.category().map(|c| c.as_str()),
            custom_category,
            machine_type: details.machine_type().map(|m| m.as_str()),
            quotation: details.quotation(),
            deposit: details.deposit(),
        }
    }
}

fn to_records(rows: Vec<RecordRow>) -> Result<Vec<InventoryRecord>, StoreError> {
    rows.into_iter().map(InventoryRecord::try_from).collect()
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "inventory-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    // =========================================================================
    // Inventory records
    // =========================================================================

    #[instrument(skip(self), fields(module = %module))]
    async fn select_records(
        &self,
        module: ModuleKind,
        order: SortOrder,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["select_records"])
            .start_timer();

        let direction = match order {
            SortOrder::NewestFirst => "DESC",
            SortOrder::OldestFirst => "ASC",
        };
        let sql = format!(
            "SELECT {} FROM inventory_records WHERE module = $1 ORDER BY created_utc {}, record_id {}",
            RECORD_COLUMNS, direction, direction
        );

        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(module.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to list {} records: {}", module, e)))?;

        timer.observe_duration();
        to_records(rows)
    }

    #[instrument(skip(self), fields(record_id = %record_id))]
    async fn get_record(&self, record_id: Uuid) -> Result<Option<InventoryRecord>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_record"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM inventory_records WHERE record_id = $1",
            RECORD_COLUMNS
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to get record: {}", e)))?;

        timer.observe_duration();
        row.map(InventoryRecord::try_from).transpose()
    }

    #[instrument(skip(self, inputs), fields(module = %inputs.module()))]
    async fn insert_record(&self, inputs: &RecordInputs) -> Result<InventoryRecord, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_record"])
            .start_timer();

        let record_id = Uuid::new_v4();
        let details = DetailColumns::from(&inputs.details);
        let sql = format!(
            r#"
            INSERT INTO inventory_records (record_id, module, name, description, quantity, rate,
                selling_price, category, custom_category, machine_type, quotation, deposit,
                expenditure, low_stock_threshold, done_by, record_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(record_id)
            .bind(inputs.module().as_str())
            .bind(&inputs.name)
            .bind(&inputs.description)
            .bind(inputs.quantity)
            .bind(inputs.rate)
            .bind(details.selling_price)
            .bind(details.category)
            .bind(details.custom_category)
            .bind(details.machine_type)
            .bind(details.quotation)
            .bind(details.deposit)
            .bind(inputs.expenditure)
            .bind(inputs.low_stock_threshold)
            .bind(&inputs.done_by)
            .bind(inputs.record_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to insert record: {}", e)))?;

        timer.observe_duration();
        info!(record_id = %row.record_id, "Record inserted");

        InventoryRecord::try_from(row)
    }

    #[instrument(skip(self, inputs), fields(record_id = %record_id))]
    async fn update_record(
        &self,
        record_id: Uuid,
        inputs: &RecordInputs,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_record"])
            .start_timer();

        let details = DetailColumns::from(&inputs.details);
        let sql = format!(
            r#"
            UPDATE inventory_records
            SET name = $2, description = $3, quantity = $4, rate = $5, selling_price = $6,
                category = $7, custom_category = $8, machine_type = $9, quotation = $10,
                deposit = $11, expenditure = $12, low_stock_threshold = $13, done_by = $14,
                record_date = $15, updated_utc = NOW()
            WHERE record_id = $1
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(record_id)
            .bind(&inputs.name)
            .bind(&inputs.description)
            .bind(inputs.quantity)
            .bind(inputs.rate)
            .bind(details.selling_price)
            .bind(details.category)
            .bind(details.custom_category)
            .bind(details.machine_type)
            .bind(details.quotation)
            .bind(details.deposit)
            .bind(inputs.expenditure)
            .bind(inputs.low_stock_threshold)
            .bind(&inputs.done_by)
            .bind(inputs.record_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to update record: {}", e)))?;

        timer.observe_duration();
        row.map(InventoryRecord::try_from).transpose()
    }

    #[instrument(skip(self), fields(record_id = %record_id))]
    async fn delete_record(&self, record_id: Uuid) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_record"])
            .start_timer();

        let result = sqlx::query("DELETE FROM inventory_records WHERE record_id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to delete record: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Sale events
    // =========================================================================

    #[instrument(skip(self, record_ids), fields(records = record_ids.len()))]
    async fn select_sale_events(&self, record_ids: &[Uuid]) -> Result<Vec<SaleEvent>, StoreError> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }
        let timer = DB_QUERY_DURATION
            .with_label_values(&["select_sale_events"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM sale_events WHERE record_id = ANY($1) ORDER BY created_utc ASC",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, SaleEvent>(&sql)
            .bind(record_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to load sale events: {}", e)))?;

        timer.observe_duration();
        Ok(sales)
    }

    #[instrument(skip(self), fields(module = %module))]
    async fn select_sales(
        &self,
        module: ModuleKind,
        sold_on: Option<NaiveDate>,
    ) -> Result<Vec<SaleEvent>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["select_sales"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {} FROM sale_events
            WHERE module = $1 AND ($2::DATE IS NULL OR sold_on = $2)
            ORDER BY sold_on ASC, created_utc ASC
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, SaleEvent>(&sql)
            .bind(module.as_str())
            .bind(sold_on)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to list sales: {}", e)))?;

        timer.observe_duration();
        Ok(sales)
    }

    #[instrument(skip(self, sale), fields(record_id = %sale.record_id, quantity = sale.quantity))]
    async fn insert_sale_event(&self, sale: &NewSaleEvent) -> Result<SaleEvent, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_sale_event"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO sale_events (sale_id, record_id, module, item_name, quantity, unit_price,
                unit_cost, sold_on, sold_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SALE_COLUMNS
        );
        let event = sqlx::query_as::<_, SaleEvent>(&sql)
            .bind(Uuid::new_v4())
            .bind(sale.record_id)
            .bind(sale.module.as_str())
            .bind(&sale.item_name)
            .bind(sale.quantity)
            .bind(sale.unit_price)
            .bind(sale.unit_cost)
            .bind(sale.sold_on)
            .bind(&sale.sold_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to record sale: {}", e)))?;

        timer.observe_duration();
        info!(sale_id = %event.sale_id, "Sale event inserted");
        Ok(event)
    }

    #[instrument(skip(self), fields(sale_id = %sale_id))]
    async fn delete_sale_event(&self, sale_id: Uuid) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_sale_event"])
            .start_timer();

        let result = sqlx::query("DELETE FROM sale_events WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to delete sale: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Daily sales ledgers
    // =========================================================================

    #[instrument(skip(self), fields(ledger = ledger.as_str()))]
    async fn select_daily_sales(
        &self,
        ledger: SalesLedger,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySaleEntry>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["select_daily_sales"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {} FROM daily_sales
            WHERE ledger = $1 AND date >= $2 AND date < $3
            ORDER BY date ASC, created_utc ASC
            "#,
            DAILY_SALE_COLUMNS
        );
        let entries = sqlx::query_as::<_, DailySaleEntry>(&sql)
            .bind(ledger.as_str())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to load daily sales: {}", e)))?;

        timer.observe_duration();
        Ok(entries)
    }

    #[instrument(skip(self, entry), fields(ledger = entry.ledger.as_str(), date = %entry.date))]
    async fn insert_daily_sale(&self, entry: &NewDailySale) -> Result<DailySaleEntry, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_daily_sale"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO daily_sales (entry_id, ledger, date, item, code, quantity, unit, bpx, spx)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            DAILY_SALE_COLUMNS
        );
        let saved = sqlx::query_as::<_, DailySaleEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(entry.ledger.as_str())
            .bind(entry.date)
            .bind(&entry.item)
            .bind(&entry.code)
            .bind(entry.quantity)
            .bind(&entry.unit)
            .bind(entry.bpx)
            .bind(entry.spx)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to add daily sale: {}", e)))?;

        timer.observe_duration();
        Ok(saved)
    }

    #[instrument(skip(self), fields(entry_id = %entry_id))]
    async fn delete_daily_sale(&self, entry_id: Uuid) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_daily_sale"])
            .start_timer();

        let result = sqlx::query("DELETE FROM daily_sales WHERE entry_id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to delete daily sale: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }
}
