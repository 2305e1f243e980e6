//! Common test utilities for inventory-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use inventory_service::config::{DatabaseConfig, InventoryConfig};
use inventory_service::error::StoreError;
use inventory_service::grpc::proto::inventory_service_client::InventoryServiceClient;
use inventory_service::grpc::proto::{self, Module};
use inventory_service::models::{
    DailySaleEntry, InventoryRecord, ModuleKind, NewDailySale, NewSaleEvent, RecordInputs,
    SaleEvent, SalesLedger,
};
use inventory_service::services::{RecordStore, SortOrder};
use inventory_service::startup::Application;
use service_core::config::Config as CommonConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tonic::transport::Channel;
use uuid::Uuid;

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    service_core::observability::init_test_tracing("info,inventory_service=debug,sqlx=warn");
}

/// Test configuration on ephemeral ports. The database URL is only read by
/// `Application::build`, which the in-memory tests never call.
pub fn test_config() -> InventoryConfig {
    InventoryConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "inventory-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 2,
            min_connections: 1,
        },
    }
}

// ============================================================================
// In-memory record store
// ============================================================================

#[derive(Default)]
struct Tables {
    records: Vec<InventoryRecord>,
    sales: Vec<SaleEvent>,
    daily_sales: Vec<DailySaleEntry>,
}

/// `RecordStore` kept in process memory. Rows are held in insertion order,
/// which doubles as creation order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    latency: Option<Duration>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every read of records by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn sale_count(&self) -> usize {
        self.tables.read().await.sales.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::new("connection refused"));
        }
        Ok(())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn select_records(
        &self,
        module: ModuleKind,
        order: SortOrder,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        self.delay().await;
        self.check()?;
        let mut records: Vec<InventoryRecord> = self
            .tables
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.module() == module)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_utc);
        if order == SortOrder::NewestFirst {
            records.reverse();
        }
        Ok(records)
    }

    async fn get_record(&self, record_id: Uuid) -> Result<Option<InventoryRecord>, StoreError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == record_id)
            .cloned())
    }

    async fn insert_record(&self, inputs: &RecordInputs) -> Result<InventoryRecord, StoreError> {
        self.check()?;
        let now = Utc::now();
        let record = InventoryRecord {
            id: Uuid::new_v4(),
            inputs: inputs.clone(),
            created_utc: now,
            updated_utc: now,
        };
        self.tables.write().await.records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        record_id: Uuid,
        inputs: &RecordInputs,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .map(|record| {
                record.inputs = inputs.clone();
                record.updated_utc = Utc::now();
                record.clone()
            }))
    }

    async fn delete_record(&self, record_id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.records.len();
        tables.records.retain(|r| r.id != record_id);
        Ok(tables.records.len() < before)
    }

    async fn select_sale_events(&self, record_ids: &[Uuid]) -> Result<Vec<SaleEvent>, StoreError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .await
            .sales
            .iter()
            .filter(|s| record_ids.contains(&s.record_id))
            .cloned()
            .collect())
    }

    async fn select_sales(
        &self,
        module: ModuleKind,
        sold_on: Option<NaiveDate>,
    ) -> Result<Vec<SaleEvent>, StoreError> {
        self.check()?;
        let mut sales: Vec<SaleEvent> = self
            .tables
            .read()
            .await
            .sales
            .iter()
            .filter(|s| s.module == module.as_str())
            .filter(|s| sold_on.map_or(true, |day| s.sold_on == day))
            .cloned()
            .collect();
        sales.sort_by_key(|s| s.sold_on);
        Ok(sales)
    }

    async fn insert_sale_event(&self, sale: &NewSaleEvent) -> Result<SaleEvent, StoreError> {
        self.check()?;
        let event = SaleEvent {
            sale_id: Uuid::new_v4(),
            record_id: sale.record_id,
            module: sale.module.as_str().to_string(),
            item_name: sale.item_name.clone(),
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            unit_cost: sale.unit_cost,
            sold_on: sale.sold_on,
            sold_by: sale.sold_by.clone(),
            created_utc: Utc::now(),
        };
        self.tables.write().await.sales.push(event.clone());
        Ok(event)
    }

    async fn delete_sale_event(&self, sale_id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.sales.len();
        tables.sales.retain(|s| s.sale_id != sale_id);
        Ok(tables.sales.len() < before)
    }

    async fn select_daily_sales(
        &self,
        ledger: SalesLedger,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySaleEntry>, StoreError> {
        self.check()?;
        let mut entries: Vec<DailySaleEntry> = self
            .tables
            .read()
            .await
            .daily_sales
            .iter()
            .filter(|e| e.ledger == ledger.as_str() && e.date >= start && e.date < end)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    async fn insert_daily_sale(&self, entry: &NewDailySale) -> Result<DailySaleEntry, StoreError> {
        self.check()?;
        let saved = DailySaleEntry {
            entry_id: Uuid::new_v4(),
            ledger: entry.ledger.as_str().to_string(),
            date: entry.date,
            item: entry.item.clone(),
            code: entry.code.clone(),
            quantity: entry.quantity,
            unit: entry.unit.clone(),
            bpx: entry.bpx,
            spx: entry.spx,
            created_utc: Utc::now(),
        };
        self.tables.write().await.daily_sales.push(saved.clone());
        Ok(saved)
    }

    async fn delete_daily_sale(&self, entry_id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.daily_sales.len();
        tables.daily_sales.retain(|e| e.entry_id != entry_id);
        Ok(tables.daily_sales.len() < before)
    }
}

// ============================================================================
// Application harness
// ============================================================================

/// Test application wrapper.
pub struct TestApp {
    pub grpc_client: InventoryServiceClient<Channel>,
    pub store: Arc<MemoryStore>,
    pub http_port: u16,
    pub grpc_port: u16,
}

/// Spawn the service over a fresh in-memory store and connect a gRPC client.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(Arc::new(MemoryStore::new())).await
}

pub async fn spawn_app_with_store(store: Arc<MemoryStore>) -> TestApp {
    init_tracing();

    let app = Application::build_with_store(test_config(), store.clone())
        .await
        .expect("Failed to build application");

    let http_port = app.http_port();
    let grpc_port = app.grpc_port();
    let grpc_addr = format!("http://127.0.0.1:{}", grpc_port);

    // Start the application in the background
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    // Wait for server to be ready with retry
    let grpc_client = {
        let mut attempts = 0;
        loop {
            match InventoryServiceClient::connect(grpc_addr.clone()).await {
                Ok(client) => break client,
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                }
                Err(e) => panic!("Failed to connect gRPC client after 20 attempts: {}", e),
            }
        }
    };

    TestApp {
        grpc_client,
        store,
        http_port,
        grpc_port,
    }
}

// ============================================================================
// Request builders
// ============================================================================

pub fn stationery_request(name: &str, quantity: i64, rate: &str, price: &str) -> proto::CreateRecordRequest {
    proto::CreateRecordRequest {
        module: Module::Stationery.into(),
        name: name.to_string(),
        quantity,
        rate: rate.to_string(),
        selling_price: Some(price.to_string()),
        ..Default::default()
    }
}

pub fn embroidery_request(name: &str, quotation: &str, deposit: &str) -> proto::CreateRecordRequest {
    proto::CreateRecordRequest {
        module: Module::Embroidery.into(),
        name: name.to_string(),
        quantity: 1,
        rate: "0".to_string(),
        quotation: Some(quotation.to_string()),
        deposit: Some(deposit.to_string()),
        ..Default::default()
    }
}

pub fn daily_sale_request(
    ledger: proto::SalesLedger,
    date: &str,
    item: &str,
    bpx: &str,
    spx: &str,
) -> proto::AddDailySaleRequest {
    proto::AddDailySaleRequest {
        ledger: ledger.into(),
        date: date.to_string(),
        item: item.to_string(),
        code: None,
        quantity: 1,
        unit: None,
        bpx: bpx.to_string(),
        spx: spx.to_string(),
    }
}

/// Create a record and return it as the service annotated it.
pub async fn create_record(
    app: &mut TestApp,
    request: proto::CreateRecordRequest,
) -> proto::InventoryRecord {
    app.grpc_client
        .create_record(request)
        .await
        .expect("Failed to create record")
        .into_inner()
        .record
        .expect("Response carries the record")
}

/// Field named in the `x-invalid-field` metadata of a rejected request.
pub fn invalid_field(status: &tonic::Status) -> Option<String> {
    status
        .metadata()
        .get(inventory_service::error::INVALID_FIELD_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}
