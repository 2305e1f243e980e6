//! PostgreSQL record store tests.
//!
//! Run with a database: `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

mod common;

use chrono::NaiveDate;
use inventory_service::models::{
    GiftCategory, ModuleKind, NewDailySale, NewSaleEvent, RecordDetails, RecordInputs, SalesLedger,
};
use inventory_service::services::{Database, RecordStore, SortOrder};
use rust_decimal::Decimal;
use serial_test::serial;
use std::str::FromStr;
use uuid::Uuid;

async fn connect() -> Database {
    common::init_tracing();
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let db = Database::new(&url, 2, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

fn day(s: &str) -> NaiveDate {
    common::date(s)
}

fn gift(name: &str) -> RecordInputs {
    let mut inputs = RecordInputs::new(
        name,
        6,
        Decimal::from_str("12.50").unwrap(),
        RecordDetails::GiftStore {
            category: GiftCategory::Custom("Weddings".to_string()),
            selling_price: Some(Decimal::from_str("19.99").unwrap()),
        },
    );
    inputs.description = Some("Boxed".to_string());
    inputs.low_stock_threshold = 2;
    inputs
}

#[tokio::test]
#[ignore]
#[serial]
async fn record_round_trips_with_module_columns() {
    let db = connect().await;

    let saved = db.insert_record(&gift(&format!("Hamper {}", Uuid::new_v4()))).await.unwrap();
    let loaded = db.get_record(saved.id).await.unwrap().expect("record exists");

    assert_eq!(loaded.inputs, saved.inputs);
    assert_eq!(
        loaded.inputs.details.category(),
        Some(&GiftCategory::Custom("Weddings".to_string()))
    );
    assert_eq!(
        loaded.inputs.details.selling_price(),
        Some(Decimal::from_str("19.99").unwrap())
    );
}

#[tokio::test]
#[ignore]
#[serial]
async fn update_replaces_inputs_and_delete_reports_presence() {
    let db = connect().await;

    let saved = db.insert_record(&gift("Frame")).await.unwrap();
    let mut changed = saved.inputs.clone();
    changed.quantity = 9;
    changed.expenditure = Decimal::from(300);

    let updated = db.update_record(saved.id, &changed).await.unwrap().expect("updated");
    assert_eq!(updated.inputs.quantity, 9);
    assert_eq!(updated.inputs.expenditure, Decimal::from(300));
    assert!(updated.updated_utc >= saved.updated_utc);

    assert!(db.update_record(Uuid::new_v4(), &changed).await.unwrap().is_none());
    assert!(db.delete_record(saved.id).await.unwrap());
    assert!(!db.delete_record(saved.id).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn records_list_in_requested_order() {
    let db = connect().await;

    let first = db.insert_record(&gift("Older")).await.unwrap();
    let second = db.insert_record(&gift("Newer")).await.unwrap();
    let ours = |records: Vec<inventory_service::models::InventoryRecord>| -> Vec<Uuid> {
        records
            .into_iter()
            .map(|r| r.id)
            .filter(|id| *id == first.id || *id == second.id)
            .collect()
    };

    let newest = db.select_records(ModuleKind::GiftStore, SortOrder::NewestFirst).await.unwrap();
    assert_eq!(ours(newest), vec![second.id, first.id]);

    let oldest = db.select_records(ModuleKind::GiftStore, SortOrder::OldestFirst).await.unwrap();
    assert_eq!(ours(oldest), vec![first.id, second.id]);
}

#[tokio::test]
#[ignore]
#[serial]
async fn older_rows_read_back_with_defaults() {
    let db = connect().await;
    let record_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO inventory_records (record_id, module, name, quantity, rate, quotation) \
         VALUES ($1, 'art_services', 'Mural', 1, 0, 80000)",
    )
    .bind(record_id)
    .execute(db.pool())
    .await
    .unwrap();

    let record = db.get_record(record_id).await.unwrap().expect("record exists");
    assert_eq!(record.inputs.expenditure, Decimal::ZERO);
    assert_eq!(record.inputs.low_stock_threshold, 0);
    assert_eq!(record.inputs.details.deposit(), Some(Decimal::ZERO));
    assert_eq!(record.inputs.details.quotation(), Some(Decimal::from(80000)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn sale_events_survive_record_deletion() {
    let db = connect().await;

    let record = db.insert_record(&gift("Candle")).await.unwrap();
    let sale = db
        .insert_sale_event(&NewSaleEvent {
            record_id: record.id,
            module: ModuleKind::GiftStore,
            item_name: "Candle".to_string(),
            quantity: 2,
            unit_price: Decimal::from_str("19.99").unwrap(),
            unit_cost: Decimal::from_str("12.50").unwrap(),
            sold_on: day("2024-03-05"),
            sold_by: None,
        })
        .await
        .unwrap();

    assert!(db.delete_record(record.id).await.unwrap());

    let remaining = db.select_sale_events(&[record.id]).await.unwrap();
    assert_eq!(remaining, vec![sale.clone()]);

    let that_day = db
        .select_sales(ModuleKind::GiftStore, Some(day("2024-03-05")))
        .await
        .unwrap();
    assert!(that_day.iter().any(|s| s.sale_id == sale.sale_id));

    assert!(db.delete_sale_event(sale.sale_id).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn daily_sales_are_selected_by_half_open_range() {
    let db = connect().await;
    let marker = Uuid::new_v4().to_string();

    let mut ids = Vec::new();
    for date in ["2031-02-28", "2031-03-01", "2031-03-31", "2031-04-01"] {
        let saved = db
            .insert_daily_sale(&NewDailySale {
                ledger: SalesLedger::Stationery,
                date: day(date),
                item: format!("Pens {}", marker),
                code: None,
                quantity: 1,
                unit: "Pc".to_string(),
                bpx: Decimal::from(10),
                spx: Decimal::from(15),
            })
            .await
            .unwrap();
        ids.push(saved.entry_id);
    }

    let march: Vec<NaiveDate> = db
        .select_daily_sales(SalesLedger::Stationery, day("2031-03-01"), day("2031-04-01"))
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.item.ends_with(&marker))
        .map(|e| e.date)
        .collect();
    assert_eq!(march, vec![day("2031-03-01"), day("2031-03-31")]);

    for id in ids {
        assert!(db.delete_daily_sale(id).await.unwrap());
    }
}
