//! Module view lifecycle: fetches, the entry-form trigger and teardown.

mod common;

use common::MemoryStore;
use inventory_service::models::{ModuleKind, RecordDetails, RecordInputs};
use inventory_service::services::{InventoryService, ModuleCommand, ModuleView, SortOrder};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

fn pens(name: &str) -> RecordInputs {
    RecordInputs::new(
        name,
        10,
        Decimal::from(50),
        RecordDetails::Stationery {
            selling_price: Some(Decimal::from(80)),
        },
    )
}

async fn service_with(store: Arc<MemoryStore>, names: &[&str]) -> InventoryService {
    common::init_tracing();
    let service = InventoryService::new(store);
    for name in names {
        service
            .create_record(pens(name))
            .await
            .expect("Failed to create record");
    }
    service
}

#[tokio::test]
async fn refresh_loads_module_records() {
    let service = service_with(Arc::new(MemoryStore::new()), &["Blue pens", "Red pens"]).await;
    let mut view = ModuleView::new(service, ModuleKind::Stationery);

    view.dispatch(ModuleCommand::Refresh)
        .await
        .expect("refresh spawns a fetch")
        .await
        .expect("fetch task panicked");

    let snapshot = view.snapshot().await;
    assert!(snapshot.loaded);
    assert_eq!(snapshot.last_error, None);
    let names: Vec<&str> = snapshot
        .records
        .iter()
        .map(|r| r.record.inputs.name.as_str())
        .collect();
    assert_eq!(names, vec!["Red pens", "Blue pens"]);
    assert_eq!(snapshot.records[0].derived.stock, Some(10));
}

#[tokio::test]
async fn sort_order_change_refetches() {
    let service = service_with(Arc::new(MemoryStore::new()), &["Blue pens", "Red pens"]).await;
    let mut view = ModuleView::new(service, ModuleKind::Stationery);

    view.dispatch(ModuleCommand::SetSortOrder(SortOrder::OldestFirst))
        .await
        .expect("sort change spawns a fetch")
        .await
        .expect("fetch task panicked");

    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.records[0].record.inputs.name, "Blue pens");
}

#[tokio::test]
async fn closed_view_ignores_a_late_fetch() {
    let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
    let service = service_with(store, &["Blue pens"]).await;
    let mut view = ModuleView::new(service, ModuleKind::Stationery);

    let fetch = view
        .dispatch(ModuleCommand::Refresh)
        .await
        .expect("refresh spawns a fetch");
    view.close().await;
    fetch.await.expect("fetch task panicked");

    let snapshot = view.snapshot().await;
    assert!(!snapshot.loaded);
    assert!(snapshot.records.is_empty());
    assert!(view.is_closed());
}

#[tokio::test]
async fn closed_view_ignores_commands() {
    let service = service_with(Arc::new(MemoryStore::new()), &[]).await;
    let mut view = ModuleView::new(service, ModuleKind::Machines);

    view.close().await;

    assert!(view.dispatch(ModuleCommand::Refresh).await.is_none());
    assert!(view.dispatch(ModuleCommand::OpenEntryForm).await.is_none());
    assert!(!view.take_open_intent().await);
}

#[tokio::test]
async fn open_entry_form_is_consumed_once() {
    let service = service_with(Arc::new(MemoryStore::new()), &[]).await;
    let mut view = ModuleView::new(service, ModuleKind::GiftStore);

    assert!(view.dispatch(ModuleCommand::OpenEntryForm).await.is_none());
    assert!(view.snapshot().await.entry_form_open);

    assert!(view.take_open_intent().await);
    assert!(!view.take_open_intent().await);
    assert!(!view.snapshot().await.entry_form_open);
}

#[tokio::test]
async fn close_entry_form_clears_a_pending_open() {
    let service = service_with(Arc::new(MemoryStore::new()), &[]).await;
    let mut view = ModuleView::new(service, ModuleKind::Embroidery);

    view.dispatch(ModuleCommand::OpenEntryForm).await;
    view.dispatch(ModuleCommand::CloseEntryForm).await;

    assert!(!view.take_open_intent().await);
}

#[tokio::test]
async fn failed_fetch_keeps_the_error() {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(store.clone(), &["Blue pens"]).await;
    let mut view = ModuleView::new(service, ModuleKind::Stationery);

    store.set_unavailable(true);
    view.dispatch(ModuleCommand::Refresh)
        .await
        .expect("refresh spawns a fetch")
        .await
        .expect("fetch task panicked");

    let snapshot = view.snapshot().await;
    assert!(!snapshot.loaded);
    assert!(snapshot
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("connection refused")));
}
