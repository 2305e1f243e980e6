use super::{datetime_to_timestamp, ModuleKind};
use crate::grpc::proto;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Sale events
// ============================================================================

/// One sale against a product record. The record link is a lookup, not
/// ownership: deleting the record leaves its sales in place.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SaleEvent {
    pub sale_id: Uuid,
    pub record_id: Uuid,
    pub module: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub sold_on: NaiveDate,
    pub sold_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl SaleEvent {
    pub fn total_amount(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Margin over the rate in force when the sale was made.
    pub fn profit(&self) -> Decimal {
        self.unit_price
            .saturating_sub(self.unit_cost)
            .saturating_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleEvent {
    pub record_id: Uuid,
    pub module: ModuleKind,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub sold_on: NaiveDate,
    pub sold_by: Option<String>,
}

impl From<SaleEvent> for proto::SaleEvent {
    fn from(s: SaleEvent) -> Self {
        let module = ModuleKind::from_str(&s.module)
            .map(proto::Module::from)
            .unwrap_or(proto::Module::Unspecified);
        Self {
            sale_id: s.sale_id.to_string(),
            record_id: s.record_id.to_string(),
            module: module.into(),
            total_amount: s.total_amount().to_string(),
            profit: s.profit().to_string(),
            item_name: s.item_name,
            quantity: s.quantity,
            unit_price: s.unit_price.to_string(),
            unit_cost: s.unit_cost.to_string(),
            sold_on: s.sold_on.to_string(),
            sold_by: s.sold_by,
            created_utc: Some(datetime_to_timestamp(s.created_utc)),
        }
    }
}

// ============================================================================
// Daily sales ledger
// ============================================================================

/// Which append-only daily sales book an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SalesLedger {
    Gifts,
    Stationery,
}

impl SalesLedger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gifts => "gifts",
            Self::Stationery => "stationery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gifts" => Some(Self::Gifts),
            "stationery" => Some(Self::Stationery),
            _ => None,
        }
    }

    pub fn from_proto(value: i32) -> Option<Self> {
        match proto::SalesLedger::try_from(value).ok()? {
            proto::SalesLedger::Gifts => Some(Self::Gifts),
            proto::SalesLedger::Stationery => Some(Self::Stationery),
            proto::SalesLedger::Unspecified => None,
        }
    }
}

impl From<SalesLedger> for proto::SalesLedger {
    fn from(l: SalesLedger) -> Self {
        match l {
            SalesLedger::Gifts => Self::Gifts,
            SalesLedger::Stationery => Self::Stationery,
        }
    }
}

/// A hand-entered line in a daily sales book. `bpx` and `spx` are the buying
/// and selling value of the whole line, not per unit.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DailySaleEntry {
    pub entry_id: Uuid,
    pub ledger: String,
    pub date: NaiveDate,
    pub item: String,
    pub code: Option<String>,
    pub quantity: i64,
    pub unit: String,
    pub bpx: Decimal,
    pub spx: Decimal,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDailySale {
    pub ledger: SalesLedger,
    pub date: NaiveDate,
    pub item: String,
    pub code: Option<String>,
    pub quantity: i64,
    pub unit: String,
    pub bpx: Decimal,
    pub spx: Decimal,
}

impl From<DailySaleEntry> for proto::DailySaleEntry {
    fn from(e: DailySaleEntry) -> Self {
        let ledger = SalesLedger::from_str(&e.ledger)
            .map(proto::SalesLedger::from)
            .unwrap_or(proto::SalesLedger::Unspecified);
        Self {
            entry_id: e.entry_id.to_string(),
            ledger: ledger.into(),
            date: e.date.to_string(),
            item: e.item,
            code: e.code,
            quantity: e.quantity,
            unit: e.unit,
            bpx: e.bpx.to_string(),
            spx: e.spx.to_string(),
            created_utc: Some(datetime_to_timestamp(e.created_utc)),
        }
    }
}
