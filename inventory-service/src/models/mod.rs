//! Domain models for inventory-service.

#![allow(clippy::should_implement_trait)]

mod record;
mod sale;

pub use record::{
    AnnotatedRecord, GiftCategory, InventoryRecord, MachineType, RecordDetails, RecordInputs,
    RecordPatch, RecordRow,
};
pub use sale::{DailySaleEntry, NewDailySale, NewSaleEvent, SaleEvent, SalesLedger};

use crate::grpc::proto;
use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use std::fmt;

// ============================================================================
// Module
// ============================================================================

/// One of the five shop departments. Each keeps its own list of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Stationery,
    GiftStore,
    Embroidery,
    Machines,
    ArtServices,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 5] = [
        Self::Stationery,
        Self::GiftStore,
        Self::Embroidery,
        Self::Machines,
        Self::ArtServices,
    ];

    /// Collection name used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stationery => "stationery",
            Self::GiftStore => "gift_store",
            Self::Embroidery => "embroidery",
            Self::Machines => "machines",
            Self::ArtServices => "art_services",
        }
    }

    /// Dashboard identifier, used in export filenames.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Stationery => "stationery",
            Self::GiftStore => "gift-store",
            Self::Embroidery => "embroidery",
            Self::Machines => "machines",
            Self::ArtServices => "art-services",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "stationery" => Some(Self::Stationery),
            "gift_store" => Some(Self::GiftStore),
            "embroidery" => Some(Self::Embroidery),
            "machines" => Some(Self::Machines),
            "art_services" => Some(Self::ArtServices),
            _ => None,
        }
    }

    /// Product modules hold stock and take sale events.
    pub fn is_product(&self) -> bool {
        matches!(self, Self::Stationery | Self::GiftStore)
    }

    /// Services billed by an agreed quotation and a partial deposit.
    pub fn is_quotation_based(&self) -> bool {
        matches!(self, Self::Embroidery | Self::ArtServices)
    }

    pub fn from_proto(value: i32) -> Option<Self> {
        match proto::Module::try_from(value).ok()? {
            proto::Module::Stationery => Some(Self::Stationery),
            proto::Module::GiftStore => Some(Self::GiftStore),
            proto::Module::Embroidery => Some(Self::Embroidery),
            proto::Module::Machines => Some(Self::Machines),
            proto::Module::ArtServices => Some(Self::ArtServices),
            proto::Module::Unspecified => None,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ModuleKind> for proto::Module {
    fn from(m: ModuleKind) -> Self {
        match m {
            ModuleKind::Stationery => Self::Stationery,
            ModuleKind::GiftStore => Self::GiftStore,
            ModuleKind::Embroidery => Self::Embroidery,
            ModuleKind::Machines => Self::Machines,
            ModuleKind::ArtServices => Self::ArtServices,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}
