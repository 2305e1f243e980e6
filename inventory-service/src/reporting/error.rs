use crate::models::ModuleKind;
use std::fmt;
use thiserror::Error;

/// Input field named by a validation failure, so the caller can point at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Module,
    Ledger,
    Date,
    Name,
    Quantity,
    Rate,
    SellingPrice,
    Quotation,
    Deposit,
    Expenditure,
    LowStockThreshold,
    CustomCategory,
    SaleQuantity,
    Item,
    Unit,
    Bpx,
    Spx,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Module => "module",
            Self::Ledger => "ledger",
            Self::Date => "date",
            Self::Name => "name",
            Self::Quantity => "quantity",
            Self::Rate => "rate",
            Self::SellingPrice => "selling_price",
            Self::Quotation => "quotation",
            Self::Deposit => "deposit",
            Self::Expenditure => "expenditure",
            Self::LowStockThreshold => "low_stock_threshold",
            Self::CustomCategory => "custom_category",
            Self::SaleQuantity => "sale_quantity",
            Self::Item => "item",
            Self::Unit => "unit",
            Self::Bpx => "bpx",
            Self::Spx => "spx",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected input. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: Field, value: String },

    #[error("{0} must be greater than zero")]
    NotPositive(Field),

    #[error("{0} is required")]
    Missing(Field),

    #[error("{0} must not be empty")]
    Empty(Field),

    #[error("{field} must not exceed {limit}")]
    TooLarge { field: Field, limit: String },

    #[error("{0} is malformed")]
    Malformed(Field),

    #[error("{0} does not apply to this module")]
    NotApplicable(Field),

    #[error("cannot sell {requested} units, only {available} in stock")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("quantity {quantity} is below the {sold} units already sold")]
    BelowUnitsSold { quantity: i64, sold: i64 },

    #[error("{0} records do not take sales")]
    SalesNotTracked(ModuleKind),
}

impl ValidationError {
    pub(crate) fn negative(field: Field, value: impl fmt::Display) -> Self {
        Self::Negative {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn too_large(field: Field, limit: impl fmt::Display) -> Self {
        Self::TooLarge {
            field,
            limit: limit.to_string(),
        }
    }

    /// The offending input, when the error is tied to a single field.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Negative { field, .. } | Self::TooLarge { field, .. } => Some(*field),
            Self::NotPositive(field)
            | Self::Missing(field)
            | Self::Empty(field)
            | Self::Malformed(field)
            | Self::NotApplicable(field) => Some(*field),
            Self::InsufficientStock { .. } => Some(Field::SaleQuantity),
            Self::BelowUnitsSold { .. } => Some(Field::Quantity),
            Self::SalesNotTracked(_) => None,
        }
    }
}

/// A month or date argument outside the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period: {0}")]
pub struct InvalidPeriod(pub String);

/// CSV rendering failed. Writing into memory only fails on encoder errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv output is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
