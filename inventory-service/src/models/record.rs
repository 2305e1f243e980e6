use super::{datetime_to_timestamp, ModuleKind};
use crate::error::StoreError;
use crate::grpc::proto;
use crate::reporting::{DerivedMetrics, Field, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiftCategory {
    Cleaning,
    KidsToys,
    Birthday,
    Custom(String),
}

impl GiftCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cleaning => "cleaning",
            Self::KidsToys => "kids_toys",
            Self::Birthday => "birthday",
            Self::Custom(_) => "custom",
        }
    }

    /// Label shown in reports: the custom label, or the category name.
    pub fn label(&self) -> &str {
        match self {
            Self::Custom(label) => label,
            other => other.as_str(),
        }
    }

    /// Rebuild from the stored pair. Missing category defaults to cleaning.
    pub fn from_columns(category: Option<&str>, custom: Option<&str>) -> Self {
        match category {
            Some("kids_toys") => Self::KidsToys,
            Some("birthday") => Self::Birthday,
            Some("custom") => Self::Custom(custom.unwrap_or_default().to_string()),
            _ => Self::Cleaning,
        }
    }

    pub fn from_proto(value: i32, custom: Option<String>) -> Self {
        match proto::GiftCategory::try_from(value) {
            Ok(proto::GiftCategory::KidsToys) => Self::KidsToys,
            Ok(proto::GiftCategory::Birthday) => Self::Birthday,
            Ok(proto::GiftCategory::Custom) => Self::Custom(custom.unwrap_or_default()),
            _ => Self::Cleaning,
        }
    }

    pub fn to_proto(&self) -> proto::GiftCategory {
        match self {
            Self::Cleaning => proto::GiftCategory::Cleaning,
            Self::KidsToys => proto::GiftCategory::KidsToys,
            Self::Birthday => proto::GiftCategory::Birthday,
            Self::Custom(_) => proto::GiftCategory::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineType {
    Printer,
    Copier,
    Scanner,
    Binder,
    Laminator,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Printer => "printer",
            Self::Copier => "copier",
            Self::Scanner => "scanner",
            Self::Binder => "binder",
            Self::Laminator => "laminator",
        }
    }

    /// Missing or unknown machine types default to printer.
    pub fn from_str(s: &str) -> Self {
        match s {
            "copier" => Self::Copier,
            "scanner" => Self::Scanner,
            "binder" => Self::Binder,
            "laminator" => Self::Laminator,
            _ => Self::Printer,
        }
    }

    pub fn from_proto(value: i32) -> Self {
        match proto::MachineType::try_from(value) {
            Ok(proto::MachineType::Copier) => Self::Copier,
            Ok(proto::MachineType::Scanner) => Self::Scanner,
            Ok(proto::MachineType::Binder) => Self::Binder,
            Ok(proto::MachineType::Laminator) => Self::Laminator,
            _ => Self::Printer,
        }
    }

    pub fn to_proto(self) -> proto::MachineType {
        match self {
            Self::Printer => proto::MachineType::Printer,
            Self::Copier => proto::MachineType::Copier,
            Self::Scanner => proto::MachineType::Scanner,
            Self::Binder => proto::MachineType::Binder,
            Self::Laminator => proto::MachineType::Laminator,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Fields that only exist for some modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDetails {
    Stationery {
        selling_price: Option<Decimal>,
    },
    GiftStore {
        category: GiftCategory,
        selling_price: Option<Decimal>,
    },
    Machines {
        machine_type: MachineType,
    },
    Embroidery {
        quotation: Option<Decimal>,
        deposit: Decimal,
    },
    ArtServices {
        quotation: Option<Decimal>,
        deposit: Decimal,
    },
}

impl RecordDetails {
    pub fn module(&self) -> ModuleKind {
        match self {
            Self::Stationery { .. } => ModuleKind::Stationery,
            Self::GiftStore { .. } => ModuleKind::GiftStore,
            Self::Machines { .. } => ModuleKind::Machines,
            Self::Embroidery { .. } => ModuleKind::Embroidery,
            Self::ArtServices { .. } => ModuleKind::ArtServices,
        }
    }

    pub fn selling_price(&self) -> Option<Decimal> {
        match self {
            Self::Stationery { selling_price } | Self::GiftStore { selling_price, .. } => {
                *selling_price
            }
            _ => None,
        }
    }

    pub fn quotation(&self) -> Option<Decimal> {
        match self {
            Self::Embroidery { quotation, .. } | Self::ArtServices { quotation, .. } => *quotation,
            _ => None,
        }
    }

    pub fn deposit(&self) -> Option<Decimal> {
        match self {
            Self::Embroidery { deposit, .. } | Self::ArtServices { deposit, .. } => Some(*deposit),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<&GiftCategory> {
        match self {
            Self::GiftStore { category, .. } => Some(category),
            _ => None,
        }
    }

    pub fn machine_type(&self) -> Option<MachineType> {
        match self {
            Self::Machines { machine_type } => Some(*machine_type),
            _ => None,
        }
    }
}

/// User-entered fields of a record, for every module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInputs {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub rate: Decimal,
    pub details: RecordDetails,
    pub expenditure: Decimal,
    pub low_stock_threshold: i64,
    pub done_by: Option<String>,
    pub record_date: NaiveDate,
}

impl RecordInputs {
    /// Inputs with the default rules applied: no expenditure, threshold 0,
    /// dated today.
    pub fn new(name: impl Into<String>, quantity: i64, rate: Decimal, details: RecordDetails) -> Self {
        Self {
            name: name.into(),
            description: None,
            quantity,
            rate,
            details,
            expenditure: Decimal::ZERO,
            low_stock_threshold: 0,
            done_by: None,
            record_date: Utc::now().date_naive(),
        }
    }

    pub fn module(&self) -> ModuleKind {
        self.details.module()
    }
}

/// A stored record. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub inputs: RecordInputs,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn module(&self) -> ModuleKind {
        self.inputs.module()
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub rate: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub quotation: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub expenditure: Option<Decimal>,
    pub low_stock_threshold: Option<i64>,
    pub done_by: Option<String>,
}

/// A blank patch value clears the field, matching how creation treats blanks.
fn present(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge onto existing inputs. Setting a field the module does not carry
    /// is rejected.
    pub fn apply_to(&self, inputs: &RecordInputs) -> Result<RecordInputs, ValidationError> {
        let mut merged = inputs.clone();

        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = present(description);
        }
        if let Some(quantity) = self.quantity {
            merged.quantity = quantity;
        }
        if let Some(rate) = self.rate {
            merged.rate = rate;
        }
        if let Some(expenditure) = self.expenditure {
            merged.expenditure = expenditure;
        }
        if let Some(threshold) = self.low_stock_threshold {
            merged.low_stock_threshold = threshold;
        }
        if let Some(done_by) = &self.done_by {
            merged.done_by = present(done_by);
        }

        if let Some(price) = self.selling_price {
            match &mut merged.details {
                RecordDetails::Stationery { selling_price }
                | RecordDetails::GiftStore { selling_price, .. } => *selling_price = Some(price),
                _ => return Err(ValidationError::NotApplicable(Field::SellingPrice)),
            }
        }
        if let Some(value) = self.quotation {
            match &mut merged.details {
                RecordDetails::Embroidery { quotation, .. }
                | RecordDetails::ArtServices { quotation, .. } => *quotation = Some(value),
                _ => return Err(ValidationError::NotApplicable(Field::Quotation)),
            }
        }
        if let Some(value) = self.deposit {
            match &mut merged.details {
                RecordDetails::Embroidery { deposit, .. }
                | RecordDetails::ArtServices { deposit, .. } => *deposit = value,
                _ => return Err(ValidationError::NotApplicable(Field::Deposit)),
            }
        }

        Ok(merged)
    }
}

/// A record together with the values computed from its sale events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRecord {
    pub record: InventoryRecord,
    pub derived: DerivedMetrics,
}

// ============================================================================
// Storage row
// ============================================================================

/// Flat row of the `inventory_records` table. Columns a module does not use
/// are NULL.
#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub record_id: Uuid,
    pub module: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub rate: Decimal,
    pub selling_price: Option<Decimal>,
    pub category: Option<String>,
    pub custom_category: Option<String>,
    pub machine_type: Option<String>,
    pub quotation: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub expenditure: Option<Decimal>,
    pub low_stock_threshold: Option<i64>,
    pub done_by: Option<String>,
    pub record_date: NaiveDate,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl TryFrom<RecordRow> for InventoryRecord {
    type Error = StoreError;

    /// Rows written before a column existed come back with the default rules
    /// applied: zero expenditure, threshold and deposit.
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let module = ModuleKind::from_str(&row.module).ok_or_else(|| {
            StoreError::new(format!(
                "Record {} has unknown module '{}'",
                row.record_id, row.module
            ))
        })?;

        let deposit = row.deposit.unwrap_or(Decimal::ZERO);
        let details = match module {
            ModuleKind::Stationery => RecordDetails::Stationery {
                selling_price: row.selling_price,
            },
            ModuleKind::GiftStore => RecordDetails::GiftStore {
                category: GiftCategory::from_columns(
                    row.category.as_deref(),
                    row.custom_category.as_deref(),
                ),
                selling_price: row.selling_price,
            },
            ModuleKind::Machines => RecordDetails::Machines {
                machine_type: MachineType::from_str(row.machine_type.as_deref().unwrap_or_default()),
            },
            ModuleKind::Embroidery => RecordDetails::Embroidery {
                quotation: row.quotation,
                deposit,
            },
            ModuleKind::ArtServices => RecordDetails::ArtServices {
                quotation: row.quotation,
                deposit,
            },
        };

        Ok(Self {
            id: row.record_id,
            inputs: RecordInputs {
                name: row.name,
                description: row.description,
                quantity: row.quantity,
                rate: row.rate,
                details,
                expenditure: row.expenditure.unwrap_or(Decimal::ZERO),
                low_stock_threshold: row.low_stock_threshold.unwrap_or(0),
                done_by: row.done_by,
                record_date: row.record_date,
            },
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

// ============================================================================
// Proto conversion
// ============================================================================

impl From<DerivedMetrics> for proto::DerivedMetrics {
    fn from(d: DerivedMetrics) -> Self {
        Self {
            units_sold: d.units_sold,
            stock: d.stock,
            profit_per_unit: d.profit_per_unit.map(|p| p.to_string()),
            sales: d.sales.to_string(),
            cost_basis: d.cost_basis.to_string(),
            profit: d.profit.to_string(),
            balance: d.balance.map(|b| b.to_string()),
            is_low_stock: d.is_low_stock,
        }
    }
}

impl From<AnnotatedRecord> for proto::InventoryRecord {
    fn from(a: AnnotatedRecord) -> Self {
        let AnnotatedRecord { record, derived } = a;
        let module = record.module();
        let inputs = record.inputs;
        let details = &inputs.details;

        let (category, custom_category) = match details.category() {
            Some(c @ GiftCategory::Custom(label)) => (c.to_proto(), Some(label.clone())),
            Some(c) => (c.to_proto(), None),
            None => (proto::GiftCategory::Unspecified, None),
        };
        let machine_type = details
            .machine_type()
            .map(MachineType::to_proto)
            .unwrap_or(proto::MachineType::Unspecified);

        Self {
            record_id: record.id.to_string(),
            module: proto::Module::from(module).into(),
            name: inputs.name,
            description: inputs.description,
            quantity: inputs.quantity,
            rate: inputs.rate.to_string(),
            selling_price: details.selling_price().map(|p| p.to_string()),
            category: category.into(),
            custom_category,
            machine_type: machine_type.into(),
            quotation: details.quotation().map(|q| q.to_string()),
            deposit: details.deposit().map(|d| d.to_string()),
            expenditure: inputs.expenditure.to_string(),
            low_stock_threshold: inputs.low_stock_threshold,
            done_by: inputs.done_by,
            record_date: inputs.record_date.to_string(),
            derived: Some(derived.into()),
            created_utc: Some(datetime_to_timestamp(record.created_utc)),
            updated_utc: Some(datetime_to_timestamp(record.updated_utc)),
        }
    }
}
