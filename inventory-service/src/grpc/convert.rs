//! Parsing of request fields and conversion of results into proto messages.

use crate::error::InventoryError;
use crate::grpc::proto;
use crate::models::{
    GiftCategory, MachineType, ModuleKind, NewDailySale, RecordDetails, RecordInputs, RecordPatch,
    SalesLedger,
};
use crate::reporting::{DayGroup, Field, MonthlyReport, Subtotal, ValidationError, YearMonth};
use crate::services::{DashboardSummary, ExportedReport, ModuleSummary};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Field parsing
// ============================================================================

pub(crate) fn parse_id(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::from_str(value.trim()).map_err(|_| ValidationError::Malformed(Field::Id))
}

pub(crate) fn parse_module(value: i32) -> Result<ModuleKind, ValidationError> {
    ModuleKind::from_proto(value).ok_or(ValidationError::Missing(Field::Module))
}

pub(crate) fn parse_ledger(value: i32) -> Result<SalesLedger, ValidationError> {
    SalesLedger::from_proto(value).ok_or(ValidationError::Missing(Field::Ledger))
}

pub(crate) fn parse_decimal(value: &str, field: Field) -> Result<Decimal, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Decimal::from_str(value).map_err(|_| ValidationError::Malformed(field))
}

/// Blank form fields count as absent.
pub(crate) fn parse_optional_decimal(
    value: Option<&str>,
    field: Field,
) -> Result<Option<Decimal>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_decimal(v, field).map(Some),
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::Malformed(Field::Date))
}

/// Absent or blank means today.
pub(crate) fn parse_date_or_today(value: Option<&str>) -> Result<NaiveDate, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(Utc::now().date_naive()),
        Some(v) => parse_date(v),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn reject_if_present(value: &Option<String>, field: Field) -> Result<(), ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Err(ValidationError::NotApplicable(field)),
        _ => Ok(()),
    }
}

// ============================================================================
// Requests
// ============================================================================

impl TryFrom<proto::CreateRecordRequest> for RecordInputs {
    type Error = InventoryError;

    fn try_from(req: proto::CreateRecordRequest) -> Result<Self, Self::Error> {
        let module = parse_module(req.module)?;
        let rate = parse_decimal(&req.rate, Field::Rate)?;
        let selling_price = parse_optional_decimal(req.selling_price.as_deref(), Field::SellingPrice)?;
        let quotation = parse_optional_decimal(req.quotation.as_deref(), Field::Quotation)?;
        let deposit = parse_optional_decimal(req.deposit.as_deref(), Field::Deposit)?;

        if module.is_product() {
            reject_if_present(&req.quotation, Field::Quotation)?;
            reject_if_present(&req.deposit, Field::Deposit)?;
        } else {
            reject_if_present(&req.selling_price, Field::SellingPrice)?;
        }
        if module == ModuleKind::Machines {
            reject_if_present(&req.quotation, Field::Quotation)?;
            reject_if_present(&req.deposit, Field::Deposit)?;
        }

        let details = match module {
            ModuleKind::Stationery => RecordDetails::Stationery { selling_price },
            ModuleKind::GiftStore => RecordDetails::GiftStore {
                category: GiftCategory::from_proto(req.category, req.custom_category),
                selling_price,
            },
            ModuleKind::Machines => RecordDetails::Machines {
                machine_type: MachineType::from_proto(req.machine_type),
            },
            ModuleKind::Embroidery => RecordDetails::Embroidery {
                quotation,
                deposit: deposit.unwrap_or(Decimal::ZERO),
            },
            ModuleKind::ArtServices => RecordDetails::ArtServices {
                quotation,
                deposit: deposit.unwrap_or(Decimal::ZERO),
            },
        };

        let mut inputs = RecordInputs::new(req.name, req.quantity, rate, details);
        inputs.description = non_blank(req.description);
        inputs.expenditure = parse_optional_decimal(req.expenditure.as_deref(), Field::Expenditure)?
            .unwrap_or(Decimal::ZERO);
        inputs.low_stock_threshold = req.low_stock_threshold.unwrap_or(0);
        inputs.done_by = non_blank(req.done_by);
        inputs.record_date = parse_date_or_today(req.record_date.as_deref())?;
        Ok(inputs)
    }
}

impl TryFrom<&proto::UpdateRecordRequest> for RecordPatch {
    type Error = InventoryError;

    fn try_from(req: &proto::UpdateRecordRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name.clone(),
            description: req.description.clone(),
            quantity: req.quantity,
            rate: parse_optional_decimal(req.rate.as_deref(), Field::Rate)?,
            selling_price: parse_optional_decimal(req.selling_price.as_deref(), Field::SellingPrice)?,
            quotation: parse_optional_decimal(req.quotation.as_deref(), Field::Quotation)?,
            deposit: parse_optional_decimal(req.deposit.as_deref(), Field::Deposit)?,
            expenditure: parse_optional_decimal(req.expenditure.as_deref(), Field::Expenditure)?,
            low_stock_threshold: req.low_stock_threshold,
            done_by: req.done_by.clone(),
        })
    }
}

impl TryFrom<proto::AddDailySaleRequest> for NewDailySale {
    type Error = InventoryError;

    fn try_from(req: proto::AddDailySaleRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            ledger: parse_ledger(req.ledger)?,
            date: parse_date(&req.date)?,
            item: req.item.trim().to_string(),
            code: non_blank(req.code),
            quantity: req.quantity,
            unit: non_blank(req.unit).unwrap_or_else(|| "Pc".to_string()),
            bpx: parse_decimal(&req.bpx, Field::Bpx)?,
            spx: parse_decimal(&req.spx, Field::Spx)?,
        })
    }
}

pub(crate) fn parse_period(value: &str) -> Result<YearMonth, InventoryError> {
    Ok(YearMonth::parse(value)?)
}

// ============================================================================
// Responses
// ============================================================================

impl From<Subtotal> for proto::Subtotal {
    fn from(s: Subtotal) -> Self {
        Self {
            bpx: s.bpx.to_string(),
            spx: s.spx.to_string(),
            margin: s.margin().to_string(),
        }
    }
}

impl From<DayGroup> for proto::DayGroup {
    fn from(g: DayGroup) -> Self {
        Self {
            date: g.date.to_string(),
            entries: g.entries.into_iter().map(Into::into).collect(),
            subtotal: Some(g.subtotal.into()),
        }
    }
}

impl From<MonthlyReport> for proto::GetMonthlyReportResponse {
    fn from(r: MonthlyReport) -> Self {
        Self {
            period: r.period.to_string(),
            groups: r.groups.into_iter().map(Into::into).collect(),
            grand_total: Some(r.grand_total.into()),
        }
    }
}

impl From<ExportedReport> for proto::ExportResponse {
    fn from(r: ExportedReport) -> Self {
        Self {
            filename: r.filename,
            content_type: r.content_type.to_string(),
            content: r.content,
            row_count: i32::try_from(r.row_count).unwrap_or(i32::MAX),
        }
    }
}

impl From<ModuleSummary> for proto::ModuleSummary {
    fn from(m: ModuleSummary) -> Self {
        Self {
            module: proto::Module::from(m.module).into(),
            record_count: i32::try_from(m.record_count).unwrap_or(i32::MAX),
            total_sales: m.total_sales.to_string(),
            total_profit: m.total_profit.to_string(),
            low_stock_count: i32::try_from(m.low_stock_count).unwrap_or(i32::MAX),
            outstanding_balance: m.outstanding_balance.to_string(),
        }
    }
}

impl From<DashboardSummary> for proto::GetDashboardSummaryResponse {
    fn from(d: DashboardSummary) -> Self {
        Self {
            modules: d.modules.into_iter().map(Into::into).collect(),
            total_sales: d.total_sales.to_string(),
            total_profit: d.total_profit.to_string(),
        }
    }
}
