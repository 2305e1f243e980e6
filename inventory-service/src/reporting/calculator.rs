//! Derived financial fields.
//!
//! Every function here is pure: same inputs, same output, no store access.
//! Stored aggregates are never trusted; `derive_metrics` recomputes stock,
//! sales and profit from the raw sale events each time a record is read.

use super::error::{Field, ValidationError};
use crate::models::{GiftCategory, NewDailySale, RecordDetails, RecordInputs, SaleEvent};
use rust_decimal::Decimal;

/// Largest money amount a single field may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Largest quantity, stock threshold or sale size.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Values computed from a record's inputs and its sale events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMetrics {
    pub units_sold: i64,
    /// Product modules only.
    pub stock: Option<i64>,
    /// Product modules with a selling price only. May be negative.
    pub profit_per_unit: Option<Decimal>,
    pub sales: Decimal,
    pub cost_basis: Decimal,
    pub profit: Decimal,
    /// Quotation-based services only. Negative means overpaid.
    pub balance: Option<Decimal>,
    pub is_low_stock: bool,
}

// Reads never fail: bounded inputs cannot overflow, and rows that predate
// the bounds saturate instead of panicking.

pub fn profit_per_unit(rate: Decimal, selling_price: Decimal) -> Decimal {
    selling_price.saturating_sub(rate)
}

pub fn stock(initial_quantity: i64, units_sold: i64) -> i64 {
    initial_quantity.saturating_sub(units_sold)
}

pub fn is_low_stock(stock: i64, threshold: i64) -> bool {
    stock <= threshold
}

pub fn line_profit(sales: Decimal, cost_basis: Decimal, expenditure: Decimal) -> Decimal {
    sales.saturating_sub(cost_basis).saturating_sub(expenditure)
}

pub fn balance(quotation: Decimal, deposit: Decimal) -> Decimal {
    quotation.saturating_sub(deposit)
}

/// `quantity × amount`, saturating at the decimal range.
pub fn extend(amount: Decimal, quantity: i64) -> Decimal {
    amount.saturating_mul(Decimal::from(quantity))
}

/// Reject inputs a user could not have meant. Fields are checked in form
/// order and the first violation is returned.
pub fn validate_inputs(inputs: &RecordInputs) -> Result<(), ValidationError> {
    if inputs.name.trim().is_empty() {
        return Err(ValidationError::Empty(Field::Name));
    }
    quantity_in_range(Field::Quantity, inputs.quantity)?;
    non_negative(Field::Rate, inputs.rate)?;

    match &inputs.details {
        RecordDetails::Stationery { selling_price } => {
            required_non_negative(Field::SellingPrice, *selling_price)?;
        }
        RecordDetails::GiftStore {
            category,
            selling_price,
        } => {
            if let GiftCategory::Custom(label) = category {
                if label.trim().is_empty() {
                    return Err(ValidationError::Empty(Field::CustomCategory));
                }
            }
            required_non_negative(Field::SellingPrice, *selling_price)?;
        }
        RecordDetails::Machines { .. } => {}
        RecordDetails::Embroidery { quotation, deposit }
        | RecordDetails::ArtServices { quotation, deposit } => {
            required_non_negative(Field::Quotation, *quotation)?;
            non_negative(Field::Deposit, *deposit)?;
        }
    }

    non_negative(Field::Expenditure, inputs.expenditure)?;
    quantity_in_range(Field::LowStockThreshold, inputs.low_stock_threshold)
}

/// A quantity update may not drop below what has already been sold.
pub fn check_quantity_covers_sales(quantity: i64, units_sold: i64) -> Result<(), ValidationError> {
    if quantity < units_sold {
        return Err(ValidationError::BelowUnitsSold {
            quantity,
            sold: units_sold,
        });
    }
    Ok(())
}

/// Check a daily sales book line in column order.
pub fn validate_daily_sale(entry: &NewDailySale) -> Result<(), ValidationError> {
    if entry.item.trim().is_empty() {
        return Err(ValidationError::Empty(Field::Item));
    }
    if entry.quantity <= 0 {
        return Err(ValidationError::NotPositive(Field::Quantity));
    }
    if entry.quantity > MAX_QUANTITY {
        return Err(ValidationError::too_large(Field::Quantity, MAX_QUANTITY));
    }
    if entry.unit.trim().is_empty() {
        return Err(ValidationError::Empty(Field::Unit));
    }
    non_negative(Field::Bpx, entry.bpx)?;
    non_negative(Field::Spx, entry.spx)
}

/// Decide whether a sale of `quantity` units may be recorded.
///
/// Overselling is refused: a sale that would take stock below zero fails with
/// `InsufficientStock` rather than being recorded.
pub fn check_sale(
    inputs: &RecordInputs,
    current_stock: i64,
    quantity: i64,
) -> Result<(), ValidationError> {
    let module = inputs.module();
    if !module.is_product() {
        return Err(ValidationError::SalesNotTracked(module));
    }
    if quantity <= 0 {
        return Err(ValidationError::NotPositive(Field::SaleQuantity));
    }
    if inputs.details.selling_price().is_none() {
        return Err(ValidationError::Missing(Field::SellingPrice));
    }
    if quantity > current_stock {
        return Err(ValidationError::InsufficientStock {
            requested: quantity,
            available: current_stock.max(0),
        });
    }
    Ok(())
}

/// Compute derived fields for one record from the sale events that reference it.
///
/// - Stationery, gift store: sales are the sum of sale lines, cost basis sums
///   each line at the rate in force when it was sold.
/// - Machines: billed per unit of service, `sales = quantity * rate`, no cost basis.
/// - Embroidery, art services: `sales = quotation`, no cost basis.
pub fn derive_metrics<'a, I>(inputs: &RecordInputs, sales: I) -> DerivedMetrics
where
    I: IntoIterator<Item = &'a SaleEvent>,
{
    let module = inputs.module();

    if module.is_product() {
        let (units_sold, revenue, cost_basis) = sales.into_iter().fold(
            (0i64, Decimal::ZERO, Decimal::ZERO),
            |(units, revenue, cost), sale| {
                (
                    units.saturating_add(sale.quantity),
                    revenue.saturating_add(sale.total_amount()),
                    cost.saturating_add(extend(sale.unit_cost, sale.quantity)),
                )
            },
        );
        let stock_left = stock(inputs.quantity, units_sold);

        return DerivedMetrics {
            units_sold,
            stock: Some(stock_left),
            profit_per_unit: inputs
                .details
                .selling_price()
                .map(|price| profit_per_unit(inputs.rate, price)),
            sales: revenue,
            cost_basis,
            profit: line_profit(revenue, cost_basis, inputs.expenditure),
            balance: None,
            is_low_stock: is_low_stock(stock_left, inputs.low_stock_threshold),
        };
    }

    let (revenue, owed) = match &inputs.details {
        RecordDetails::Embroidery { quotation, deposit }
        | RecordDetails::ArtServices { quotation, deposit } => {
            let quotation = quotation.unwrap_or(Decimal::ZERO);
            (quotation, Some(balance(quotation, *deposit)))
        }
        _ => (extend(inputs.rate, inputs.quantity), None),
    };

    DerivedMetrics {
        units_sold: 0,
        stock: None,
        profit_per_unit: None,
        sales: revenue,
        cost_basis: Decimal::ZERO,
        profit: line_profit(revenue, Decimal::ZERO, inputs.expenditure),
        balance: owed,
        is_low_stock: false,
    }
}

fn non_negative(field: Field, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::negative(field, value));
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::too_large(field, MAX_AMOUNT));
    }
    Ok(())
}

fn quantity_in_range(field: Field, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::negative(field, value));
    }
    if value > MAX_QUANTITY {
        return Err(ValidationError::too_large(field, MAX_QUANTITY));
    }
    Ok(())
}

fn required_non_negative(field: Field, value: Option<Decimal>) -> Result<(), ValidationError> {
    match value {
        Some(v) => non_negative(field, v),
        None => Err(ValidationError::Missing(field)),
    }
}
