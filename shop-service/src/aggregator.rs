//! 销售数据聚合
//!
//! Pure functions over sale records: no I/O, inputs are never modified.

use rust_decimal::{Decimal, RoundingStrategy};

use common::errors::{AppError, AppResult};
use common::models::{decimal_to_f64, FieldValue, Record, SALE_FIELDS};

/// Mean `product_cost` across `sales`, rounded to 2 decimal places.
///
/// The mean is computed in decimal arithmetic and rounded half away from
/// zero, so `NUMERIC` costs round on their exact value. An empty slice means
/// the user bought nothing and yields `None`.
///
/// # Errors
/// Returns `AppError::MalformedRecord` if a record has no numeric
/// `product_cost`.
pub fn average_spend(sales: &[Record]) -> AppResult<Option<f64>> {
    if sales.is_empty() {
        return Ok(None);
    }
    let total = sales.iter().map(product_cost).sum::<AppResult<Decimal>>()?;
    let mean = total
        .checked_div(Decimal::from(sales.len()))
        .ok_or_else(|| AppError::MalformedRecord("average spend overflows".into()))?;
    let rounded = mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    decimal_to_f64(&rounded)
        .map(Some)
        .ok_or_else(|| AppError::MalformedRecord("average spend is not representable".into()))
}

/// Re-projects a joined sale row into the response shape.
///
/// Values are copied untouched; only the key set and order change, so
/// shaping an already shaped record returns it unchanged.
pub fn shape_sale(sale: &Record) -> AppResult<Record> {
    sale.project(&SALE_FIELDS)
}

fn product_cost(sale: &Record) -> AppResult<Decimal> {
    sale.get("product_cost")
        .and_then(FieldValue::as_decimal)
        .ok_or_else(|| AppError::MalformedRecord("sale without a numeric `product_cost`".into()))
}
