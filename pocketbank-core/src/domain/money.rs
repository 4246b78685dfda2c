//! Money helpers - fixed-point currency arithmetic
//!
//! All balances and amounts are `rust_decimal::Decimal` at two decimal
//! places. Floats never touch money.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::result::{Error, Result};

/// Currency scale: two decimal places
pub const SCALE: u32 = 2;

/// Quantize a value to currency scale, rounding half away from zero
pub fn to_money(value: Decimal) -> Decimal {
    let mut quantized = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    quantized.rescale(SCALE);
    quantized
}

/// Validate a transaction amount: strictly positive and representable
/// at currency scale. Returns the amount rescaled to two places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_amount(format!(
            "amount must be greater than 0, got {amount}"
        )));
    }
    if amount.normalize().scale() > SCALE {
        return Err(Error::invalid_amount(format!(
            "amount {amount} has more than {SCALE} decimal places"
        )));
    }
    let mut rescaled = amount;
    rescaled.rescale(SCALE);
    Ok(rescaled)
}

/// Format a value at fixed two-decimal precision for storage and display
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}
