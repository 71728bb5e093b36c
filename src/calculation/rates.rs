//! Rate model.
//!
//! This module turns a paper count into base, incentive and final amounts.
//! Every amount is rounded to cents, half away from zero:
//!
//! - `base = round(total_papers × per_paper_rate, 2)`
//! - `incentive = round(base × incentive_rate, 2)`
//! - `final = base + incentive`

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::RateConfig;
use crate::models::SalaryAmounts;

/// Number of decimal places money is kept to.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the amounts owed for `total_papers` evaluated papers.
///
/// # Example
///
/// ```
/// use examiner_payroll::calculation::calculate_amounts;
/// use examiner_payroll::config::RateConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rates = RateConfig::new(Decimal::from_str("20.00").unwrap());
/// let amounts = calculate_amounts(55, &rates);
///
/// assert_eq!(amounts.base_amount, Decimal::from_str("1100.00").unwrap());
/// assert_eq!(amounts.incentive_amount, Decimal::from_str("110.00").unwrap());
/// assert_eq!(amounts.final_amount, Decimal::from_str("1210.00").unwrap());
/// ```
pub fn calculate_amounts(total_papers: u32, rates: &RateConfig) -> SalaryAmounts {
    let base = Decimal::from(total_papers) * rates.per_paper_rate;
    amounts_from_base(base, rates.incentive_rate)
}

/// Derives incentive and final amounts from a base amount.
///
/// Used both by the local path and to normalise amounts returned by the
/// remote service, so that both paths honour the same invariants.
pub fn amounts_from_base(base_amount: Decimal, incentive_rate: Decimal) -> SalaryAmounts {
    let base_amount = round_money(base_amount);
    let incentive_amount = round_money(base_amount * incentive_rate);
    SalaryAmounts {
        base_amount,
        incentive_amount,
        final_amount: base_amount + incentive_amount,
    }
}
