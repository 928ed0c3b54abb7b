use serde::{Deserialize, Serialize};

use super::InputCheck;
use crate::valuation::ValidationError;

pub const DEFAULT_HOLDING_YEARS: u32 = 10;
pub const DEFAULT_APPRECIATION: f64 = 0.05;
pub const DEFAULT_EXPENSE_FRACTION: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RoiInput {
    #[serde(alias = "price")]
    pub purchase_price: f64,
    pub monthly_rent: f64,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(alias = "appreciation_rate", default = "default_appreciation")]
    pub annual_appreciation: f64,
    #[serde(alias = "expenses_percent", default = "default_expense_fraction")]
    pub expense_fraction: f64,
}

impl RoiInput {
    pub fn with_defaults(purchase_price: f64, monthly_rent: f64) -> Self {
        Self {
            purchase_price,
            monthly_rent,
            years: DEFAULT_HOLDING_YEARS,
            annual_appreciation: DEFAULT_APPRECIATION,
            expense_fraction: DEFAULT_EXPENSE_FRACTION,
        }
    }
}

fn default_years() -> u32 {
    DEFAULT_HOLDING_YEARS
}

fn default_appreciation() -> f64 {
    DEFAULT_APPRECIATION
}

fn default_expense_fraction() -> f64 {
    DEFAULT_EXPENSE_FRACTION
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiYear {
    pub year: u32,
    pub property_value: f64,
    pub yearly_rent: f64,
    pub cumulative_income: f64,
    pub capital_gain: f64,
    pub total_return: f64,
    pub roi_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiProjection {
    pub purchase_price: f64,
    pub monthly_rent: f64,
    pub years: u32,
    pub annual_appreciation: f64,
    pub expense_fraction: f64,
    pub yearly: Vec<RoiYear>,
    pub final_property_value: f64,
    pub total_rental_income: f64,
    pub total_capital_gain: f64,
    pub total_return: f64,
    pub total_roi_percent: f64,
}

/// Year-by-year return from net rent plus compound appreciation. Amounts are
/// rounded to whole units and percentages to two decimals, per row.
pub fn roi(input: &RoiInput) -> Result<RoiProjection, ValidationError> {
    InputCheck::default()
        .positive("purchase_price", input.purchase_price)
        .non_negative("monthly_rent", input.monthly_rent)
        .years("years", input.years)
        .rate("annual_appreciation", input.annual_appreciation)
        .fraction("expense_fraction", input.expense_fraction)
        .finish()?;

    let yearly_rent = input.monthly_rent * 12.0 * (1.0 - input.expense_fraction);
    let mut property_value = input.purchase_price;
    let mut cumulative_income = 0.0;
    let mut yearly = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        cumulative_income += yearly_rent;
        property_value *= 1.0 + input.annual_appreciation;
        let capital_gain = property_value - input.purchase_price;
        let total_return = cumulative_income + capital_gain;

        yearly.push(RoiYear {
            year,
            property_value: property_value.round(),
            yearly_rent: yearly_rent.round(),
            cumulative_income: cumulative_income.round(),
            capital_gain: capital_gain.round(),
            total_return: total_return.round(),
            roi_percent: round_two_decimals(total_return / input.purchase_price * 100.0),
        });
    }

    // years >= 1 was validated above
    let last = yearly[yearly.len() - 1];
    Ok(RoiProjection {
        purchase_price: input.purchase_price,
        monthly_rent: input.monthly_rent,
        years: input.years,
        annual_appreciation: input.annual_appreciation,
        expense_fraction: input.expense_fraction,
        final_property_value: last.property_value,
        total_rental_income: last.cumulative_income,
        total_capital_gain: last.capital_gain,
        total_return: last.total_return,
        total_roi_percent: last.roi_percent,
        yearly,
    })
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
