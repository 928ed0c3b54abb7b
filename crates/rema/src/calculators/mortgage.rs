use serde::{Deserialize, Serialize};

use super::InputCheck;
use crate::valuation::ValidationError;

pub const DEFAULT_DOWN_PAYMENT: f64 = 0.20;
pub const DEFAULT_ANNUAL_RATE: f64 = 0.085;
pub const DEFAULT_TERM_YEARS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MortgageInput {
    #[serde(alias = "property_price")]
    pub price: f64,
    #[serde(alias = "down_payment_percent", default = "default_down_payment")]
    pub down_payment_fraction: f64,
    #[serde(default = "default_annual_rate")]
    pub annual_rate: f64,
    #[serde(default = "default_term_years")]
    pub years: u32,
}

impl MortgageInput {
    pub fn with_defaults(price: f64) -> Self {
        Self {
            price,
            down_payment_fraction: DEFAULT_DOWN_PAYMENT,
            annual_rate: DEFAULT_ANNUAL_RATE,
            years: DEFAULT_TERM_YEARS,
        }
    }
}

fn default_down_payment() -> f64 {
    DEFAULT_DOWN_PAYMENT
}

fn default_annual_rate() -> f64 {
    DEFAULT_ANNUAL_RATE
}

fn default_term_years() -> u32 {
    DEFAULT_TERM_YEARS
}

/// Monetary amounts are whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MortgageBreakdown {
    pub price: f64,
    pub down_payment: f64,
    pub loan_amount: f64,
    pub annual_rate: f64,
    pub term_years: u32,
    pub payments: u32,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

/// Fixed-rate amortization; a zero rate divides the loan evenly.
pub fn mortgage(input: &MortgageInput) -> Result<MortgageBreakdown, ValidationError> {
    InputCheck::default()
        .positive("price", input.price)
        .fraction("down_payment_fraction", input.down_payment_fraction)
        .fraction("annual_rate", input.annual_rate)
        .years("years", input.years)
        .finish()?;

    let down_payment = (input.price * input.down_payment_fraction).trunc();
    let loan_amount = input.price - down_payment;
    let monthly_rate = input.annual_rate / 12.0;
    let payments = input.years * 12;

    let monthly_payment = if monthly_rate > 0.0 {
        let growth = (1.0 + monthly_rate).powi(payments as i32);
        loan_amount * monthly_rate * growth / (growth - 1.0)
    } else {
        loan_amount / f64::from(payments)
    };
    let total_paid = monthly_payment * f64::from(payments);

    Ok(MortgageBreakdown {
        price: input.price,
        down_payment,
        loan_amount,
        annual_rate: input.annual_rate,
        term_years: input.years,
        payments,
        monthly_payment: monthly_payment.round(),
        total_paid: total_paid.round(),
        total_interest: (total_paid - loan_amount).round(),
    })
}
