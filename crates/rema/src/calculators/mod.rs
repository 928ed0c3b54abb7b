//! Financing and investment calculators offered next to the price estimate.

pub mod mortgage;
pub mod roi;
pub mod router;

pub use mortgage::{mortgage, MortgageBreakdown, MortgageInput};
pub use roi::{roi, RoiInput, RoiProjection, RoiYear};
pub use router::calculator_router;

use crate::valuation::{FieldError, ValidationError};

/// Longest term either calculator accepts.
pub const MAX_YEARS: u32 = 50;

/// Collects range violations so callers see every bad input at once.
#[derive(Debug, Default)]
pub(crate) struct InputCheck {
    fields: Vec<FieldError>,
}

impl InputCheck {
    pub(crate) fn positive(&mut self, field: &'static str, value: f64) -> &mut Self {
        if !value.is_finite() || value <= 0.0 {
            self.fail(field, "must be a positive number");
        }
        self
    }

    pub(crate) fn non_negative(&mut self, field: &'static str, value: f64) -> &mut Self {
        if !value.is_finite() || value < 0.0 {
            self.fail(field, "must be a non-negative number");
        }
        self
    }

    pub(crate) fn fraction(&mut self, field: &'static str, value: f64) -> &mut Self {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            self.fail(field, "must be a fraction in [0, 1)");
        }
        self
    }

    /// Growth rates may be negative but never wipe out the whole value.
    pub(crate) fn rate(&mut self, field: &'static str, value: f64) -> &mut Self {
        if !value.is_finite() || value <= -1.0 || value >= 1.0 {
            self.fail(field, "must be a rate between -1 and 1");
        }
        self
    }

    pub(crate) fn years(&mut self, field: &'static str, value: u32) -> &mut Self {
        if value == 0 || value > MAX_YEARS {
            self.fail(field, format!("must be between 1 and {MAX_YEARS}"));
        }
        self
    }

    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn finish(&mut self) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: std::mem::take(&mut self.fields),
            })
        }
    }
}
