//! Valuation and opportunity-ranking engine for real-estate listings.
//!
//! [`valuation`] turns loose property attributes into a predicted price and an
//! undervalued / fair / overvalued badge; [`inventory`] resolves searches,
//! filters, sorts and pages over the listing collection using the badges
//! computed at ingestion time; [`calculators`] adds mortgage and rental
//! return projections.

pub mod calculators;
pub mod config;
pub mod error;
pub mod inventory;
pub mod telemetry;
pub mod valuation;
