//! Client-side data model and math layer for a concentrated-liquidity AMM.
//!
//! - [`price`] converts token-pair prices to and from `sqrt_price_x64`.
//! - [`accounts`] holds pool, position, tick-array and token account records
//!   and derives their addresses.
//! - [`batch`] finalizes transaction requests concurrently and submits them
//!   to a [`ledger::Ledger`] in one call.

pub mod accounts;
pub mod batch;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod price;
pub mod utils;

pub use errors::{ClientError, Result};
