//! The calculation engine: pure, stateless, and deterministic.
//!
//! Each submodule implements one operation contract. Inputs are validated at
//! the boundary before any arithmetic runs; all currency outputs are rounded
//! to two decimal places with banker's rounding (see [`money`]).

pub mod affordability;
pub mod buy_to_let;
pub mod comparison;
pub mod money;
pub mod overpayment;
pub mod remortgage;
pub mod repayment;
pub mod stamp_duty;
