//! Reductions over the joined tract table.
//!
//! Counts food-desert tracts per majority category, splits each group's
//! population by food-desert status, and prepares the scatter handoff.

pub mod aggregate;
pub mod types;
pub mod utility;
