//! Variable classification and missing-data analysis.
//!
//! - [`classify`]: match the domain vocabulary against a frame's columns and
//!   coerce binary/ordinal columns to categorical kinds
//! - [`analyze`]: per-column missing counts and table-wide completeness

pub mod classify;
pub mod missing;

pub use classify::{classify, natural_levels};
pub use missing::analyze;
