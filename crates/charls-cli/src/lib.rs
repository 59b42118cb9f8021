//! CLI library components for the CHARLS imputation tool.

pub mod logging;
pub mod scaffold;
