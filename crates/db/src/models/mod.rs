//! Row types read from PostgreSQL and their conversions into core types.

pub mod rfp;
pub mod user;
pub mod vendor_settings;
