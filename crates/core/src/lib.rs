//! Domain logic for the Procura procurement service.
//!
//! Pure rules (validation, authorization, aggregation) plus async operations
//! written against the storage traits in [`store`]. Nothing here depends on
//! a database driver or HTTP framework.

pub mod analytics;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod query;
pub mod rfp;
pub mod roles;
pub mod store;
pub mod types;
pub mod user;
pub mod vendor_settings;
