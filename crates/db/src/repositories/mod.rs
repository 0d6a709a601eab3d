//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and return raw rows.

pub mod rfp_repo;
pub mod user_repo;
pub mod vendor_settings_repo;

pub use rfp_repo::RfpRepo;
pub use user_repo::UserRepo;
pub use vendor_settings_repo::VendorSettingsRepo;
