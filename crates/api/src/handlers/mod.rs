pub mod analytics;
pub mod auth;
pub mod rfps;
pub mod vendors;
