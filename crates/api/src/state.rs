use std::sync::Arc;

use procura_core::store::{RfpStore, UserStore, VendorSettingsStore};
use procura_db::{DbPool, MemoryStore, PgStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every store is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub rfps: Arc<dyn RfpStore>,
    pub users: Arc<dyn UserStore>,
    pub vendor_settings: Arc<dyn VendorSettingsStore>,
    /// Present only for the PostgreSQL backend; used by the health check.
    pub pool: Option<DbPool>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State backed by PostgreSQL.
    pub fn postgres(pool: DbPool, config: ServerConfig) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            rfps: store.clone(),
            users: store.clone(),
            vendor_settings: store,
            pool: Some(pool),
            config: Arc::new(config),
        }
    }

    /// State backed by a fresh in-process store.
    pub fn in_memory(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            rfps: store.clone(),
            users: store.clone(),
            vendor_settings: store,
            pool: None,
            config: Arc::new(config),
        }
    }

    pub fn store_kind(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
