//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use meridian_core::seed::{SeedData, SeedError};

use crate::config::AdminConfig;
use crate::db::AdminStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The store is seeded once at
/// start-up and every edit goes through its write lock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: RwLock<AdminStore>,
}

impl AppState {
    /// Create application state around a store.
    #[must_use]
    pub fn new(config: AdminConfig, store: AdminStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: RwLock::new(store),
            }),
        }
    }

    /// Create application state from the built-in seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded seed data fails to parse.
    pub fn from_seed(config: AdminConfig) -> Result<Self, SeedError> {
        Ok(Self::new(config, AdminStore::from(SeedData::load()?)))
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Shared read access to the store.
    pub async fn store(&self) -> RwLockReadGuard<'_, AdminStore> {
        self.inner.store.read().await
    }

    /// Exclusive write access to the store.
    pub async fn store_mut(&self) -> RwLockWriteGuard<'_, AdminStore> {
        self.inner.store.write().await
    }
}
