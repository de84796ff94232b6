//! Settings persistence
//!
//! The store is the single writer of settings. Each successful save replaces
//! the previous record as a whole.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::StoreError;
use crate::settings::{NormalizedSettings, StoredSettings};

/// Trait for persisting normalized settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Whether a configuration has been saved before
    async fn exists(&self) -> Result<bool, StoreError>;

    /// Load the current settings, if any
    async fn load(&self) -> Result<Option<StoredSettings>, StoreError>;

    /// Replace the current settings
    async fn save(&self, settings: NormalizedSettings) -> Result<StoredSettings, StoreError>;
}

/// A simple in-memory store for testing or ephemeral instances
#[derive(Default, Clone)]
pub struct InMemorySettingsStore {
    current: Arc<RwLock<Option<StoredSettings>>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.current.read().is_some())
    }

    async fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        Ok(self.current.read().clone())
    }

    async fn save(&self, settings: NormalizedSettings) -> Result<StoredSettings, StoreError> {
        let stored = StoredSettings::new(settings);
        *self.current.write() = Some(stored.clone());
        Ok(stored)
    }
}
