//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::store::Database;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for the named durable slots
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a slot's raw value, `None` when absent
    async fn load_slot(&self, key: &str) -> Result<Option<String>, String>;

    /// Overwrite a slot
    async fn save_slot(&self, key: &str, value: &str) -> Result<(), String>;

    /// Remove a slot
    async fn clear_slot(&self, key: &str) -> Result<(), String>;
}

#[async_trait]
impl<T: SlotStore + ?Sized> SlotStore for Arc<T> {
    async fn load_slot(&self, key: &str) -> Result<Option<String>, String> {
        (**self).load_slot(key).await
    }

    async fn save_slot(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).save_slot(key, value).await
    }

    async fn clear_slot(&self, key: &str) -> Result<(), String> {
        (**self).clear_slot(key).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter to use Database as a `SlotStore`
#[derive(Clone)]
pub struct DatabaseSlots {
    db: Database,
}

impl DatabaseSlots {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SlotStore for DatabaseSlots {
    async fn load_slot(&self, key: &str) -> Result<Option<String>, String> {
        let record = self.db.get_slot(key).map_err(|e| e.to_string())?;
        Ok(record.map(|r| {
            tracing::debug!(slot = %r.key, updated_at = %r.updated_at, "Loaded slot");
            r.value
        }))
    }

    async fn save_slot(&self, key: &str, value: &str) -> Result<(), String> {
        self.db.put_slot(key, value).map_err(|e| e.to_string())
    }

    async fn clear_slot(&self, key: &str) -> Result<(), String> {
        self.db.remove_slot(key).map_err(|e| e.to_string())
    }
}
