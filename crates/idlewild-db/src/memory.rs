//! In-memory durable store backend.
//!
//! Backs engine tests and local single-process runs. Values survive for
//! the lifetime of the process only, but the handle is cheaply cloneable,
//! so a test can keep one clone and inspect what the engine committed --
//! or hand the same backend to a second engine to exercise the
//! commit-then-restore round trip.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::DurableStore;

/// A process-local durable store over a shared map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct paths written so far.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Whether nothing has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

impl DurableStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<String>, DbError> {
        Ok(self.values.read().await.get(path).cloned())
    }

    async fn put(&self, path: &str, value: &str) -> Result<(), DbError> {
        self.values
            .write()
            .await
            .insert(path.to_owned(), value.to_owned());
        Ok(())
    }
}
