//! `Dragonfly` (Redis-compatible) durable store backend.
//!
//! Snapshots are stored as plain string values under their pointer path:
//! the full tree at key `/`, secondary views at keys like `/leaderboard`.
//! Keys are namespaced with an `idlewild:` prefix so the engine can share
//! an instance with other tenants.

use fred::prelude::*;

use crate::error::DbError;
use crate::store::DurableStore;

/// Key prefix for all engine-owned values.
const KEY_PREFIX: &str = "idlewild:";

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL follows the Redis URL scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    fn key(path: &str) -> String {
        format!("{KEY_PREFIX}{path}")
    }
}

impl DurableStore for DragonflyStore {
    async fn get(&self, path: &str) -> Result<Option<String>, DbError> {
        let value: Option<String> = self.client.get(Self::key(path)).await?;
        Ok(value)
    }

    async fn put(&self, path: &str, value: &str) -> Result<(), DbError> {
        let _: () = self
            .client
            .set(Self::key(path), value, None, None, false)
            .await?;
        Ok(())
    }
}
