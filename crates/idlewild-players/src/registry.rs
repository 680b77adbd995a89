//! The player registry.
//!
//! Canonicalizes identities and keeps the `/players`, `/channels`,
//! `/users`, and `/services` subtrees canonical: every write goes through
//! a single-operation patch plus commit on the state actor, and every
//! registration returns the freshly re-read stored value so callers
//! always observe post-commit state, never their own local object.

use serde_json::{json, Value};
use tracing::debug;

use idlewild_state::{GameState, StateHandle, StoreError};
use idlewild_types::{CanonicalId, Channel, IdError, PatchOp, Presence, Profile, ServiceRecord};

use crate::hydrate;

/// Errors surfaced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The caller supplied a malformed identity.
    #[error("identity error: {source}")]
    Id {
        /// The underlying identity error.
        #[from]
        source: IdError,
    },

    /// A state read or patch-commit failed.
    #[error("state error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A record vanished between its registration commit and the re-read.
    /// Should not happen while this process is the sole writer.
    #[error("record missing after commit: {path}")]
    MissingAfterCommit {
        /// The path that failed to re-read.
        path: String,
    },
}

/// Registry over the state actor.
#[derive(Clone)]
pub struct Registry {
    state: StateHandle,
}

impl Registry {
    /// Create a registry backed by the given state handle.
    pub fn new(state: StateHandle) -> Self {
        Self { state }
    }

    /// The state handle this registry writes through.
    pub const fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Normalize a raw id (see [`CanonicalId::canonicalize`]).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Id`] for malformed input.
    pub fn canonicalize(raw: &str) -> Result<CanonicalId, RegistryError> {
        Ok(CanonicalId::canonicalize(raw)?)
    }

    /// Fetch and hydrate a player profile.
    ///
    /// Reads whatever is stored (possibly nothing) and overlays the
    /// canonical defaults, so the result is always a complete profile.
    /// Does not write; registration is a separate step.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Id`] for malformed ids or
    /// [`RegistryError::Store`] if the state actor is unreachable.
    pub async fn get_profile(&self, raw: &str) -> Result<(CanonicalId, Profile), RegistryError> {
        let id = CanonicalId::canonicalize(raw)?;
        let stored = self.state.get(&GameState::player_path(&id)).await?;
        let hydrated = hydrate::hydrate(stored.as_ref());
        Ok((id, hydrate::typed(&hydrated)))
    }

    /// Upsert a player profile and return the post-commit stored value.
    ///
    /// The profile is hydrated before writing, preserving the invariant
    /// that everything under `/players` is fully defaulted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed ids, failed commits, or a
    /// failed post-commit re-read.
    pub async fn register_player(
        &self,
        raw: &str,
        profile: &Profile,
    ) -> Result<Profile, RegistryError> {
        let id = CanonicalId::canonicalize(raw)?;
        let path = GameState::player_path(&id);
        let value = hydrate::hydrate(Some(&serde_json::to_value(profile).unwrap_or_default()));

        self.upsert(&path, value).await?;
        debug!(player = %id, "Registered player");

        let stored = self
            .state
            .get(&path)
            .await?
            .ok_or(RegistryError::MissingAfterCommit { path })?;
        Ok(hydrate::typed(&hydrate::hydrate(Some(&stored))))
    }

    /// Upsert a channel record and return the post-commit stored value.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed ids or failed commits.
    pub async fn register_channel(
        &self,
        raw: &str,
        channel: &Channel,
    ) -> Result<Channel, RegistryError> {
        let id = CanonicalId::canonicalize(raw)?;
        let path = GameState::channel_path(&id);
        let value = serde_json::to_value(channel).unwrap_or_else(|_| json!({}));

        self.upsert(&path, value).await?;
        debug!(channel = %id, "Registered channel");

        let stored = self
            .state
            .get(&path)
            .await?
            .ok_or(RegistryError::MissingAfterCommit { path })?;
        Ok(serde_json::from_value(stored).unwrap_or_default())
    }

    /// Fetch a channel record, defaulting to an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed ids or an unreachable
    /// state actor.
    pub async fn get_channel(&self, raw: &str) -> Result<(CanonicalId, Channel), RegistryError> {
        let id = CanonicalId::canonicalize(raw)?;
        let stored = self.state.get(&GameState::channel_path(&id)).await?;
        let channel = stored
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default();
        Ok((id, channel))
    }

    /// Upsert a user identity record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed ids or failed commits.
    pub async fn register_user(&self, raw: &str, name: &str) -> Result<(), RegistryError> {
        let id = CanonicalId::canonicalize(raw)?;
        let path = GameState::user_path(&id);
        self.upsert(&path, json!({ "name": name })).await?;
        debug!(user = %id, "Registered user");
        Ok(())
    }

    /// Register a chat service once.
    ///
    /// Re-registering an existing service is a no-op: the stored record
    /// (with its accumulated `users`/`channels` sub-maps) is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the read or commit fails.
    pub async fn register_service(&self, name: &str) -> Result<(), RegistryError> {
        let path = GameState::service_path(name);
        if self.state.get(&path).await?.is_some() {
            return Ok(());
        }

        let record = serde_json::to_value(ServiceRecord::default()).unwrap_or_else(|_| json!({}));
        self.upsert(&path, record).await?;
        debug!(service = name, "Registered service");
        Ok(())
    }

    /// List the names of every registered service.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the state actor is unreachable.
    pub async fn service_names(&self) -> Result<Vec<String>, RegistryError> {
        let services = self.state.get("/services").await?;
        Ok(services
            .as_ref()
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Re-register a player (ensuring existence) and mark them offline.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed ids or failed commits.
    pub async fn disjoin_player(&self, raw: &str) -> Result<Profile, RegistryError> {
        let (id, profile) = self.get_profile(raw).await?;
        let canonical = id.to_string();
        self.register_player(&canonical, &profile).await?;

        let path = GameState::player_path(&id);
        self.state
            .apply_commit(vec![PatchOp::replace(
                format!("{path}/presence"),
                serde_json::to_value(Presence::Offline).unwrap_or_else(|_| json!("offline")),
            )])
            .await?;
        debug!(player = %id, "Player disjoined");

        let (_, updated) = self.get_profile(&canonical).await?;
        Ok(updated)
    }

    /// Single-op upsert: one `add` patch, one commit.
    async fn upsert(&self, path: &str, value: Value) -> Result<(), RegistryError> {
        self.state
            .apply_commit(vec![PatchOp::add(path, value)])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_db::MemoryStore;

    use super::*;

    async fn registry() -> Registry {
        let (handle, _task) = idlewild_state::spawn(MemoryStore::new()).await;
        Registry::new(handle)
    }

    #[tokio::test]
    async fn get_profile_hydrates_missing_player() {
        let registry = registry().await;
        let (id, profile) = registry.get_profile("alice").await.unwrap();
        assert_eq!(id.to_string(), "local/users/alice");
        assert_eq!(profile.health, 100);
        assert_eq!(profile.wealth, 0);
        assert_eq!(profile.presence, Presence::Offline);
    }

    #[tokio::test]
    async fn get_profile_is_idempotent() {
        let registry = registry().await;
        let (_, first) = registry.get_profile("irc/users/bob").await.unwrap();
        let (_, second) = registry.get_profile("irc/users/bob").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn register_player_returns_post_commit_state() {
        let registry = registry().await;
        let mut profile = Profile::default();
        profile.name = String::from("alice");
        profile.wealth = 30;

        let stored = registry.register_player("alice", &profile).await.unwrap();
        assert_eq!(stored.name, "alice");
        assert_eq!(stored.wealth, 30);

        let (_, read_back) = registry.get_profile("alice").await.unwrap();
        assert_eq!(read_back, stored);
    }

    #[tokio::test]
    async fn register_player_rejects_empty_id() {
        let registry = registry().await;
        let result = registry.register_player("", &Profile::default()).await;
        assert!(matches!(result, Err(RegistryError::Id { .. })));
    }

    #[tokio::test]
    async fn register_service_is_idempotent() {
        let registry = registry().await;
        registry.register_service("irc").await.unwrap();

        // Simulate accumulated state, then re-register.
        registry
            .state()
            .apply_commit(vec![PatchOp::add(
                "/services/irc/users/alice",
                serde_json::json!({}),
            )])
            .await
            .unwrap();
        registry.register_service("irc").await.unwrap();

        let record = registry.state().get("/services/irc/users/alice").await.unwrap();
        assert!(record.is_some());
        assert_eq!(registry.service_names().await.unwrap(), vec!["irc"]);
    }

    #[tokio::test]
    async fn disjoin_marks_player_offline() {
        let registry = registry().await;
        let mut profile = Profile::default();
        profile.presence = Presence::Online;
        registry.register_player("alice", &profile).await.unwrap();

        let updated = registry.disjoin_player("alice").await.unwrap();
        assert_eq!(updated.presence, Presence::Offline);
    }

    #[tokio::test]
    async fn channel_upsert_round_trips_members() {
        let registry = registry().await;
        let mut channel = Channel::default();
        channel.name = String::from("#tavern");
        channel.members.insert(String::from("local/users/alice"));

        let stored = registry
            .register_channel("irc/channels/tavern", &channel)
            .await
            .unwrap();
        assert!(stored.members.contains("local/users/alice"));

        let (_, read_back) = registry.get_channel("irc/channels/tavern").await.unwrap();
        assert_eq!(read_back, stored);
    }
}
