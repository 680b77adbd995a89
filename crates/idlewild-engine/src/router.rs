//! Inbound event routing.
//!
//! Transport adapters push [`InboundEvent`] values into one queue; the
//! router translates each into the corresponding registry or store
//! operation. Every handler swallows and logs its failures -- a join we
//! cannot record or a peer patch that does not apply is a warning, never
//! a crash -- which keeps the event loop alive through flaky transports.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use idlewild_players::{Registry, RegistryError};
use idlewild_state::StoreError;
use idlewild_types::{
    CanonicalId, ChannelMessage, InboundEvent, PatchOp, Presence, ids::LOCAL_SERVICE,
};

use crate::outbox::Outbox;
use crate::penalty;
use crate::transfer;

/// Routes inbound events to registry and store operations.
#[derive(Clone)]
pub struct Router {
    registry: Registry,
    outbox: Outbox,
}

impl Router {
    /// Create a router.
    pub fn new(registry: Registry, outbox: Outbox) -> Self {
        Self { registry, outbox }
    }

    /// Drain the event queue until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("Event queue closed, router stopping");
    }

    /// Dispatch one event.
    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Join { channel, user } => {
                if let Err(e) = self.on_join(&channel, &user).await {
                    warn!(channel, user, error = %e, "join failed");
                }
            }
            InboundEvent::Part { player } => {
                if let Err(e) = self.registry.disjoin_player(&player).await {
                    warn!(player, error = %e, "part failed");
                }
            }
            InboundEvent::User { id, name } => {
                if let Err(e) = self.on_user(&id, &name).await {
                    warn!(id, name, error = %e, "user registration failed");
                }
            }
            InboundEvent::Channel { id, name } => {
                if let Err(e) = self.on_channel(&id, &name).await {
                    warn!(id, name, error = %e, "channel registration failed");
                }
            }
            InboundEvent::Message(message) => self.on_message(message).await,
            InboundEvent::Service { name } => {
                if let Err(e) = self.registry.register_service(&name).await {
                    warn!(service = name, error = %e, "service registration failed");
                }
            }
            InboundEvent::Patch(op) => self.apply_peer_patch(vec![op]).await,
            InboundEvent::Patches(ops) => self.apply_peer_patch(ops).await,
        }
    }

    /// Join: the player comes online and is added to the channel's
    /// member set. The channel is created on its first join and never
    /// deleted.
    async fn on_join(&self, channel: &str, user: &str) -> Result<(), RegistryError> {
        let (player_id, mut profile) = self.registry.get_profile(user).await?;
        profile.presence = Presence::Online;
        self.registry
            .register_player(&player_id.to_string(), &profile)
            .await?;

        let channel_id = channel_identity(channel)?;
        let canonical_channel = channel_id.to_string();
        let (_, mut record) = self.registry.get_channel(&canonical_channel).await?;
        if record.name.is_empty() {
            record.name = channel_id.name.clone();
        }
        record.members.insert(player_id.to_string());
        self.registry
            .register_channel(&canonical_channel, &record)
            .await?;

        debug!(player = %player_id, channel = %channel_id, "join recorded");
        Ok(())
    }

    /// User: record the identity and carry the display name onto the
    /// player's profile.
    async fn on_user(&self, id: &str, name: &str) -> Result<(), RegistryError> {
        self.registry.register_user(id, name).await?;

        let (player_id, mut profile) = self.registry.get_profile(id).await?;
        if profile.name != name {
            profile.name = name.to_owned();
            self.registry
                .register_player(&player_id.to_string(), &profile)
                .await?;
        }
        Ok(())
    }

    /// Channel: record or rename the channel, keeping its member set.
    async fn on_channel(&self, id: &str, name: &str) -> Result<(), RegistryError> {
        let channel_id = channel_identity(id)?;
        let canonical = channel_id.to_string();
        let (_, mut record) = self.registry.get_channel(&canonical).await?;
        record.name = name.to_owned();
        self.registry.register_channel(&canonical, &record).await?;
        Ok(())
    }

    /// Message: speaking in a monitored channel is the rule violation,
    /// so the penalty always applies; a `!transfer` body additionally
    /// runs the transfer engine, with the response whispered back.
    async fn on_message(&self, message: ChannelMessage) {
        let Some(actor) = message.actor.clone() else {
            debug!("message without actor ignored");
            return;
        };

        penalty::apply_penalty_logged(&self.registry, &self.outbox, &actor).await;

        if message
            .object
            .as_deref()
            .is_some_and(|object| object.trim_start().starts_with("!transfer"))
        {
            let response = transfer::handle_transfer(&self.registry, &self.outbox, &message).await;
            self.outbox.whisper(actor, response);
        }
    }

    /// Apply a peer patch batch. The batch is transactional; a rejected
    /// batch is logged and dropped.
    async fn apply_peer_patch(&self, ops: Vec<PatchOp>) {
        let count = ops.len();
        match self.registry.state().apply_commit(ops).await {
            Ok(paths) => debug!(ops = count, paths = paths.len(), "peer patch applied"),
            Err(StoreError::Patch { source }) => {
                warn!(ops = count, error = %source, "peer patch rejected");
            }
            Err(e) => warn!(ops = count, error = %e, "peer patch failed"),
        }
    }
}

/// Canonical identity for a raw channel id.
///
/// Bare ids become `local/channels/<id>`; full three-segment ids pass
/// through `CanonicalId::canonicalize`.
fn channel_identity(raw: &str) -> Result<CanonicalId, RegistryError> {
    if raw.contains('/') {
        Ok(CanonicalId::canonicalize(raw)?)
    } else if raw.is_empty() {
        Ok(CanonicalId::canonicalize(raw)?)
    } else {
        Ok(CanonicalId::channel(LOCAL_SERVICE, raw))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_db::MemoryStore;
    use idlewild_types::{Presence, Profile};
    use serde_json::json;

    use super::*;

    async fn setup() -> Router {
        let (handle, _task) = idlewild_state::spawn(MemoryStore::new()).await;
        Router::new(Registry::new(handle), Outbox::new())
    }

    #[tokio::test]
    async fn join_marks_player_online_and_records_membership() {
        let router = setup().await;
        router
            .handle(InboundEvent::Join {
                channel: String::from("tavern"),
                user: String::from("alice"),
            })
            .await;

        let (_, profile) = router.registry.get_profile("alice").await.unwrap();
        assert_eq!(profile.presence, Presence::Online);

        let (_, channel) = router
            .registry
            .get_channel("local/channels/tavern")
            .await
            .unwrap();
        assert!(channel.members.contains("local/users/alice"));
        assert_eq!(channel.name, "tavern");
    }

    #[tokio::test]
    async fn part_marks_player_offline() {
        let router = setup().await;
        router
            .handle(InboundEvent::Join {
                channel: String::from("tavern"),
                user: String::from("alice"),
            })
            .await;
        router
            .handle(InboundEvent::Part {
                player: String::from("alice"),
            })
            .await;

        let (_, profile) = router.registry.get_profile("alice").await.unwrap();
        assert_eq!(profile.presence, Presence::Offline);
    }

    #[tokio::test]
    async fn user_event_sets_display_name() {
        let router = setup().await;
        router
            .handle(InboundEvent::User {
                id: String::from("alice"),
                name: String::from("Alice the Bold"),
            })
            .await;

        let (_, profile) = router.registry.get_profile("alice").await.unwrap();
        assert_eq!(profile.name, "Alice the Bold");

        let user = router
            .registry
            .state()
            .get("/users/local~1users~1alice")
            .await
            .unwrap();
        assert_eq!(user.unwrap().get("name"), Some(&json!("Alice the Bold")));
    }

    #[tokio::test]
    async fn message_applies_the_penalty() {
        let router = setup().await;
        let mut profile = Profile::default();
        profile.wealth = 100;
        router.registry.register_player("alice", &profile).await.unwrap();

        router
            .handle(InboundEvent::Message(ChannelMessage {
                actor: Some(String::from("alice")),
                target: None,
                object: Some(String::from("hello everyone")),
                origin: None,
            }))
            .await;

        let (_, after) = router.registry.get_profile("alice").await.unwrap();
        assert_eq!(after.wealth, 50);
        assert_eq!(after.cooldown, 1000);
    }

    #[tokio::test]
    async fn transfer_message_still_costs_the_penalty_first() {
        let router = setup().await;
        let mut profile = Profile::default();
        profile.wealth = 100;
        router.registry.register_player("alice", &profile).await.unwrap();

        router
            .handle(InboundEvent::Message(ChannelMessage {
                actor: Some(String::from("alice")),
                target: None,
                object: Some(String::from("!transfer 10 bob")),
                origin: None,
            }))
            .await;

        // Penalty halves 100 to 50, then 10 moves to bob.
        let (_, alice) = router.registry.get_profile("alice").await.unwrap();
        let (_, bob) = router.registry.get_profile("bob").await.unwrap();
        assert_eq!(alice.wealth, 40);
        assert_eq!(bob.wealth, 10);
    }

    #[tokio::test]
    async fn peer_patches_apply_transactionally() {
        let router = setup().await;
        router
            .handle(InboundEvent::Patches(vec![
                PatchOp::add("/players/peer", json!({"wealth": 5})),
                PatchOp::add("/players/peer/presence", json!("online")),
            ]))
            .await;

        let value = router.registry.state().get("/players/peer/wealth").await.unwrap();
        assert_eq!(value, Some(json!(5)));

        // A batch with a bad op changes nothing.
        router
            .handle(InboundEvent::Patches(vec![
                PatchOp::replace("/players/peer/wealth", json!(9)),
                PatchOp::replace("/players/ghost/wealth", json!(1)),
            ]))
            .await;
        let value = router.registry.state().get("/players/peer/wealth").await.unwrap();
        assert_eq!(value, Some(json!(5)));
    }

    #[tokio::test]
    async fn service_event_registers_once() {
        let router = setup().await;
        router
            .handle(InboundEvent::Service {
                name: String::from("irc"),
            })
            .await;
        router
            .handle(InboundEvent::Service {
                name: String::from("irc"),
            })
            .await;

        assert_eq!(
            router.registry.service_names().await.unwrap(),
            vec!["irc"]
        );
    }
}
