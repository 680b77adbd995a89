//! The command surface.
//!
//! Transport adapters parse command text however their backend likes and
//! call these handlers; each one produces a plain text response. The
//! handlers are read-mostly -- only `play` and `transfer` mutate -- and
//! every lookup failure degrades to an empty default rather than an
//! error, so a flaky chat backend can never take a command down with it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use idlewild_players::{wealth, Registry};
use idlewild_types::{level_for_experience, ChannelMessage, Presence};

use crate::outbox::Outbox;
use crate::service::ChatService;
use crate::transfer;

/// Rows shown by the leaderboard command.
const LEADERBOARD_LIMIT: usize = 10;

/// Command handlers bound to the registry and the known services.
#[derive(Clone)]
pub struct Commands {
    registry: Registry,
    outbox: Outbox,
    services: BTreeMap<String, Arc<dyn ChatService>>,
    service_timeout: Duration,
}

impl Commands {
    /// Create the command surface.
    pub fn new(
        registry: Registry,
        outbox: Outbox,
        services: BTreeMap<String, Arc<dyn ChatService>>,
        service_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            outbox,
            services,
            service_timeout,
        }
    }

    /// `online`: list every player currently marked online.
    pub async fn online(&self) -> String {
        let players = match self.registry.state().get("/players").await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "online command could not read players");
                None
            }
        };

        let names: Vec<String> = players
            .as_ref()
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter(|(_, stored)| {
                        stored
                            .get("presence")
                            .and_then(Value::as_str)
                            .is_some_and(|p| p == "online")
                    })
                    .map(|(id, stored)| display_name(id, stored))
                    .collect()
            })
            .unwrap_or_default();

        if names.is_empty() {
            String::from("nobody is adventuring right now.")
        } else {
            format!("adventuring now: {}", names.join(", "))
        }
    }

    /// `memberlist`: list the members of a channel on a service.
    ///
    /// The service call is guarded by the configured timeout; failures
    /// and timeouts read as an empty channel.
    pub async fn memberlist(&self, service: &str, channel: &str) -> String {
        let Some(adapter) = self.services.get(service) else {
            return format!("no service named `{service}`.");
        };

        let members = match tokio::time::timeout(self.service_timeout, adapter.members(channel))
            .await
        {
            Ok(Ok(members)) => members,
            Ok(Err(e)) => {
                warn!(service, channel, error = %e, "memberlist lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(service, channel, "memberlist lookup timed out");
                Vec::new()
            }
        };

        if members.is_empty() {
            format!("{channel} has no members.")
        } else {
            format!("{channel}: {}", members.join(", "))
        }
    }

    /// `play`: register the caller and mark them online.
    pub async fn play(&self, actor: &str) -> String {
        let Ok((id, mut profile)) = self.registry.get_profile(actor).await else {
            return String::from("the world is unavailable right now.");
        };
        profile.presence = Presence::Online;

        match self.registry.register_player(&id.to_string(), &profile).await {
            Ok(stored) => {
                let level = level_for_experience(stored.experience);
                format!("you are adventuring as {id} (level {level}). Stay idle and prosper.")
            }
            Err(e) => {
                warn!(actor, error = %e, "play registration failed");
                String::from("the world is unavailable right now.")
            }
        }
    }

    /// `profile`: render the caller's full profile.
    pub async fn profile(&self, actor: &str) -> String {
        let Ok((id, profile)) = self.registry.get_profile(actor).await else {
            return String::from("the world is unavailable right now.");
        };
        let level = level_for_experience(profile.experience);
        let weapon = profile
            .equipment
            .weapon
            .as_ref()
            .map_or_else(|| String::from("bare hands"), |item| item.name.clone());
        format!(
            "{id}: level {level} ({} xp), {} health, {} stamina, {} wealth, wielding {weapon}, cooldown {}",
            profile.experience, profile.health, profile.stamina, profile.wealth, profile.cooldown
        )
    }

    /// `inventory`: list the caller's carried items and weapon.
    pub async fn inventory(&self, actor: &str) -> String {
        let Ok((_, profile)) = self.registry.get_profile(actor).await else {
            return String::from("the world is unavailable right now.");
        };

        let weapon = profile
            .equipment
            .weapon
            .as_ref()
            .map_or_else(|| String::from("nothing equipped"), |item| {
                format!("{} equipped", item.name)
            });

        if profile.inventory.is_empty() {
            format!("{weapon}; your pack is empty.")
        } else {
            let items: Vec<&str> = profile
                .inventory
                .iter()
                .map(|item| item.name.as_str())
                .collect();
            format!("{weapon}; pack: {}", items.join(", "))
        }
    }

    /// `leaderboard`: render the top players by experience.
    pub async fn leaderboard(&self) -> String {
        let players = match self.registry.state().get("/players").await {
            Ok(Some(value)) => value,
            Ok(None) => return String::from("the world is empty."),
            Err(e) => {
                warn!(error = %e, "leaderboard could not read players");
                return String::from("the world is unavailable right now.");
            }
        };

        let rows = wealth::leaderboard(&players);
        if rows.is_empty() {
            return String::from("the world is empty.");
        }

        let lines: Vec<String> = rows
            .iter()
            .take(LEADERBOARD_LIMIT)
            .enumerate()
            .map(|(index, row)| {
                let rank = index.saturating_add(1);
                let name = if row.name.is_empty() {
                    row.id.as_str()
                } else {
                    row.name.as_str()
                };
                format!(
                    "{rank}. {name} -- level {}, {} xp, {} wealth",
                    row.level, row.experience, row.wealth
                )
            })
            .collect();
        lines.join("\n")
    }

    /// `transfer <amount> <user>`: move wealth to another player.
    pub async fn transfer(&self, message: &ChannelMessage) -> String {
        transfer::handle_transfer(&self.registry, &self.outbox, message).await
    }

    /// `balance`: report the caller's wealth.
    pub async fn balance(&self, actor: &str) -> String {
        let Ok((_, profile)) = self.registry.get_profile(actor).await else {
            return String::from("the world is unavailable right now.");
        };
        format!("you have {} wealth.", profile.wealth)
    }
}

/// Prefer the stored display name, falling back to the canonical id.
fn display_name(id: &str, stored: &Value) -> String {
    stored
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(id)
        .to_owned()
}
