//! The tick scheduler.
//!
//! A fixed-interval timer drives the world forward: each tick fetches
//! every online player (excluding the engine's own agent identity),
//! drains their cooldown, rolls for an encounter, applies the per-tick
//! wealth and experience rewards, announces level-ups, and writes each
//! updated profile back as its own replace-patch-plus-commit. One
//! player's failure never aborts the rest of the tick.
//!
//! Ticks never overlap: the loop awaits each tick to completion and
//! missed timer fires are skipped, so the state machine is strictly
//! `idle -> running -> idle`. After the last player, a tick-complete
//! signal goes out and the compiled leaderboard is written to the
//! durable path `/leaderboard` as a best-effort secondary view.

use serde_json::Value;
use tracing::{debug, info, warn};

use idlewild_players::{wealth, EncounterGenerator, Registry, RegistryError, Resolver};
use idlewild_state::{GameState, StoreError};
use idlewild_types::{level_for_experience, PatchOp, TickReport};

use crate::config::ProgressionConfig;
use crate::outbox::Outbox;

/// Durable path of the best-effort leaderboard view.
const LEADERBOARD_PATH: &str = "/leaderboard";

/// Summary of one executed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that ran.
    pub tick: u64,
    /// Players whose progression was applied without error.
    pub players_processed: u64,
}

/// Periodic driver of player progression.
pub struct TickRunner {
    registry: Registry,
    outbox: Outbox,
    resolver: Resolver,
    generator: Box<dyn EncounterGenerator>,
    config: ProgressionConfig,
    agent: String,
    tick: u64,
}

impl TickRunner {
    /// Create a runner.
    ///
    /// `agent` is the engine's own canonical identity, excluded from
    /// progression.
    pub fn new(
        registry: Registry,
        outbox: Outbox,
        config: ProgressionConfig,
        agent: String,
        generator: Box<dyn EncounterGenerator>,
    ) -> Self {
        Self {
            registry,
            outbox,
            resolver: Resolver::new(config.luck),
            generator,
            config,
            agent,
            tick: 0,
        }
    }

    /// Run the tick loop forever.
    ///
    /// Each tick runs to completion before the next can start; timer
    /// fires that land mid-tick are suppressed rather than queued.
    pub async fn run(mut self) {
        let period = std::time::Duration::from_millis(self.config.tick_interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first fire is immediate; consume it so ticks start one full
        // period after startup.
        interval.tick().await;

        loop {
            interval.tick().await;
            self.run_tick().await;
        }
    }

    /// Execute one tick across all active players.
    pub async fn run_tick(&mut self) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let tick = self.tick;

        let active = self.active_players().await;
        info!(tick, active = active.len(), "Tick started");

        let mut processed: u64 = 0;
        for player in &active {
            match self.process_player(player).await {
                Ok(()) => processed = processed.saturating_add(1),
                Err(e) => {
                    warn!(tick, player, error = %e, "Player progression failed");
                }
            }
        }

        self.write_leaderboard().await;

        self.outbox.tick(TickReport {
            tick,
            players_processed: processed,
            at: chrono::Utc::now(),
        });
        info!(tick, processed, "Tick complete");

        TickSummary {
            tick,
            players_processed: processed,
        }
    }

    /// Canonical ids of every online player except the engine's agent.
    async fn active_players(&self) -> Vec<String> {
        let players = match self.registry.state().get("/players").await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not list players, skipping tick body");
                return Vec::new();
            }
        };

        players
            .as_ref()
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter(|(id, stored)| id.as_str() != self.agent && is_online(stored))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Apply one player's cooldown decay and reward, then write the full
    /// profile back as a single replace patch and commit.
    async fn process_player(&mut self, raw: &str) -> Result<(), RegistryError> {
        let (id, profile) = self.registry.get_profile(raw).await?;
        let mut updated = profile.clone();

        updated.cooldown = updated.cooldown.saturating_sub(self.config.cooldown_decay);

        if updated.is_online() {
            let level_before = level_for_experience(profile.experience);

            // The rng lives only inside this block; holding a thread-local
            // rng across an await would pin the future to one thread.
            let narrative = {
                let mut rng = rand::rng();
                self.resolver
                    .resolve(&updated, &mut *self.generator, &mut rng)
            }
            .map(|outcome| {
                updated = outcome.profile;
                outcome.narrative
            });

            updated.wealth = updated.wealth.saturating_add(self.config.tick_wealth);
            updated.experience = updated
                .experience
                .saturating_add(self.config.tick_experience);

            if let Some(text) = narrative {
                self.outbox.announce(text);
            }

            let level_after = level_for_experience(updated.experience);
            if level_after > level_before {
                let who = if updated.name.is_empty() {
                    id.to_string()
                } else {
                    updated.name.clone()
                };
                self.outbox.announce(format!("{who} reaches level {level_after}!"));
            }
        }

        let value = serde_json::to_value(&updated)
            .map_err(|e| RegistryError::from(StoreError::from(e)))?;
        self.registry
            .state()
            .apply_commit(vec![PatchOp::replace(GameState::player_path(&id), value)])
            .await?;

        debug!(player = %id, tick = self.tick, "Player progressed");
        Ok(())
    }

    /// Compile and persist the leaderboard, best effort.
    async fn write_leaderboard(&self) {
        let Ok(Some(players)) = self.registry.state().get("/players").await else {
            return;
        };
        let rows = wealth::leaderboard(&players);
        let Ok(serialized) = serde_json::to_string(&rows) else {
            return;
        };
        if let Err(e) = self
            .registry
            .state()
            .secondary_put(LEADERBOARD_PATH, serialized)
            .await
        {
            warn!(error = %e, "Leaderboard write skipped");
        }
    }
}

/// Presence check straight off the stored value; entries a peer wrote
/// without a presence field count as offline, matching the hydration
/// default.
fn is_online(stored: &Value) -> bool {
    stored
        .get("presence")
        .and_then(Value::as_str)
        .is_some_and(|presence| presence == "online")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_db::MemoryStore;
    use idlewild_players::TableGenerator;
    use idlewild_types::{Presence, Profile, Signal};

    use super::*;

    /// A runner with encounters disabled so rewards are deterministic.
    async fn setup(luck: f64) -> (TickRunner, Registry, Outbox) {
        let (handle, _task) = idlewild_state::spawn(MemoryStore::new()).await;
        let registry = Registry::new(handle);
        let outbox = Outbox::new();
        let config = ProgressionConfig {
            luck,
            ..ProgressionConfig::default()
        };
        let runner = TickRunner::new(
            registry.clone(),
            outbox.clone(),
            config,
            String::from("local/users/idlewild"),
            Box::new(TableGenerator::default()),
        );
        (runner, registry, outbox)
    }

    async fn add_player(registry: &Registry, id: &str, online: bool) {
        let mut profile = Profile::default();
        profile.presence = if online {
            Presence::Online
        } else {
            Presence::Offline
        };
        registry.register_player(id, &profile).await.unwrap();
    }

    #[tokio::test]
    async fn empty_tick_completes_and_signals_once() {
        let (mut runner, _registry, outbox) = setup(0.0).await;
        let mut signals = outbox.subscribe();

        let summary = runner.run_tick().await;
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.players_processed, 0);

        assert!(matches!(signals.try_recv(), Ok(Signal::Tick(_))));
        assert!(signals.try_recv().is_err());
    }

    #[tokio::test]
    async fn online_players_earn_rewards() {
        let (mut runner, registry, _outbox) = setup(0.0).await;
        add_player(&registry, "alice", true).await;

        let summary = runner.run_tick().await;
        assert_eq!(summary.players_processed, 1);

        let (_, profile) = registry.get_profile("alice").await.unwrap();
        assert_eq!(profile.wealth, 10);
        assert_eq!(profile.experience, 10);
    }

    #[tokio::test]
    async fn offline_players_are_skipped() {
        let (mut runner, registry, _outbox) = setup(0.0).await;
        add_player(&registry, "sleeper", false).await;

        let summary = runner.run_tick().await;
        assert_eq!(summary.players_processed, 0);

        let (_, profile) = registry.get_profile("sleeper").await.unwrap();
        assert_eq!(profile.wealth, 0);
    }

    #[tokio::test]
    async fn agent_identity_is_excluded() {
        let (mut runner, registry, _outbox) = setup(0.0).await;
        add_player(&registry, "local/users/idlewild", true).await;

        let summary = runner.run_tick().await;
        assert_eq!(summary.players_processed, 0);
    }

    #[tokio::test]
    async fn cooldown_drains_and_floors_at_zero() {
        let (mut runner, registry, _outbox) = setup(0.0).await;
        let mut profile = Profile::default();
        profile.presence = Presence::Online;
        profile.cooldown = 150;
        registry.register_player("alice", &profile).await.unwrap();

        runner.run_tick().await;
        let (_, after_one) = registry.get_profile("alice").await.unwrap();
        assert_eq!(after_one.cooldown, 50);

        runner.run_tick().await;
        let (_, after_two) = registry.get_profile("alice").await.unwrap();
        assert_eq!(after_two.cooldown, 0);
    }

    #[tokio::test]
    async fn level_up_is_announced_exactly_once() {
        let (mut runner, registry, outbox) = setup(0.0).await;
        let mut signals = outbox.subscribe();

        let mut profile = Profile::default();
        profile.name = String::from("alice");
        profile.presence = Presence::Online;
        profile.experience = 95;
        registry.register_player("alice", &profile).await.unwrap();

        // 95 -> 105 crosses the level-2 threshold at 100.
        runner.run_tick().await;
        let first = signals.recv().await.unwrap();
        assert!(matches!(
            first,
            Signal::Announce { ref text } if text.contains("alice reaches level 2")
        ));
        assert!(matches!(signals.recv().await.unwrap(), Signal::Tick(_)));

        // 105 -> 115 stays inside level 2: no announcement, only the
        // tick signal.
        runner.run_tick().await;
        assert!(matches!(signals.recv().await.unwrap(), Signal::Tick(_)));
    }

    #[tokio::test]
    async fn tick_numbers_increase_monotonically() {
        let (mut runner, _registry, _outbox) = setup(0.0).await;
        for expected in 1..=5 {
            let summary = runner.run_tick().await;
            assert_eq!(summary.tick, expected);
        }
    }

    #[tokio::test]
    async fn encounters_merge_before_constants() {
        // Luck 1.0 forces an encounter every tick; whatever it is, the
        // +10/+10 constants still land on top and experience never goes
        // backwards.
        let (mut runner, registry, _outbox) = setup(1.0).await;
        add_player(&registry, "alice", true).await;

        runner.run_tick().await;
        let (_, profile) = registry.get_profile("alice").await.unwrap();
        assert!(profile.wealth >= 10);
        assert_eq!(profile.experience, 10);
    }
}
