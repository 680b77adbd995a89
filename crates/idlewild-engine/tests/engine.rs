//! End-to-end tests for the Idlewild engine.
//!
//! These drive the whole stack -- router, tick scheduler, transfer
//! engine, penalty handling -- against the in-memory durable store, so
//! they run in a plain `cargo test` with no services.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]

use idlewild_db::{DurableStore, MemoryStore};
use idlewild_engine::config::ProgressionConfig;
use idlewild_engine::outbox::Outbox;
use idlewild_engine::router::Router;
use idlewild_engine::tick::TickRunner;
use idlewild_players::{wealth, Registry, TableGenerator};
use idlewild_types::{ChannelMessage, InboundEvent, Signal};

/// Build a full engine over a shared in-memory backend.
async fn setup(store: MemoryStore, luck: f64) -> (Registry, Router, TickRunner, Outbox) {
    let (state, _task) = idlewild_state::spawn(store).await;
    let registry = Registry::new(state);
    let outbox = Outbox::new();
    let router = Router::new(registry.clone(), outbox.clone());
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
    (registry, router, runner, outbox)
}

fn join(channel: &str, user: &str) -> InboundEvent {
    InboundEvent::Join {
        channel: channel.to_owned(),
        user: user.to_owned(),
    }
}

fn message(actor: &str, object: &str) -> InboundEvent {
    InboundEvent::Message(ChannelMessage {
        actor: Some(actor.to_owned()),
        target: None,
        object: Some(object.to_owned()),
        origin: None,
    })
}

async fn total_wealth(registry: &Registry) -> u64 {
    let players = registry.state().get("/players").await.unwrap().unwrap();
    wealth::total_wealth(&players)
}

#[tokio::test]
async fn joined_players_progress_each_tick() {
    let (registry, router, mut runner, _outbox) = setup(MemoryStore::new(), 0.0).await;

    router.handle(join("tavern", "alice")).await;
    router.handle(join("tavern", "bob")).await;

    let summary = runner.run_tick().await;
    assert_eq!(summary.players_processed, 2);

    for id in ["alice", "bob"] {
        let (_, profile) = registry.get_profile(id).await.unwrap();
        assert_eq!(profile.wealth, 10);
        assert_eq!(profile.experience, 10);
    }
    assert_eq!(total_wealth(&registry).await, 20);
}

#[tokio::test]
async fn transfers_conserve_total_wealth() {
    let (registry, router, mut runner, outbox) = setup(MemoryStore::new(), 0.0).await;

    router.handle(join("tavern", "alice")).await;
    router.handle(join("tavern", "bob")).await;
    for _ in 0..5 {
        runner.run_tick().await;
    }
    let before = total_wealth(&registry).await;
    assert_eq!(before, 100);

    // A whispered transfer (no channel message, so no penalty): use the
    // transfer engine directly through the command path.
    let response = idlewild_engine::transfer::handle_transfer(
        &registry,
        &outbox,
        &ChannelMessage {
            actor: Some(String::from("alice")),
            target: None,
            object: Some(String::from("!transfer 30 bob")),
            origin: None,
        },
    )
    .await;
    assert!(response.contains("transferred 30"));

    assert_eq!(total_wealth(&registry).await, before);
    let (_, alice) = registry.get_profile("alice").await.unwrap();
    let (_, bob) = registry.get_profile("bob").await.unwrap();
    assert_eq!(alice.wealth, 20);
    assert_eq!(bob.wealth, 80);
}

#[tokio::test]
async fn penalty_is_the_only_non_transfer_wealth_sink() {
    let (registry, router, mut runner, _outbox) = setup(MemoryStore::new(), 0.0).await;

    router.handle(join("tavern", "alice")).await;
    for _ in 0..10 {
        runner.run_tick().await;
    }
    assert_eq!(total_wealth(&registry).await, 100);

    // Speaking in the channel halves alice's wealth.
    router.handle(message("alice", "so... anyone here?")).await;
    assert_eq!(total_wealth(&registry).await, 50);
}

#[tokio::test]
async fn commit_then_restore_round_trips_across_engines() {
    let store = MemoryStore::new();
    {
        let (registry, router, mut runner, _outbox) = setup(store.clone(), 0.0).await;
        router.handle(join("tavern", "alice")).await;
        for _ in 0..5 {
            runner.run_tick().await;
        }
        let (_, profile) = registry.get_profile("alice").await.unwrap();
        assert_eq!(profile.wealth, 50);
    }

    // A brand-new engine over the same backend restores the world.
    let (registry, _router, _runner, _outbox) = setup(store, 0.0).await;
    let (_, profile) = registry.get_profile("alice").await.unwrap();
    assert_eq!(profile.wealth, 50);
    assert_eq!(profile.experience, 50);
}

#[tokio::test]
async fn tick_writes_the_leaderboard_view() {
    let store = MemoryStore::new();
    let (_registry, router, mut runner, _outbox) = setup(store.clone(), 0.0).await;

    router.handle(join("tavern", "alice")).await;
    runner.run_tick().await;

    let serialized = store.get("/leaderboard").await.unwrap().unwrap();
    let rows: Vec<wealth::LeaderboardRow> = serde_json::from_str(&serialized).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.first().unwrap().id, "local/users/alice");
    assert_eq!(rows.first().unwrap().wealth, 10);
}

#[tokio::test]
async fn every_tick_emits_exactly_one_completion_signal() {
    let (_registry, _router, mut runner, outbox) = setup(MemoryStore::new(), 0.0).await;
    let mut signals = outbox.subscribe();

    for expected in 1..=3u64 {
        runner.run_tick().await;
        let signal = signals.recv().await.unwrap();
        let report = match signal {
            Signal::Tick(report) => Some(report),
            _ => None,
        }
        .unwrap();
        assert_eq!(report.tick, expected);
    }
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn parted_players_stop_progressing() {
    let (registry, router, mut runner, _outbox) = setup(MemoryStore::new(), 0.0).await;

    router.handle(join("tavern", "alice")).await;
    runner.run_tick().await;
    router
        .handle(InboundEvent::Part {
            player: String::from("alice"),
        })
        .await;
    runner.run_tick().await;

    let (_, profile) = registry.get_profile("alice").await.unwrap();
    assert_eq!(profile.wealth, 10);
    assert_eq!(profile.experience, 10);
}
