//! Rule-violation penalty handling.
//!
//! Idling is the whole game: speaking in a monitored channel costs you.
//! Every observed message puts the author on a full cooldown and halves
//! their wealth (integer truncation -- the one sanctioned way total
//! wealth leaves the world outside transfers). The public shaming only
//! fires when the pre-violation cooldown was below the announcement
//! threshold, so a player already serving a cooldown is not re-announced
//! every time they speak.

use serde_json::json;
use tracing::{debug, warn};

use idlewild_players::{Registry, RegistryError};
use idlewild_state::GameState;
use idlewild_types::{PatchOp, Profile};

use crate::outbox::Outbox;

/// Cooldown assigned on violation.
const VIOLATION_COOLDOWN: u64 = Profile::MAX_COOLDOWN;

/// Announce only when the pre-violation cooldown was below this.
const ANNOUNCE_THRESHOLD: u64 = 100;

/// Apply the message penalty to a player.
///
/// Registers the player (ensuring the replace patches resolve), then
/// commits the cooldown reset and wealth halving as one two-operation
/// batch.
///
/// # Errors
///
/// Returns [`RegistryError`] if the id is malformed or the commit fails.
pub async fn apply_penalty(
    registry: &Registry,
    outbox: &Outbox,
    raw_id: &str,
) -> Result<(), RegistryError> {
    let (id, profile) = registry.get_profile(raw_id).await?;
    let canonical = id.to_string();
    registry.register_player(&canonical, &profile).await?;

    let halved = profile.wealth / 2;
    let path = GameState::player_path(&id);

    registry
        .state()
        .apply_commit(vec![
            PatchOp::replace(format!("{path}/cooldown"), json!(VIOLATION_COOLDOWN)),
            PatchOp::replace(format!("{path}/wealth"), json!(halved)),
        ])
        .await?;

    debug!(
        player = %canonical,
        wealth_before = profile.wealth,
        wealth_after = halved,
        "penalty applied"
    );

    // Keyed on pre-violation state: players already deep in cooldown are
    // not announced again.
    if profile.cooldown < ANNOUNCE_THRESHOLD {
        let who = if profile.name.is_empty() {
            canonical.as_str()
        } else {
            profile.name.as_str()
        };
        outbox.announce(format!("{who} broke their idle and loses half their wealth!"));
    }

    Ok(())
}

/// Apply the penalty, logging instead of propagating failures.
///
/// Message handling must never take the engine down; a player we cannot
/// penalize is a warning, not an error.
pub async fn apply_penalty_logged(registry: &Registry, outbox: &Outbox, raw_id: &str) {
    if let Err(e) = apply_penalty(registry, outbox, raw_id).await {
        warn!(player = raw_id, error = %e, "penalty failed");
    }
}
