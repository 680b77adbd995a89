//! Wealth accounting over the player map.
//!
//! Wealth moves between profiles (transfers), enters through tick rewards
//! and monster loot, and leaves only through the rule-violation penalty.
//! The audit here sums the whole `/players` subtree so tests and digest
//! jobs can verify that nothing else creates or destroys wealth.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use idlewild_types::level_for_experience;

use crate::hydrate;

/// One row of the compiled leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Canonical id of the player.
    pub id: String,
    /// Display name, possibly empty.
    pub name: String,
    /// Derived level.
    pub level: u64,
    /// Lifetime experience.
    pub experience: u64,
    /// Current wealth.
    pub wealth: u64,
}

/// Sum of all wealth in the `/players` subtree.
///
/// Profiles are hydrated before reading, so partial peer-written entries
/// count as zero rather than poisoning the total.
pub fn total_wealth(players: &Value) -> u64 {
    let Some(map) = players.as_object() else {
        return 0;
    };
    map.values().fold(0_u64, |total, stored| {
        let profile = hydrate::typed(&hydrate::hydrate(Some(stored)));
        total.saturating_add(profile.wealth)
    })
}

/// Compile leaderboard rows from the `/players` subtree.
///
/// Ordered by experience descending, wealth descending, then canonical id
/// for a stable tail.
pub fn leaderboard(players: &Value) -> Vec<LeaderboardRow> {
    let Some(map) = players.as_object() else {
        return Vec::new();
    };

    let mut rows: Vec<LeaderboardRow> = map
        .iter()
        .map(|(id, stored)| {
            let profile = hydrate::typed(&hydrate::hydrate(Some(stored)));
            LeaderboardRow {
                id: id.clone(),
                name: profile.name,
                level: level_for_experience(profile.experience),
                experience: profile.experience,
                wealth: profile.wealth,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.experience
            .cmp(&a.experience)
            .then_with(|| b.wealth.cmp(&a.wealth))
            .then_with(|| a.id.cmp(&b.id))
    });
    rows
}
