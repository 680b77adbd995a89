//! Player, channel, and service records stored in the state tree.
//!
//! These are typed views over the JSON stored in the canonical tree. The
//! serde defaults on [`Profile`] mirror the registry's hydration defaults,
//! so deserializing a partial stored object always yields a complete
//! profile. Typed values are constructed at the seams and never held as
//! live references into the tree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Whether a player is currently reachable on its chat service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// The player is present and accrues progression each tick.
    Online,
    /// The player is away; ticks skip them.
    #[default]
    Offline,
}

/// An item a player can carry or equip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Display name of the item.
    pub name: String,
    /// Relative strength, used by narrative output only.
    #[serde(default)]
    pub power: u64,
}

/// Equipment slots on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// The equipped weapon, if any.
    #[serde(default)]
    pub weapon: Option<Item>,
}

/// A fully hydrated player profile.
///
/// Level is **not** a field here: it is derived from `experience` via
/// [`level_for_experience`] on every read.
///
/// [`level_for_experience`]: crate::level::level_for_experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name; defaults to the empty string until a `user` event
    /// supplies one.
    #[serde(default)]
    pub name: String,

    /// Hit points; no upper bound.
    #[serde(default = "default_health")]
    pub health: u64,

    /// Action resource; no upper bound.
    #[serde(default = "default_stamina")]
    pub stamina: u64,

    /// Lifetime experience. Monotonically non-decreasing.
    #[serde(default)]
    pub experience: u64,

    /// Spendable wealth. Never negative.
    #[serde(default)]
    pub wealth: u64,

    /// Equipment slots.
    #[serde(default)]
    pub equipment: Equipment,

    /// Carried items, in acquisition order. Capacity rules belong to the
    /// encounter resolver.
    #[serde(default)]
    pub inventory: Vec<Item>,

    /// Current reachability on the chat service.
    #[serde(default)]
    pub presence: Presence,

    /// Named status effects and their metadata.
    #[serde(default)]
    pub effects: BTreeMap<String, serde_json::Value>,

    /// Rule-violation cooldown, 0-1000. Decays each tick.
    #[serde(default)]
    pub cooldown: u64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            health: default_health(),
            stamina: default_stamina(),
            experience: 0,
            wealth: 0,
            equipment: Equipment::default(),
            inventory: Vec::new(),
            presence: Presence::Offline,
            effects: BTreeMap::new(),
            cooldown: 0,
        }
    }
}

impl Profile {
    /// Upper bound on the cooldown field.
    pub const MAX_COOLDOWN: u64 = 1000;

    /// Whether this profile is currently online.
    pub const fn is_online(&self) -> bool {
        matches!(self.presence, Presence::Online)
    }
}

/// A chat channel known to the engine.
///
/// Created on the first join event for the channel, never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Display name of the channel.
    #[serde(default)]
    pub name: String,

    /// Canonical ids of the players that have joined this channel.
    #[serde(default)]
    pub members: BTreeSet<String>,
}

/// Registration record for a chat backend, created once per service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Users seen on this service, keyed by raw service-local id.
    #[serde(default)]
    pub users: BTreeMap<String, serde_json::Value>,

    /// Channels seen on this service, keyed by raw service-local id.
    #[serde(default)]
    pub channels: BTreeMap<String, serde_json::Value>,
}

const fn default_health() -> u64 {
    100
}

const fn default_stamina() -> u64 {
    100
}
