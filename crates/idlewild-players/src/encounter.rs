//! Encounter resolution.
//!
//! Each tick, every active player gets one uniform draw in `[0, 1)`;
//! draws below the configured luck probability produce an encounter from
//! the content generator. The generator is opaque to the engine -- richer
//! narrative catalogs plug in behind [`EncounterGenerator`] -- but a small
//! built-in table keeps the binary and the tests self-contained.
//!
//! Narrative strings are chosen deterministically by category. That is a
//! documented simplification, not an accident: randomized phrasing is
//! explicitly out of scope.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use idlewild_types::{Item, Profile};

/// Default number of items a profile can carry.
pub const DEFAULT_INVENTORY_CAPACITY: usize = 10;

/// Default probability of an encounter per player per tick.
pub const DEFAULT_LUCK: f64 = 0.05;

/// Category of a resolved encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterKind {
    /// A beneficial event merged straight onto the profile.
    Blessing,
    /// A fight that yields loot (and takes some health).
    Monster,
    /// A found item, equipped, carried, or left behind.
    Item,
}

/// What happens to a found item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Replaces the equipped weapon.
    Equipped,
    /// Appended to the inventory.
    Carried,
    /// Inventory at capacity; no mutation occurs.
    Skipped,
}

/// One encounter drawn from a content generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Encounter {
    /// A beneficial event restoring health and stamina.
    Blessing {
        /// Narrative name of the blessing.
        name: String,
        /// Health gained.
        health: u64,
        /// Stamina gained.
        stamina: u64,
    },

    /// A monster fight.
    Monster {
        /// Narrative name of the monster.
        name: String,
        /// Wealth looted from the corpse.
        loot: u64,
        /// Health lost in the fight.
        damage: u64,
    },

    /// A found item.
    Item {
        /// The item itself.
        item: Item,
        /// What the generator decided to do with it.
        disposition: ItemDisposition,
    },
}

/// The result of a successful encounter resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterOutcome {
    /// Which category fired.
    pub kind: EncounterKind,
    /// The profile with the encounter's delta merged in.
    pub profile: Profile,
    /// Ready-to-announce narrative text.
    pub narrative: String,
}

/// An opaque source of encounter content.
///
/// Implementations receive the player's snapshot so capacity and
/// equipment decisions (carry, equip, skip) can be made where the content
/// lives, and a caller-supplied random source so tests stay
/// deterministic.
pub trait EncounterGenerator: Send + Sync {
    /// Produce one encounter for the given player, or `None` if the
    /// catalog has nothing to offer.
    fn generate(&mut self, profile: &Profile, rng: &mut dyn RngCore) -> Option<Encounter>;
}

/// Luck-gated encounter resolver.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    luck: f64,
}

impl Resolver {
    /// Create a resolver with the given per-tick encounter probability.
    pub const fn new(luck: f64) -> Self {
        Self { luck }
    }

    /// Roll for an encounter and merge its delta onto the profile.
    ///
    /// Returns `None` when the luck roll misses or the generator has
    /// nothing. The input profile is never mutated; the outcome carries a
    /// merged copy.
    pub fn resolve(
        &self,
        profile: &Profile,
        generator: &mut dyn EncounterGenerator,
        rng: &mut dyn RngCore,
    ) -> Option<EncounterOutcome> {
        let roll: f64 = rng.random_range(0.0..1.0);
        if roll >= self.luck {
            return None;
        }

        let encounter = generator.generate(profile, rng)?;
        Some(merge(profile, &encounter))
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_LUCK)
    }
}

/// Apply an encounter's delta to a copy of the profile and narrate it.
fn merge(profile: &Profile, encounter: &Encounter) -> EncounterOutcome {
    let mut merged = profile.clone();
    let who = if profile.name.is_empty() {
        "A nameless wanderer"
    } else {
        profile.name.as_str()
    };

    match encounter {
        Encounter::Blessing {
            name,
            health,
            stamina,
        } => {
            merged.health = merged.health.saturating_add(*health);
            merged.stamina = merged.stamina.saturating_add(*stamina);
            EncounterOutcome {
                kind: EncounterKind::Blessing,
                profile: merged,
                narrative: format!(
                    "{who} is touched by the {name}: +{health} health, +{stamina} stamina."
                ),
            }
        }

        Encounter::Monster { name, loot, damage } => {
            merged.wealth = merged.wealth.saturating_add(*loot);
            merged.health = merged.health.saturating_sub(*damage);
            EncounterOutcome {
                kind: EncounterKind::Monster,
                profile: merged,
                narrative: format!("{who} slays a {name} and loots {loot} wealth."),
            }
        }

        Encounter::Item { item, disposition } => {
            let narrative = match disposition {
                ItemDisposition::Equipped => {
                    merged.equipment.weapon = Some(item.clone());
                    format!("{who} finds a {} and equips it.", item.name)
                }
                ItemDisposition::Carried => {
                    merged.inventory.push(item.clone());
                    format!("{who} finds a {} and stows it away.", item.name)
                }
                ItemDisposition::Skipped => {
                    format!("{who} finds a {} but has no room to carry it.", item.name)
                }
            };
            EncounterOutcome {
                kind: EncounterKind::Item,
                profile: merged,
                narrative,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in content tables
// ---------------------------------------------------------------------------

/// Blessing table: name, health gained, stamina gained.
const BLESSINGS: [(&str, u64, u64); 3] = [
    ("wayside shrine", 20, 10),
    ("traveling healer", 10, 25),
    ("harvest festival", 15, 15),
];

/// Monster table: name, loot, damage.
const MONSTERS: [(&str, u64, u64); 3] = [
    ("mud goblin", 12, 5),
    ("river troll", 30, 15),
    ("bone wraith", 45, 25),
];

/// Item table: name, power.
const ITEMS: [(&str, u64); 4] = [
    ("rusty dagger", 2),
    ("oak cudgel", 4),
    ("steel shortsword", 7),
    ("runed blade", 12),
];

/// The built-in content generator.
///
/// Picks uniformly across categories and table rows. Items are equipped
/// when they beat the current weapon's power, skipped when the inventory
/// is at capacity, and carried otherwise.
#[derive(Debug, Clone, Copy)]
pub struct TableGenerator {
    capacity: usize,
}

impl TableGenerator {
    /// Create a generator with the given inventory capacity.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for TableGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_CAPACITY)
    }
}

impl EncounterGenerator for TableGenerator {
    fn generate(&mut self, profile: &Profile, rng: &mut dyn RngCore) -> Option<Encounter> {
        match rng.random_range(0..3u8) {
            0 => {
                let idx = rng.random_range(0..BLESSINGS.len());
                let (name, health, stamina) = *BLESSINGS.get(idx)?;
                Some(Encounter::Blessing {
                    name: name.to_owned(),
                    health,
                    stamina,
                })
            }
            1 => {
                let idx = rng.random_range(0..MONSTERS.len());
                let (name, loot, damage) = *MONSTERS.get(idx)?;
                Some(Encounter::Monster {
                    name: name.to_owned(),
                    loot,
                    damage,
                })
            }
            _ => {
                let idx = rng.random_range(0..ITEMS.len());
                let (name, power) = *ITEMS.get(idx)?;
                let item = Item {
                    name: name.to_owned(),
                    power,
                };

                let current_power = profile
                    .equipment
                    .weapon
                    .as_ref()
                    .map_or(0, |weapon| weapon.power);
                let disposition = if item.power > current_power {
                    ItemDisposition::Equipped
                } else if profile.inventory.len() >= self.capacity {
                    ItemDisposition::Skipped
                } else {
                    ItemDisposition::Carried
                };

                Some(Encounter::Item { item, disposition })
            }
        }
    }
}
