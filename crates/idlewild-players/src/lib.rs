//! Player registry, hydration, and encounter resolution for Idlewild.
//!
//! This crate owns everything player-shaped between the state tree and
//! the engine: canonical identity handling, the hydration that turns
//! partial stored data into complete profiles, the upsert operations that
//! keep the tree canonical, probabilistic encounters, and the wealth
//! accounting used by leaderboards and conservation checks.
//!
//! # Modules
//!
//! - [`hydrate`] -- Total, idempotent defaulting of partial profiles
//! - [`registry`] -- Canonicalization and upserts over the state actor
//! - [`encounter`] -- Luck sampling, content generator contract, merges
//! - [`wealth`] -- Total-wealth audit and leaderboard rows

pub mod encounter;
pub mod hydrate;
pub mod registry;
pub mod wealth;

pub use encounter::{
    Encounter, EncounterGenerator, EncounterKind, EncounterOutcome, ItemDisposition, Resolver,
    TableGenerator,
};
pub use registry::{Registry, RegistryError};
pub use wealth::{leaderboard, total_wealth, LeaderboardRow};
