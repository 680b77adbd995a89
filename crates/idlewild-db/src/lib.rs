//! Durable store contract and backends for the Idlewild game state engine.
//!
//! The engine persists the entire canonical state tree as one serialized
//! value at the durable path `/` on every commit, and reads it back once at
//! startup. Secondary paths (such as `/leaderboard`) receive best-effort
//! writes that must never fail a primary commit.
//!
//! This crate defines the [`DurableStore`] contract plus two backends:
//!
//! - [`DragonflyStore`] -- `Dragonfly`/Redis via `fred`, for production.
//! - [`MemoryStore`] -- an in-process map, for tests and local runs.

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

pub use dragonfly::DragonflyStore;
pub use error::DbError;
pub use memory::MemoryStore;
pub use store::DurableStore;
