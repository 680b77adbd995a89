//! Canonical state tree, patch application, and mutation queue for Idlewild.
//!
//! The world lives in a single JSON tree `{channels, players, services,
//! users}`, mutated only through ordered batches of pointer-addressed
//! `add`/`replace` operations and persisted in full on every commit.
//!
//! # Modules
//!
//! - [`pointer`] -- Slash-delimited pointer grammar with `~0`/`~1` escaping
//! - [`apply`] -- Patch operation semantics and errors
//! - [`tree`] -- The [`GameState`] tree: get, transactional batches, restore
//! - [`actor`] -- The state actor: one task owning tree + durable store,
//!   serializing every patch-batch-plus-commit through a queue
//!
//! # Consistency model
//!
//! Batches are transactional end to end: operations are applied to a
//! scratch copy, the scratch is serialized and written to the durable
//! store, and only then does it become the canonical in-memory tree. A
//! failure at any point -- bad op, serialization, durable write -- leaves
//! both the tree and the snapshot exactly as they were.

pub mod actor;
pub mod apply;
pub mod pointer;
pub mod tree;

pub use actor::{spawn, StateHandle, StoreError};
pub use apply::PatchError;
pub use tree::GameState;
