//! The canonical state tree.
//!
//! [`GameState`] owns the single root object `{channels, players,
//! services, users}`. It is created empty at process start, optionally
//! merged once with a restored snapshot, and mutated only through
//! [`GameState::apply_batch`]. No component holds a live reference into
//! the tree; reads hand out clones at the seams.

use serde_json::{Map, Value};

use idlewild_types::{CanonicalId, PatchOp};

use crate::apply::{self, PatchError};
use crate::pointer;

/// Top-level keys of the canonical tree, in serialization order.
const ROOT_KEYS: [&str; 4] = ["channels", "players", "services", "users"];

/// The canonical world tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    root: Value,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Create the empty default tree.
    pub fn new() -> Self {
        let mut map = Map::new();
        for key in ROOT_KEYS {
            map.insert(key.to_owned(), Value::Object(Map::new()));
        }
        Self {
            root: Value::Object(map),
        }
    }

    /// Read the value at a pointer path.
    ///
    /// The root path (`/`) returns the whole tree. Missing paths are
    /// `None`, never an error.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in pointer::segments(path) {
            current = current.as_object()?.get(&segment)?;
        }
        Some(current)
    }

    /// Apply an ordered batch of operations, all or nothing.
    ///
    /// The batch runs against a scratch copy that only becomes canonical
    /// if every operation succeeds, so a failing batch leaves the tree
    /// untouched. Returns the mutated paths in application order.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatchError`] encountered.
    pub fn apply_batch(&mut self, ops: &[PatchOp]) -> Result<Vec<String>, PatchError> {
        let mut scratch = self.root.clone();
        let map = scratch.as_object_mut().ok_or(PatchError::RootTarget)?;

        for op in ops {
            apply::apply_op(map, op)?;
        }

        self.root = scratch;
        Ok(ops.iter().map(|op| op.path.clone()).collect())
    }

    /// Shallow-merge a restored snapshot over the default tree.
    ///
    /// Each top-level key of the snapshot replaces the corresponding root
    /// key. Called at most once, at startup, before any batch is applied.
    /// Non-object snapshots are ignored.
    pub fn merge_snapshot(&mut self, snapshot: &Value) {
        let Some(incoming) = snapshot.as_object() else {
            return;
        };
        if let Some(map) = self.root.as_object_mut() {
            for (key, value) in incoming {
                map.insert(key.clone(), value.clone());
            }
        }
    }

    /// Serialize the whole tree for a durable commit.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.root)
    }

    /// Pointer path of a player profile.
    pub fn player_path(id: &CanonicalId) -> String {
        format!("/players/{}", pointer::escape(&id.to_string()))
    }

    /// Pointer path of a channel record.
    pub fn channel_path(id: &CanonicalId) -> String {
        format!("/channels/{}", pointer::escape(&id.to_string()))
    }

    /// Pointer path of a user record.
    pub fn user_path(id: &CanonicalId) -> String {
        format!("/users/{}", pointer::escape(&id.to_string()))
    }

    /// Pointer path of a service registration record.
    pub fn service_path(name: &str) -> String {
        format!("/services/{}", pointer::escape(name))
    }
}
