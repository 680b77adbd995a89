//! Pointer-addressed mutation operations.
//!
//! A patch is an ordered batch of operations applied to the canonical
//! state tree. Operations travel over the wire (inbound `patch` /
//! `patches` events from peers), so they live in the shared types crate;
//! application semantics belong to the state store.

use serde::{Deserialize, Serialize};

/// The kind of mutation a patch operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    /// Create the value at the path, building intermediate objects as
    /// needed. Overwrites an existing value.
    Add,
    /// Overwrite the value at an existing path. Fails if the path does
    /// not resolve.
    Replace,
}

/// A single pointer-addressed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    /// What this operation does.
    pub op: PatchKind,
    /// Slash-delimited pointer to the target value. Key segments containing
    /// `/` or `~` are escaped as `~1` and `~0`.
    pub path: String,
    /// The value to write.
    pub value: serde_json::Value,
}

impl PatchOp {
    /// Build an `add` operation.
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchKind::Add,
            path: path.into(),
            value,
        }
    }

    /// Build a `replace` operation.
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchKind::Replace,
            path: path.into(),
            value,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ops_serialize_with_lowercase_kind() {
        let op = PatchOp::add("/players/x", serde_json::json!({"wealth": 1}));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json.get("op"), Some(&serde_json::json!("add")));
        assert_eq!(json.get("path"), Some(&serde_json::json!("/players/x")));
    }

    #[test]
    fn ops_deserialize_from_wire_shape() {
        let op: PatchOp = serde_json::from_str(
            r#"{"op":"replace","path":"/players/a/wealth","value":7}"#,
        )
        .unwrap();
        assert_eq!(op.op, PatchKind::Replace);
        assert_eq!(op.value, serde_json::json!(7));
    }
}
