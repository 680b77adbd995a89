//! Patch operation semantics.
//!
//! `add` creates intermediate objects on the way to its target and
//! overwrites whatever is there. `replace` requires the full path to
//! already resolve. Both refuse to address the tree root or traverse
//! through non-object values -- the tree is objects all the way down;
//! arrays are leaf values.

use serde_json::{Map, Value};

use idlewild_types::{PatchKind, PatchOp};

use crate::pointer;

/// Errors produced when applying a patch operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A `replace` addressed a path that does not exist.
    #[error("replace target does not exist: {path}")]
    ReplaceMissing {
        /// The offending path.
        path: String,
    },

    /// The path traverses a value that is not an object.
    #[error("path traverses a non-object value: {path}")]
    NotAnObject {
        /// The offending path.
        path: String,
    },

    /// The operation addressed the tree root, which may only change
    /// through the one-time restore merge.
    #[error("patch may not address the tree root")]
    RootTarget,

    /// The path contained an empty key segment.
    #[error("empty segment in path: {path}")]
    EmptySegment {
        /// The offending path.
        path: String,
    },
}

/// Apply one operation to the root object in place.
///
/// # Errors
///
/// Returns [`PatchError`] without modifying the tree beyond any
/// intermediate objects an `add` created before the failure; callers
/// wanting all-or-nothing semantics apply batches to a scratch copy
/// (see [`GameState::apply_batch`]).
///
/// [`GameState::apply_batch`]: crate::tree::GameState::apply_batch
pub(crate) fn apply_op(root: &mut Map<String, Value>, op: &PatchOp) -> Result<(), PatchError> {
    let segments = pointer::segments(&op.path);
    let Some((last, intermediate)) = segments.split_last() else {
        return Err(PatchError::RootTarget);
    };

    if last.is_empty() || intermediate.iter().any(|segment| segment.is_empty()) {
        return Err(PatchError::EmptySegment {
            path: op.path.clone(),
        });
    }

    let mut current = root;
    for key in intermediate {
        let next = match op.op {
            PatchKind::Add => current
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            PatchKind::Replace => {
                current
                    .get_mut(key)
                    .ok_or_else(|| PatchError::ReplaceMissing {
                        path: op.path.clone(),
                    })?
            }
        };
        current = next
            .as_object_mut()
            .ok_or_else(|| PatchError::NotAnObject {
                path: op.path.clone(),
            })?;
    }

    match op.op {
        PatchKind::Add => {
            current.insert(last.clone(), op.value.clone());
        }
        PatchKind::Replace => {
            if !current.contains_key(last) {
                return Err(PatchError::ReplaceMissing {
                    path: op.path.clone(),
                });
            }
            current.insert(last.clone(), op.value.clone());
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn root() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("players".to_owned(), json!({}));
        map
    }

    #[test]
    fn add_creates_intermediate_objects() {
        let mut map = root();
        let op = PatchOp::add("/players/a/equipment/weapon", json!({"name": "stick"}));
        apply_op(&mut map, &op).unwrap();
        assert_eq!(
            map.get("players")
                .and_then(|p| p.pointer("/a/equipment/weapon/name")),
            Some(&json!("stick"))
        );
    }

    #[test]
    fn replace_of_existing_value_succeeds() {
        let mut map = root();
        apply_op(&mut map, &PatchOp::add("/players/a", json!({"wealth": 1}))).unwrap();
        apply_op(&mut map, &PatchOp::replace("/players/a/wealth", json!(9))).unwrap();
        assert_eq!(
            map.get("players").and_then(|p| p.pointer("/a/wealth")),
            Some(&json!(9))
        );
    }

    #[test]
    fn replace_of_missing_path_fails() {
        let mut map = root();
        let err = apply_op(&mut map, &PatchOp::replace("/players/ghost/wealth", json!(1)))
            .unwrap_err();
        assert!(matches!(err, PatchError::ReplaceMissing { .. }));
    }

    #[test]
    fn escaped_segments_address_literal_keys() {
        let mut map = root();
        let op = PatchOp::add("/players/irc~1users~1alice", json!({"wealth": 5}));
        apply_op(&mut map, &op).unwrap();
        assert!(
            map.get("players")
                .and_then(Value::as_object)
                .map(|players| players.contains_key("irc/users/alice"))
                .unwrap_or(false)
        );
    }

    #[test]
    fn root_target_is_rejected() {
        let mut map = root();
        let err = apply_op(&mut map, &PatchOp::add("/", json!({}))).unwrap_err();
        assert_eq!(err, PatchError::RootTarget);
    }

    #[test]
    fn empty_segment_is_rejected() {
        let mut map = root();
        let err = apply_op(&mut map, &PatchOp::add("/players//wealth", json!(1))).unwrap_err();
        assert!(matches!(err, PatchError::EmptySegment { .. }));
    }

    #[test]
    fn traversal_through_scalar_fails() {
        let mut map = root();
        apply_op(&mut map, &PatchOp::add("/players/a", json!(42))).unwrap();
        let err =
            apply_op(&mut map, &PatchOp::add("/players/a/wealth", json!(1))).unwrap_err();
        assert!(matches!(err, PatchError::NotAnObject { .. }));
    }
}
