//! Canonical identities for players, channels, and users.
//!
//! Every entity in the state tree is addressed by a normalized
//! `service/kind/name` path: `irc/users/alice`, `slack/channels/tavern`.
//! Bare single-segment ids are shorthand for users on the built-in `local`
//! service and are rewritten during canonicalization. Any other shape is a
//! caller error, never silently repaired.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The service name assumed for bare single-segment ids.
pub const LOCAL_SERVICE: &str = "local";

/// Errors produced when canonicalizing a raw identity.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The raw id was empty.
    #[error("empty id")]
    Empty,

    /// The id had a shape other than one or three segments.
    #[error("malformed id `{id}`: expected `name` or `service/kind/name`")]
    Malformed {
        /// The offending raw id.
        id: String,
    },

    /// The kind segment named something other than `users` or `channels`.
    #[error("unknown entity kind `{kind}` in id `{id}`")]
    UnknownKind {
        /// The unrecognized kind segment.
        kind: String,
        /// The offending raw id.
        id: String,
    },
}

/// The kind segment of a canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A player or user identity (`service/users/name`).
    Users,
    /// A channel identity (`service/channels/name`).
    Channels,
}

impl EntityKind {
    /// The path segment this kind occupies in a canonical id.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Channels => "channels",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized `service/kind/name` identity.
///
/// Construction goes through [`CanonicalId::canonicalize`] (or the typed
/// helpers), so a value of this type is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalId {
    /// The chat backend this entity belongs to.
    pub service: String,
    /// Whether this identifies a user or a channel.
    pub kind: EntityKind,
    /// The entity name within its service and kind.
    pub name: String,
}

impl CanonicalId {
    /// Normalize a raw id.
    ///
    /// Single-segment ids are rewritten to `local/users/<id>`. Three-segment
    /// ids pass through after the kind segment is validated. Any other shape
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for an empty input, [`IdError::Malformed`]
    /// for two or more than three segments, and [`IdError::UnknownKind`] for
    /// a kind segment other than `users` or `channels`.
    pub fn canonicalize(raw: &str) -> Result<Self, IdError> {
        if raw.is_empty() {
            return Err(IdError::Empty);
        }

        let segments: Vec<&str> = raw.split('/').collect();
        match segments.as_slice() {
            [name] => Ok(Self::user(LOCAL_SERVICE, name)),
            [service, kind, name] => {
                if service.is_empty() || name.is_empty() {
                    return Err(IdError::Malformed { id: raw.to_owned() });
                }
                let kind = match *kind {
                    "users" => EntityKind::Users,
                    "channels" => EntityKind::Channels,
                    other => {
                        return Err(IdError::UnknownKind {
                            kind: other.to_owned(),
                            id: raw.to_owned(),
                        });
                    }
                };
                Ok(Self {
                    service: (*service).to_owned(),
                    kind,
                    name: (*name).to_owned(),
                })
            }
            _ => Err(IdError::Malformed { id: raw.to_owned() }),
        }
    }

    /// Build a user identity on the given service.
    pub fn user(service: &str, name: &str) -> Self {
        Self {
            service: service.to_owned(),
            kind: EntityKind::Users,
            name: name.to_owned(),
        }
    }

    /// Build a channel identity on the given service.
    pub fn channel(service: &str, name: &str) -> Self {
        Self {
            service: service.to_owned(),
            kind: EntityKind::Channels,
            name: name.to_owned(),
        }
    }

    /// Whether this id names a user.
    pub const fn is_user(&self) -> bool {
        matches!(self.kind, EntityKind::Users)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.service, self.kind, self.name)
    }
}
