//! Inbound events and outbound signals.
//!
//! Transport adapters (IRC, Slack, peers) translate their wire formats
//! into [`InboundEvent`] values and deliver them to the engine; the engine
//! publishes [`Signal`] values for adapters and digest jobs to consume.
//! Commit notices are a separate stream emitted by the state actor after
//! every durable commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patch::PatchOp;

/// A chat message observed in a monitored channel.
///
/// Fields are optional at the wire level; the transfer engine validates
/// presence of `actor` and `object` before acting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Canonical or raw id of the message author.
    #[serde(default)]
    pub actor: Option<String>,

    /// The channel or user the message was addressed to.
    #[serde(default)]
    pub target: Option<String>,

    /// The message text.
    #[serde(default)]
    pub object: Option<String>,

    /// The service the message originated from.
    #[serde(default)]
    pub origin: Option<String>,
}

/// An event delivered to the engine by a transport adapter or peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundEvent {
    /// A user joined a channel.
    Join {
        /// Raw channel id on the originating service.
        channel: String,
        /// Raw user id on the originating service.
        user: String,
    },

    /// A player left; marks them offline.
    Part {
        /// Raw or canonical id of the departing player.
        player: String,
    },

    /// A user identity became known.
    User {
        /// Raw user id on the originating service.
        id: String,
        /// Display name.
        name: String,
    },

    /// A channel identity became known.
    Channel {
        /// Raw channel id on the originating service.
        id: String,
        /// Display name.
        name: String,
    },

    /// A message was observed in a monitored channel.
    Message(ChannelMessage),

    /// A chat backend announced itself.
    Service {
        /// Unique service name.
        name: String,
    },

    /// A single state mutation from a peer.
    Patch(PatchOp),

    /// An ordered batch of state mutations from a peer.
    Patches(Vec<PatchOp>),
}

/// Summary of one completed tick, for digest jobs and adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// The tick number that completed.
    pub tick: u64,
    /// Number of active players processed this tick.
    pub players_processed: u64,
    /// Wall-clock completion time.
    pub at: DateTime<Utc>,
}

/// An outbound signal published by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Signal {
    /// Broadcast text for every monitored channel across all services.
    Announce {
        /// The text to announce.
        text: String,
    },

    /// Direct notification to a single player.
    Whisper {
        /// Canonical id of the recipient.
        target: String,
        /// The text to deliver.
        text: String,
    },

    /// A tick finished processing all active players.
    Tick(TickReport),

    /// Startup completed; the engine is accepting events.
    Ready,
}

/// Emitted by the state actor after each successful durable commit.
///
/// Carries the list of paths the committed batch mutated, so consumers
/// can react to exactly what changed without diffing the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNotice {
    /// Pointer paths written by the committed batch, in application order.
    pub paths: Vec<String>,
    /// Wall-clock commit time.
    pub at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inbound_events_tag_by_type() {
        let event = InboundEvent::Join {
            channel: String::from("#tavern"),
            user: String::from("alice"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json.get("type"), Some(&serde_json::json!("join")));
    }

    #[test]
    fn message_event_round_trips() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"type":"message","actor":"irc/users/alice","object":"!transfer 5 bob"}"#,
        )
        .unwrap();
        let msg = match event {
            InboundEvent::Message(msg) => Some(msg),
            _ => None,
        }
        .unwrap();
        assert_eq!(msg.actor.as_deref(), Some("irc/users/alice"));
        assert_eq!(msg.object.as_deref(), Some("!transfer 5 bob"));
        assert!(msg.target.is_none());
    }

    #[test]
    fn signals_tag_by_type() {
        let signal = Signal::Ready;
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json.get("type"), Some(&serde_json::json!("ready")));
    }
}
