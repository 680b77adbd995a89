//! Game state engine for Idlewild.
//!
//! This crate wires the state actor, registry, and encounter resolver
//! into the running engine: the tick scheduler that advances every
//! active player, the transfer engine, penalty handling, the inbound
//! event router, and the transport-agnostic command surface. The binary
//! in `main.rs` is a thin startup sequence over these modules; transport
//! adapters embed them the same way.
//!
//! # Modules
//!
//! - [`config`] -- `idlewild-config.yaml` loading with defaults
//! - [`service`] -- The chat-service collaborator contract and stub
//! - [`outbox`] -- Outbound signals (announce, whisper, tick, ready)
//! - [`router`] -- Inbound event dispatch
//! - [`tick`] -- The fixed-interval progression scheduler
//! - [`transfer`] -- The wealth transfer transaction engine
//! - [`penalty`] -- Rule-violation cooldown and wealth halving
//! - [`commands`] -- Text command handlers
//! - [`error`] -- Fatal startup errors

pub mod commands;
pub mod config;
pub mod error;
pub mod outbox;
pub mod penalty;
pub mod router;
pub mod service;
pub mod tick;
pub mod transfer;

pub use commands::Commands;
pub use config::EngineConfig;
pub use error::EngineError;
pub use outbox::Outbox;
pub use router::Router;
pub use service::{ChatService, ServiceError, StubService};
pub use tick::{TickRunner, TickSummary};
