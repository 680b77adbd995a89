//! Error types for the engine binary.
//!
//! [`EngineError`] wraps the failure modes that abort startup. Per the
//! error-handling design, only two conditions are fatal: the durable
//! store cannot be opened, or the transport layer cannot start.
//! Everything else is logged and survived.

use idlewild_db::DbError;
use idlewild_state::StoreError;

use crate::config::ConfigError;
use crate::service::ServiceError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The durable store could not be opened. Fatal by design.
    #[error("durable store error: {source}")]
    Db {
        /// The underlying backend error.
        #[from]
        source: DbError,
    },

    /// The state actor failed during startup.
    #[error("state error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A transport service failed to become ready. Fatal by design.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: ServiceError,
    },
}
