//! The durable store contract.
//!
//! The contract is deliberately small: serialized values keyed by pointer
//! path. The engine owns serialization; backends move opaque strings. A
//! missing path is data ("no snapshot yet"), not an error, so `get`
//! returns an `Option`.

use std::future::Future;

use crate::error::DbError;

/// A key-value backend for durable state snapshots.
///
/// Implementations are opened by their own constructors (connection
/// failure there is the engine's only fatal persistence error). The
/// returned futures must be `Send` so the state actor can run on the
/// multi-threaded runtime.
pub trait DurableStore: Send + Sync + 'static {
    /// Read the serialized value at `path`, or `None` if the path has
    /// never been written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend read fails.
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<String>, DbError>> + Send;

    /// Write the serialized value at `path`, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend write fails.
    fn put(&self, path: &str, value: &str) -> impl Future<Output = Result<(), DbError>> + Send;
}
