//! The chat-service collaborator contract.
//!
//! Transport adapters (IRC, Slack, a local console) sit outside the
//! engine; this trait is the surface the engine needs from them: member
//! listings, presence lookups, channel joins, the adapter's own agent
//! identity, and a readiness signal awaited at startup. Calls are fallible
//! and slow by nature, so every call site wraps them in a timeout and
//! treats failure as "no data".
//!
//! [`StubService`] is the in-process implementation used by the default
//! binary and the tests, the same way the reference engine exercises its
//! tick cycle against a stub decision source before real backends exist.

use std::collections::BTreeMap;

use futures::future::{self, BoxFuture, FutureExt};

use idlewild_types::Presence;

/// Errors produced by a chat service adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The backend was unreachable or returned garbage.
    #[error("service unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The call exceeded its caller-supplied timeout.
    #[error("service call timed out")]
    Timeout,
}

/// A chat backend the engine can observe and announce through.
pub trait ChatService: Send + Sync {
    /// Unique service name (`irc`, `slack`, `local`).
    fn name(&self) -> &str;

    /// Canonical id of the adapter's own identity on this service.
    fn agent_id(&self) -> &str;

    /// List the member ids of a channel.
    fn members<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<String>, ServiceError>>;

    /// Look up a member's presence.
    fn presence<'a>(&'a self, member: &'a str) -> BoxFuture<'a, Result<Presence, ServiceError>>;

    /// Join a channel so it becomes monitored.
    fn join<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<(), ServiceError>>;

    /// Resolve once the adapter is connected and usable. Awaited during
    /// startup; failure here aborts the engine.
    fn ready(&self) -> BoxFuture<'_, Result<(), ServiceError>>;
}

/// An in-process service with a fixed member roster.
///
/// Everyone on the roster is always online and every call resolves
/// immediately, which is exactly what engine tests need.
#[derive(Debug, Clone, Default)]
pub struct StubService {
    name: String,
    agent: String,
    rosters: BTreeMap<String, Vec<String>>,
}

impl StubService {
    /// Create a stub service with the given name and agent identity.
    pub fn new(name: String, agent: String) -> Self {
        Self {
            name,
            agent,
            rosters: BTreeMap::new(),
        }
    }

    /// Add a channel roster.
    #[must_use]
    pub fn with_channel(mut self, channel: &str, members: &[&str]) -> Self {
        self.rosters.insert(
            channel.to_owned(),
            members.iter().map(|m| (*m).to_owned()).collect(),
        );
        self
    }
}

impl ChatService for StubService {
    fn name(&self) -> &str {
        &self.name
    }

    fn agent_id(&self) -> &str {
        &self.agent
    }

    fn members<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Result<Vec<String>, ServiceError>> {
        let members = self.rosters.get(channel).cloned().unwrap_or_default();
        future::ready(Ok(members)).boxed()
    }

    fn presence<'a>(&'a self, _member: &'a str) -> BoxFuture<'a, Result<Presence, ServiceError>> {
        future::ready(Ok(Presence::Online)).boxed()
    }

    fn join<'a>(&'a self, _channel: &'a str) -> BoxFuture<'a, Result<(), ServiceError>> {
        future::ready(Ok(())).boxed()
    }

    fn ready(&self) -> BoxFuture<'_, Result<(), ServiceError>> {
        future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_lists_roster_members() {
        let service = StubService::new(String::from("local"), String::from("local/users/bot"))
            .with_channel("tavern", &["alice", "bob"]);

        let members = service.members("tavern").await.unwrap();
        assert_eq!(members, vec!["alice", "bob"]);
        assert!(service.members("nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stub_is_always_ready_and_online() {
        let service = StubService::new(String::from("local"), String::from("local/users/bot"));
        service.ready().await.unwrap();
        assert_eq!(service.presence("anyone").await.unwrap(), Presence::Online);
    }
}
