//! Outbound signal publication.
//!
//! The engine talks to the outside world through one broadcast stream of
//! [`Signal`] values: announcements for every monitored channel, whispers
//! to single players, tick completions for digest jobs, and the one-time
//! ready signal. Transport adapters subscribe and fan out however their
//! backend requires; the engine never waits for them.

use tokio::sync::broadcast;
use tracing::{debug, info};

use idlewild_types::{Signal, TickReport};

/// Buffer for outbound signals; slow subscribers drop old signals.
const SIGNAL_BUFFER: usize = 256;

/// Publisher for outbound signals.
#[derive(Clone)]
pub struct Outbox {
    tx: broadcast::Sender<Signal>,
}

impl Outbox {
    /// Create an outbox with its own broadcast stream.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_BUFFER);
        Self { tx }
    }

    /// Subscribe to the signal stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }

    /// Broadcast text to every monitored channel across all services.
    pub fn announce(&self, text: impl Into<String>) {
        let text = text.into();
        info!(%text, "announce");
        let _ = self.tx.send(Signal::Announce { text });
    }

    /// Send a direct notification to one player.
    pub fn whisper(&self, target: impl Into<String>, text: impl Into<String>) {
        let target = target.into();
        let text = text.into();
        debug!(%target, %text, "whisper");
        let _ = self.tx.send(Signal::Whisper { target, text });
    }

    /// Publish a tick-complete report.
    pub fn tick(&self, report: TickReport) {
        debug!(tick = report.tick, players = report.players_processed, "tick complete");
        let _ = self.tx.send(Signal::Tick(report));
    }

    /// Publish the startup-complete signal.
    pub fn ready(&self) {
        info!("engine ready");
        let _ = self.tx.send(Signal::Ready);
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signals_reach_subscribers() {
        let outbox = Outbox::new();
        let mut rx = outbox.subscribe();

        outbox.announce("the tavern opens");
        outbox.whisper("local/users/alice", "psst");
        outbox.ready();

        assert_eq!(
            rx.recv().await.unwrap(),
            Signal::Announce {
                text: String::from("the tavern opens")
            }
        );
        assert!(matches!(rx.recv().await.unwrap(), Signal::Whisper { .. }));
        assert_eq!(rx.recv().await.unwrap(), Signal::Ready);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let outbox = Outbox::new();
        outbox.announce("nobody is listening");
    }
}
