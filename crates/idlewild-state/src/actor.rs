//! The state actor: a single task owning the tree and the durable store.
//!
//! Every mutation in the system -- ticks, joins, messages, transfers,
//! inbound peer patches -- is a message into this actor's queue, executed
//! one at a time to completion. That serialization is the whole
//! concurrency model: no locks, no live references into the tree, and a
//! patch-batch-plus-commit is one indivisible queue message.
//!
//! A commit is atomic end to end: the batch runs on a scratch tree, the
//! scratch is serialized and written to the durable path `/`, and only a
//! successful write makes it canonical. After each commit the actor
//! broadcasts a [`CommitNotice`] carrying the mutated paths.

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use idlewild_db::{DbError, DurableStore};
use idlewild_types::{CommitNotice, PatchOp};

use crate::apply::PatchError;
use crate::tree::GameState;

/// Durable path of the full state snapshot.
const SNAPSHOT_PATH: &str = "/";

/// Queue depth for mutation commands.
const COMMAND_BUFFER: usize = 64;

/// Buffer for commit notices; slow subscribers drop old notices.
const COMMIT_BUFFER: usize = 256;

/// Errors surfaced by state operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A patch operation in the batch failed; nothing was applied.
    #[error("patch error: {source}")]
    Patch {
        /// The underlying patch error.
        #[from]
        source: PatchError,
    },

    /// The durable write failed; the in-memory tree was not advanced.
    #[error("durable store error: {source}")]
    Durable {
        /// The underlying backend error.
        #[from]
        source: DbError,
    },

    /// Serializing the tree for commit failed.
    #[error("state serialization error: {source}")]
    Serialization {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The state actor has shut down.
    #[error("state actor is gone")]
    ActorGone,
}

/// Commands processed by the actor, one at a time.
enum Command {
    /// Read the value at a path.
    Get {
        path: String,
        reply: oneshot::Sender<Option<Value>>,
    },
    /// Apply a batch and commit it durably, as one unit.
    ApplyCommit {
        ops: Vec<PatchOp>,
        reply: oneshot::Sender<Result<Vec<String>, StoreError>>,
    },
    /// Best-effort write of a secondary view (e.g. `/leaderboard`).
    /// Failures are logged, never surfaced.
    SecondaryPut { path: String, value: String },
}

/// Cloneable handle to the state actor.
///
/// Dropping every handle shuts the actor down once its queue drains.
#[derive(Clone)]
pub struct StateHandle {
    tx: mpsc::Sender<Command>,
    commits: broadcast::Sender<CommitNotice>,
}

impl StateHandle {
    /// Read the value at a pointer path.
    ///
    /// Missing paths are `None`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorGone`] if the actor has shut down.
    pub async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Get {
                path: path.to_owned(),
                reply,
            })
            .await
            .map_err(|_| StoreError::ActorGone)?;
        rx.await.map_err(|_| StoreError::ActorGone)
    }

    /// Apply an ordered patch batch and commit it durably, as one unit.
    ///
    /// Returns the mutated paths on success. On any failure the tree and
    /// the durable snapshot are both left exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for patch, serialization, or durable-write
    /// failures, or if the actor has shut down.
    pub async fn apply_commit(&self, ops: Vec<PatchOp>) -> Result<Vec<String>, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::ApplyCommit { ops, reply })
            .await
            .map_err(|_| StoreError::ActorGone)?;
        rx.await.map_err(|_| StoreError::ActorGone)?
    }

    /// Queue a best-effort write of a secondary durable view.
    ///
    /// Never fails the caller; backend errors are logged by the actor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActorGone`] if the actor has shut down.
    pub async fn secondary_put(&self, path: &str, value: String) -> Result<(), StoreError> {
        self.tx
            .send(Command::SecondaryPut {
                path: path.to_owned(),
                value,
            })
            .await
            .map_err(|_| StoreError::ActorGone)
    }

    /// Subscribe to commit notices.
    pub fn subscribe_commits(&self) -> broadcast::Receiver<CommitNotice> {
        self.commits.subscribe()
    }
}

/// Start the state actor over the given durable store.
///
/// Restores the snapshot from the durable path `/` before accepting any
/// command: a missing or unparseable snapshot is non-fatal (the engine
/// starts fresh with a logged warning), but the read itself happens here
/// so restore is complete before the first mutation.
pub async fn spawn<S: DurableStore>(store: S) -> (StateHandle, tokio::task::JoinHandle<()>) {
    let mut state = GameState::new();
    restore(&store, &mut state).await;

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (commits, _) = broadcast::channel(COMMIT_BUFFER);

    let handle = StateHandle {
        tx,
        commits: commits.clone(),
    };

    let task = tokio::spawn(run(state, store, rx, commits));
    (handle, task)
}

/// One-time restore merge at startup.
async fn restore<S: DurableStore>(store: &S, state: &mut GameState) {
    match store.get(SNAPSHOT_PATH).await {
        Ok(Some(serialized)) => match serde_json::from_str::<Value>(&serialized) {
            Ok(snapshot) => {
                state.merge_snapshot(&snapshot);
                info!(bytes = serialized.len(), "Restored durable snapshot");
            }
            Err(e) => {
                warn!(error = %e, "Snapshot parse failed, starting with fresh state");
            }
        },
        Ok(None) => {
            info!("No durable snapshot found, starting with fresh state");
        }
        Err(e) => {
            warn!(error = %e, "Snapshot read failed, starting with fresh state");
        }
    }
}

/// The actor loop. Runs until every [`StateHandle`] is dropped.
async fn run<S: DurableStore>(
    mut state: GameState,
    store: S,
    mut rx: mpsc::Receiver<Command>,
    commits: broadcast::Sender<CommitNotice>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Get { path, reply } => {
                let value = state.get(&path).cloned();
                let _ = reply.send(value);
            }
            Command::ApplyCommit { ops, reply } => {
                let result = apply_commit(&mut state, &store, &commits, ops).await;
                let _ = reply.send(result);
            }
            Command::SecondaryPut { path, value } => {
                if let Err(e) = store.put(&path, &value).await {
                    warn!(path, error = %e, "Secondary durable write failed");
                }
            }
        }
    }
    debug!("State actor shutting down");
}

/// Apply a batch to a scratch tree, commit it, then make it canonical.
async fn apply_commit<S: DurableStore>(
    state: &mut GameState,
    store: &S,
    commits: &broadcast::Sender<CommitNotice>,
    ops: Vec<PatchOp>,
) -> Result<Vec<String>, StoreError> {
    let mut next = state.clone();
    let paths = match next.apply_batch(&ops) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(error = %e, ops = ops.len(), "Patch batch rejected");
            return Err(e.into());
        }
    };

    let serialized = next.serialize()?;
    store.put(SNAPSHOT_PATH, &serialized).await?;
    *state = next;

    debug!(paths = paths.len(), "Committed patch batch");
    let _ = commits.send(CommitNotice {
        paths: paths.clone(),
        at: Utc::now(),
    });

    Ok(paths)
}
