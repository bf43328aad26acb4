use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::listeners::event::ListenerEvent;

/// Maximum number of events retained in the log.
pub const LOG_CAPACITY: usize = 1000;

/// Commands buffered ahead of the writer task before senders wait.
const COMMAND_QUEUE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to write listener log: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode listener log: {0}")]
    Encode(#[from] serde_json::Error),
}

enum Command {
    Append {
        ip: String,
        country: Option<String>,
        at: DateTime<Utc>,
    },
    Snapshot(oneshot::Sender<Vec<ListenerEvent>>),
}

/// Handle to the listener log.
///
/// A single writer task owns the log; every clone of this handle talks to it over
/// a channel, so concurrent appends are applied one at a time in arrival order.
/// Each append rewrites the persisted snapshot. Write failures are logged and
/// never reach the caller.
#[derive(Clone)]
pub struct ListenerRegistry {
    tx: mpsc::Sender<Command>,
}

impl ListenerRegistry {
    /// Load the log at `path` and start its writer task. Must be called from
    /// within a Tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        Self::spawn_with_capacity(path, LOG_CAPACITY)
    }

    pub fn spawn_with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let mut events: VecDeque<ListenerEvent> = load_log(&path).into();
        while events.len() > capacity {
            events.pop_front();
        }
        tracing::info!("Loaded {} listener events from {}", events.len(), path.display());

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let writer = LogWriter {
            path,
            capacity,
            events,
        };
        tokio::spawn(writer.run(rx));
        Self { tx }
    }

    /// Record a connection from `ip` made at `at`.
    ///
    /// Callers pass the connect time, not the time the append reaches the
    /// writer. The stored timestamp is raised to the newest retained one if
    /// `at` is older, so the log stays in non-decreasing order.
    pub async fn append_event(
        &self,
        ip: impl Into<String>,
        country: Option<String>,
        at: DateTime<Utc>,
    ) {
        let command = Command::Append {
            ip: ip.into(),
            country,
            at,
        };
        if self.tx.send(command).await.is_err() {
            tracing::warn!("Listener log writer has stopped; event dropped");
        }
    }

    /// Current retained events, oldest first. Empty if the writer has stopped.
    pub async fn events(&self) -> Vec<ListenerEvent> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Snapshot(reply)).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}

struct LogWriter {
    path: PathBuf,
    capacity: usize,
    events: VecDeque<ListenerEvent>,
}

impl LogWriter {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Append { ip, country, at } => {
                    self.append(ip, country, at);
                    if let Err(e) = persist(&self.path, &self.events).await {
                        tracing::warn!("{} ({})", e, self.path.display());
                    }
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.events.iter().cloned().collect());
                }
            }
        }
        tracing::debug!("Listener log writer stopped");
    }

    fn append(&mut self, ip: String, country: Option<String>, at: DateTime<Utc>) {
        let mut timestamp = at;
        if let Some(last) = self.events.back() {
            timestamp = timestamp.max(last.timestamp);
        }
        self.events.push_back(ListenerEvent::new(ip, country, timestamp));
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }
}

/// Replace the file at `path` with the full event list, via a sibling temp file
/// and a rename so readers never observe a half-written log.
async fn persist(path: &Path, events: &VecDeque<ListenerEvent>) -> Result<(), RegistryError> {
    let encoded = serde_json::to_vec(events)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, encoded).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Read a persisted log. A missing or unparsable file yields an empty log.
pub fn load_log(path: &Path) -> Vec<ListenerEvent> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No listener log at {}, starting empty", path.display());
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Cannot read listener log {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!("Ignoring unparsable listener log {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
