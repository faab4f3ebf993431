//! Shared log/alert fan-in.
//!
//! Session tasks push [`LogEntry`] values into one bounded channel and move
//! on. A single drain task turns them into tracing events and hands error
//! entries to the [`AlertSink`] on separate tasks, so a slow sink stalls
//! neither a session nor the alerts queued behind it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::ports::AlertSink;

/// Alert deliveries allowed in flight before new alerts are dropped.
const MAX_PENDING_ALERTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One diagnostic record produced by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            tags: BTreeMap::new(),
            error: None,
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Text handed to the alert sink.
    pub fn alert_text(&self) -> String {
        match &self.error {
            Some(error) => format!("{}: {error}", self.message),
            None => self.message.clone(),
        }
    }
}

/// Producer handle of the fan-in channel. Never blocks.
#[derive(Debug, Clone)]
pub struct LogSender {
    tx: mpsc::Sender<LogEntry>,
}

impl LogSender {
    pub fn send(&self, entry: LogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(message = %entry.message, severity = %entry.severity, "log channel full, entry dropped");
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(message = %entry.message, severity = %entry.severity, "log channel closed, entry dropped");
            }
        }
    }
}

/// Sender paired with a raw receiver, for inspecting entries directly.
#[cfg(test)]
pub(crate) fn entry_channel(capacity: usize) -> (LogSender, mpsc::Receiver<LogEntry>) {
    let (tx, rx) = mpsc::channel(capacity);
    (LogSender { tx }, rx)
}

/// Create the channel and spawn its drain task.
///
/// The task ends once every [`LogSender`] is dropped.
pub fn spawn_log_drain(capacity: usize, sink: Arc<dyn AlertSink>) -> (LogSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<LogEntry>(capacity.max(1));

    let pending = Arc::new(Semaphore::new(MAX_PENDING_ALERTS));

    let handle = tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            emit(&entry);
            if entry.severity != Severity::Error {
                continue;
            }
            let Ok(permit) = Arc::clone(&pending).try_acquire_owned() else {
                tracing::warn!(message = %entry.message, "alert sink saturated, alert dropped");
                continue;
            };
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                sink.capture(&entry.alert_text(), &entry.tags).await;
                drop(permit);
            });
        }
        tracing::debug!("log channel drained");
    });

    (LogSender { tx }, handle)
}

fn emit(entry: &LogEntry) {
    let tags = &entry.tags;
    let error = entry.error.as_deref().unwrap_or_default();
    match entry.severity {
        Severity::Debug => tracing::debug!(?tags, error, "{}", entry.message),
        Severity::Info => tracing::info!(?tags, error, "{}", entry.message),
        Severity::Warn => tracing::warn!(?tags, error, "{}", entry.message),
        Severity::Error => tracing::error!(?tags, error, "{}", entry.message),
    }
}
