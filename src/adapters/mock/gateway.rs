//! In-memory messaging gateway and event stream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GatewayEvent, OutboundMessage, SocketParams};
use crate::domain::ports::{EventStream, EventStreamConnector, GatewayClient, StreamError};

/// Poll interval of the `wait_for_*` helpers.
const POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct GatewayState {
    sent: Vec<OutboundMessage>,
    commands: Vec<(String, String)>,
    describe_calls: usize,
    describe_failure: Option<String>,
    send_failure: Option<String>,
    command_failure: Option<String>,
}

/// Records outbound messages and command registrations.
#[derive(Debug, Default)]
pub struct MockGatewayClient {
    state: Mutex<GatewayState>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_describe(&self, message: impl Into<String>) {
        self.state().describe_failure = Some(message.into());
    }

    pub fn fail_send(&self, message: impl Into<String>) {
        self.state().send_failure = Some(message.into());
    }

    pub fn fail_commands(&self, message: impl Into<String>) {
        self.state().command_failure = Some(message.into());
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state().sent.clone()
    }

    pub fn registered_commands(&self) -> Vec<(String, String)> {
        self.state().commands.clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.state().describe_calls
    }

    /// Wait until at least `count` messages were sent or `timeout` elapses.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(POLL).await;
        }
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn describe_socket(&self, events: &[&str]) -> DomainResult<SocketParams> {
        let mut state = self.state();
        state.describe_calls += 1;
        if let Some(msg) = &state.describe_failure {
            return Err(DomainError::GatewayApi(msg.clone()));
        }
        Ok(SocketParams {
            url: format!("mock://gateway/ws?events={}", events.join(",")),
            headers: Vec::new(),
        })
    }

    async fn send_message(&self, message: &OutboundMessage) -> DomainResult<()> {
        let mut state = self.state();
        if let Some(msg) = &state.send_failure {
            return Err(DomainError::GatewayApi(msg.clone()));
        }
        state.sent.push(message.clone());
        Ok(())
    }

    async fn register_command(&self, name: &str, description: &str) -> DomainResult<()> {
        let mut state = self.state();
        if let Some(msg) = &state.command_failure {
            return Err(DomainError::GatewayApi(msg.clone()));
        }
        state.commands.push((name.to_string(), description.to_string()));
        Ok(())
    }
}

type Frame = Result<GatewayEvent, StreamError>;

#[derive(Debug, Default)]
struct ConnectorState {
    current: Option<mpsc::UnboundedSender<Frame>>,
    failures_left: usize,
}

/// Hands out channel-backed streams; the test side pushes frames into the
/// most recently opened one.
#[derive(Debug, Default)]
pub struct MockEventStreamConnector {
    state: Mutex<ConnectorState>,
    connects: AtomicUsize,
    attempts: AtomicUsize,
}

impl MockEventStreamConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `count` dial attempts.
    pub fn fail_next_connects(&self, count: usize) {
        self.state().failures_left = count;
    }

    /// Successful dials so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// All dial attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Deliver a frame on the open stream. Returns false when none is open.
    pub fn push(&self, frame: Frame) -> bool {
        self.state()
            .current
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }

    pub fn push_event(&self, event: GatewayEvent) -> bool {
        self.push(Ok(event))
    }

    /// Drop the open stream; its reader sees an unexpected disconnect.
    pub fn disconnect(&self) {
        self.state().current = None;
    }

    /// Wait until at least `count` successful dials happened.
    pub async fn wait_for_connects(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.connects() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL).await;
        }
        true
    }
}

#[async_trait]
impl EventStreamConnector for MockEventStreamConnector {
    async fn connect(&self, _params: &SocketParams) -> DomainResult<Box<dyn EventStream>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(DomainError::EventStream("dial refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.current = Some(tx);
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEventStream { rx }))
    }
}

struct MockEventStream {
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl EventStream for MockEventStream {
    async fn next_event(&mut self) -> Result<GatewayEvent, StreamError> {
        match self.rx.recv().await {
            Some(frame) => frame,
            None => Err(StreamError::Disconnected("mock stream closed".to_string())),
        }
    }
}
