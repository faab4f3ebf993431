//! Connection Session
//!
//! One task per active tenant. The task asks the gateway for event-stream
//! parameters once, then dials, listens and redials until the session is
//! closed. Command messages are resolved against the tenant's commerce
//! backend and answered through the gateway.
//!
//! ```text
//! Connecting -> Listening -> (Reconnecting -> Connecting)* -> Closed
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify};

use crate::domain::models::{
    GatewayEvent, MessageBody, OutboundMessage, SessionConfig, SocketParams, Tenant, EVENT_MESSAGE_NEW,
};
use crate::domain::ports::{EventStream, SessionClients};
use crate::infrastructure::localization::Localizer;
use crate::services::command_resolver::{self, Reply};
use crate::services::log_channel::{LogEntry, LogSender, Severity};

/// Observable lifecycle state of a session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Listening,
    Reconnecting,
    Closed,
}

/// Why a session task returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// Stop was requested.
    Closed,
    /// Event-stream parameters could not be obtained.
    DescribeFailed,
}

/// Timing knobs of the connection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub dial_backoff: Duration,
    pub redial_backoff: Duration,
    pub read_timeout: Option<Duration>,
    /// Emit connection lifecycle notes at debug severity.
    pub debug: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            dial_backoff: config.dial_backoff(),
            redial_backoff: config.redial_backoff(),
            read_timeout: config.read_timeout(),
            debug: false,
        }
    }
}

impl SessionSettings {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    tenant: Arc<Tenant>,
    localizer: Localizer,
}

enum ListenOutcome {
    Closing,
    Disconnected,
}

pub struct Session {
    client_id: String,
    snapshot: Mutex<Snapshot>,
    clients: SessionClients,
    closing: AtomicBool,
    wake: Notify,
    state: watch::Sender<SessionState>,
    log: LogSender,
    settings: SessionSettings,
}

impl Session {
    pub fn new(
        tenant: Tenant,
        localizer: Localizer,
        clients: SessionClients,
        log: LogSender,
        settings: SessionSettings,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            client_id: tenant.client_id.clone(),
            snapshot: Mutex::new(Snapshot {
                tenant: Arc::new(tenant),
                localizer,
            }),
            clients,
            closing: AtomicBool::new(false),
            wake: Notify::new(),
            state,
            log,
            settings,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Current tenant snapshot.
    pub fn tenant(&self) -> Arc<Tenant> {
        self.snapshot().tenant
    }

    pub fn localizer(&self) -> Localizer {
        self.snapshot().localizer
    }

    /// Replace the tenant snapshot and localizer. The connection is untouched.
    pub fn update(&self, tenant: Tenant, localizer: Localizer) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Snapshot {
            tenant: Arc::new(tenant),
            localizer,
        };
    }

    /// Ask the task to stop and wake it if it is waiting.
    pub fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Drive the connection until closed or until parameters are unavailable.
    pub async fn run(self: Arc<Self>) -> SessionExit {
        self.set_state(SessionState::Connecting);

        let params = match self.clients.gateway.describe_socket(&[EVENT_MESSAGE_NEW]).await {
            Ok(params) => params,
            Err(e) => {
                self.report("failed to obtain event stream parameters", e);
                self.set_state(SessionState::Closed);
                return SessionExit::DescribeFailed;
            }
        };

        self.connection_loop(&params).await;

        self.set_state(SessionState::Closed);
        self.note(Severity::Info, "session closed");
        SessionExit::Closed
    }

    async fn connection_loop(&self, params: &SocketParams) {
        loop {
            if self.is_closing() {
                return;
            }
            self.set_state(SessionState::Connecting);
            self.trace("start ws");

            let mut stream = match self.interruptible(self.clients.connector.connect(params)).await {
                None => return,
                Some(Ok(stream)) => stream,
                Some(Err(e)) => {
                    self.report("failed to dial event stream", e);
                    if self.pause(self.settings.dial_backoff).await {
                        return;
                    }
                    continue;
                }
            };

            self.set_state(SessionState::Listening);
            self.trace("event stream open");

            match self.listen(stream.as_mut()).await {
                ListenOutcome::Closing => {
                    self.trace("stop ws");
                    return;
                }
                ListenOutcome::Disconnected => {
                    self.set_state(SessionState::Reconnecting);
                    if self.pause(self.settings.redial_backoff).await {
                        return;
                    }
                }
            }
        }
    }

    async fn listen(&self, stream: &mut dyn EventStream) -> ListenOutcome {
        loop {
            if self.is_closing() {
                return ListenOutcome::Closing;
            }

            let read = match self.settings.read_timeout {
                Some(limit) => match self.interruptible(tokio::time::timeout(limit, stream.next_event())).await {
                    None => return ListenOutcome::Closing,
                    Some(Err(_elapsed)) => continue,
                    Some(Ok(read)) => read,
                },
                None => match self.interruptible(stream.next_event()).await {
                    None => return ListenOutcome::Closing,
                    Some(read) => read,
                },
            };

            match read {
                Err(e) if e.is_disconnect() => {
                    self.report("event stream disconnected", e);
                    return ListenOutcome::Disconnected;
                }
                Err(e) => self.report("failed to read event", e),
                Ok(event) => {
                    if self.is_closing() {
                        return ListenOutcome::Closing;
                    }
                    self.handle_event(event).await;
                }
            }
        }
    }

    async fn handle_event(&self, event: GatewayEvent) {
        if event.event_type != EVENT_MESSAGE_NEW {
            return;
        }
        let data = match event.message_data() {
            Ok(data) => data,
            Err(e) => {
                self.report("failed to decode message event", e);
                return;
            }
        };
        if !data.message.is_command() {
            return;
        }

        let Snapshot { tenant, localizer } = self.snapshot();
        let reply = match command_resolver::resolve(
            &data.message.content,
            &tenant.currency,
            &localizer,
            self.clients.commerce.as_ref(),
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.report("failed to resolve command", e);
                Reply::Text(localizer.localize("incorrect_key"))
            }
        };

        let body = match reply {
            Reply::Text(content) if !content.is_empty() => MessageBody::Text { content },
            Reply::Product(product) => MessageBody::Product { product },
            Reply::Text(_) | Reply::None => return,
        };

        if self.is_closing() {
            return;
        }

        let message = OutboundMessage::private(data.message.chat_id, body);
        if let Err(e) = self.clients.gateway.send_message(&message).await {
            self.log.send(
                LogEntry::new(Severity::Warn, "failed to send reply")
                    .with_tags(self.tags())
                    .with_error(e),
            );
        }
    }

    /// Run `fut` unless a stop request arrives first.
    async fn interruptible<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.wake.notified() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep for `delay`. Returns true when the session is closing.
    async fn pause(&self, delay: Duration) -> bool {
        if !delay.is_zero() && self.interruptible(tokio::time::sleep(delay)).await.is_none() {
            return true;
        }
        self.is_closing()
    }

    /// Diagnostic tags describing the current tenant snapshot.
    pub fn tags(&self) -> BTreeMap<String, String> {
        let tenant = self.tenant();
        BTreeMap::from([
            ("crm".to_string(), tenant.catalog_url.clone()),
            ("client_id".to_string(), tenant.client_id.clone()),
            ("active".to_string(), tenant.active.to_string()),
            ("lang".to_string(), tenant.lang.clone()),
            ("currency".to_string(), tenant.currency.clone()),
            ("updated_at".to_string(), tenant.updated_at.to_rfc3339()),
        ])
    }

    fn report(&self, message: &str, error: impl std::fmt::Display) {
        self.log.send(
            LogEntry::new(Severity::Error, message)
                .with_tags(self.tags())
                .with_error(error),
        );
    }

    fn note(&self, severity: Severity, message: &str) {
        self.log.send(LogEntry::new(severity, message).with_tags(self.tags()));
    }

    fn trace(&self, message: &str) {
        if self.settings.debug {
            self.note(Severity::Debug, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockClients, MockCommerceClient, RecordingAlertSink};
    use crate::domain::models::PaymentType;
    use crate::domain::ports::StreamError;
    use crate::infrastructure::localization::Translations;
    use crate::services::log_channel::{entry_channel, spawn_log_drain};
    use serde_json::json;

    const WAIT: Duration = Duration::from_secs(2);

    struct Harness {
        session: Arc<Session>,
        mocks: MockClients,
        alerts: Arc<RecordingAlertSink>,
        translations: Arc<Translations>,
    }

    fn tenant() -> Tenant {
        Tenant::new("c1", "https://shop.example.com", "key")
            .with_gateway("https://mg.example.com", "token")
            .with_active(true)
            .with_lang("en")
            .with_currency("usd")
    }

    fn harness(mocks: MockClients, settings: SessionSettings) -> Harness {
        let translations = Arc::new(Translations::embedded("en").unwrap());
        let alerts = Arc::new(RecordingAlertSink::new());
        let (log, _drain) = spawn_log_drain(64, alerts.clone());
        let session = Arc::new(Session::new(
            tenant(),
            translations.localizer("en"),
            mocks.session_clients(),
            log,
            settings,
        ));
        Harness {
            session,
            mocks,
            alerts,
            translations,
        }
    }

    fn fast() -> SessionSettings {
        SessionSettings {
            dial_backoff: Duration::from_millis(10),
            redial_backoff: Duration::ZERO,
            read_timeout: None,
            debug: false,
        }
    }

    fn command(chat_id: u64, content: &str) -> GatewayEvent {
        serde_json::from_value(json!({
            "type": "message_new",
            "data": {"message": {"id": 1, "type": "command", "content": content, "chat_id": chat_id}}
        }))
        .unwrap()
    }

    fn payments() -> MockClients {
        MockClients {
            commerce: Arc::new(MockCommerceClient::new().with_payment_types(vec![PaymentType {
                code: "cash".to_string(),
                name: "Cash".to_string(),
                active: true,
            }])),
            ..MockClients::default()
        }
    }

    #[tokio::test]
    async fn test_command_is_answered_privately() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());

        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);
        h.mocks.connector.push_event(command(42, "/payment"));

        let sent = h.mocks.gateway.wait_for_sent(1, WAIT).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 42);
        assert_eq!(
            sent[0].body,
            MessageBody::Text {
                content: "Payment options:\n\nCash".to_string()
            }
        );

        h.session.close();
        assert_eq!(task.await.unwrap(), SessionExit::Closed);
        assert_eq!(h.session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_non_command_messages_are_ignored() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        let text: GatewayEvent = serde_json::from_value(json!({
            "type": "message_new",
            "data": {"message": {"id": 2, "type": "text", "content": "/payment", "chat_id": 1}}
        }))
        .unwrap();
        h.mocks.connector.push_event(text);
        h.mocks.connector.push_event(GatewayEvent {
            event_type: "message_updated".to_string(),
            data: json!({}),
        });
        h.mocks.connector.push_event(command(7, "/payment"));

        let sent = h.mocks.gateway.wait_for_sent(1, WAIT).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 7);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_describe_failure_is_fatal() {
        let mocks = MockClients::default();
        mocks.gateway.fail_describe("token revoked");
        let h = harness(mocks, fast());

        let exit = Arc::clone(&h.session).run().await;

        assert_eq!(exit, SessionExit::DescribeFailed);
        assert_eq!(h.mocks.connector.attempts(), 0);
        let alerts = h.alerts.wait_for(1, WAIT).await;
        assert!(alerts[0].0.contains("token revoked"));
        assert_eq!(alerts[0].1["crm"], "https://shop.example.com");
    }

    #[tokio::test]
    async fn test_dial_failures_back_off_and_retry() {
        let mocks = MockClients::default();
        mocks.connector.fail_next_connects(2);
        let h = harness(mocks, fast());
        let task = tokio::spawn(h.session.clone().run());

        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);
        assert_eq!(h.mocks.connector.attempts(), 3);
        assert_eq!(h.mocks.gateway.describe_calls(), 1);
        assert_eq!(h.alerts.wait_for(2, WAIT).await.len(), 2);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_redials_with_same_parameters() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.disconnect();
        assert!(h.mocks.connector.wait_for_connects(2, WAIT).await);
        assert_eq!(h.mocks.gateway.describe_calls(), 1);

        h.mocks.connector.push_event(command(3, "/payment"));
        assert_eq!(h.mocks.gateway.wait_for_sent(1, WAIT).await.len(), 1);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_decode_error_keeps_socket() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.push(Err(StreamError::Decode("bad frame".to_string())));
        h.mocks.connector.push_event(command(3, "/payment"));

        assert_eq!(h.mocks.gateway.wait_for_sent(1, WAIT).await.len(), 1);
        assert_eq!(h.mocks.connector.connects(), 1);
        assert_eq!(h.alerts.wait_for(1, WAIT).await.len(), 1);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_message_event_is_reported() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.push_event(GatewayEvent {
            event_type: EVENT_MESSAGE_NEW.to_string(),
            data: json!({"message": {"type": "command", "content": "/payment"}}),
        });
        h.mocks.connector.push_event(command(4, "/payment"));

        let sent = h.mocks.gateway.wait_for_sent(1, WAIT).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 4);
        let alerts = h.alerts.wait_for(1, WAIT).await;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].0.starts_with("failed to decode message event"));

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_during_resolve_suppresses_reply() {
        let gate = Arc::new(Notify::new());
        let mocks = payments();
        mocks.commerce.block_on(gate.clone());
        let h = harness(mocks, fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.push_event(command(8, "/payment"));
        assert!(h.mocks.commerce.wait_for_reference_calls(1, WAIT).await);

        h.session.close();
        gate.notify_one();

        assert_eq!(tokio::time::timeout(WAIT, task).await.unwrap().unwrap(), SessionExit::Closed);
        assert!(h.mocks.gateway.sent().is_empty());
    }

    async fn lifecycle_notes(debug: bool) -> Vec<String> {
        let mocks = MockClients::default();
        let translations = Arc::new(Translations::embedded("en").unwrap());
        let (log, mut entries) = entry_channel(64);
        let session = Arc::new(Session::new(
            tenant(),
            translations.localizer("en"),
            mocks.session_clients(),
            log,
            fast().with_debug(debug),
        ));
        let task = tokio::spawn(session.clone().run());
        assert!(mocks.connector.wait_for_connects(1, WAIT).await);
        session.close();
        assert_eq!(tokio::time::timeout(WAIT, task).await.unwrap().unwrap(), SessionExit::Closed);
        drop(session);

        let mut notes = Vec::new();
        while let Ok(entry) = entries.try_recv() {
            if entry.severity == Severity::Debug {
                notes.push(entry.message);
            }
        }
        notes
    }

    #[tokio::test]
    async fn test_debug_settings_emit_lifecycle_notes() {
        assert_eq!(
            lifecycle_notes(true).await,
            vec!["start ws".to_string(), "event stream open".to_string(), "stop ws".to_string()]
        );
        assert!(lifecycle_notes(false).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_error_sends_fallback_reply() {
        let mocks = MockClients::default();
        mocks.commerce.fail_with("Wrong apiKey value");
        let h = harness(mocks, fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.push_event(command(9, "/delivery"));

        let sent = h.mocks.gateway.wait_for_sent(1, WAIT).await;
        assert_eq!(
            sent[0].body,
            MessageBody::Text {
                content: "Invalid command".to_string()
            }
        );
        assert_eq!(h.alerts.wait_for(1, WAIT).await.len(), 1);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_the_loop() {
        let h = harness(payments(), fast());
        h.mocks.gateway.fail_send("gateway down");
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        h.mocks.connector.push_event(command(1, "/payment"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(h.session.state(), SessionState::Listening);
        assert!(h.alerts.alerts().is_empty());

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_swaps_snapshot_without_redial() {
        let h = harness(payments(), fast());
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        let updated = tenant().with_lang("ru").with_currency("rub");
        h.session.update(updated, h.translations.localizer("ru"));
        h.mocks.connector.push_event(command(5, "/product"));

        let sent = h.mocks.gateway.wait_for_sent(1, WAIT).await;
        let expected = h.translations.localizer("ru").localize("set_name_or_article");
        assert_eq!(sent[0].body, MessageBody::Text { content: expected });
        assert_eq!(h.session.tenant().currency, "rub");
        assert_eq!(h.mocks.connector.connects(), 1);

        h.session.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_interrupts_backoff() {
        let mocks = MockClients::default();
        mocks.connector.fail_next_connects(usize::MAX);
        let settings = SessionSettings {
            dial_backoff: Duration::from_secs(3600),
            ..fast()
        };
        let h = harness(mocks, settings);
        let task = tokio::spawn(h.session.clone().run());

        tokio::time::timeout(WAIT, async {
            while h.mocks.connector.attempts() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        h.session.close();

        let exit = tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
        assert_eq!(exit, SessionExit::Closed);
    }

    #[tokio::test]
    async fn test_read_timeout_lets_closing_be_observed() {
        let settings = SessionSettings {
            read_timeout: Some(Duration::from_millis(20)),
            ..fast()
        };
        let h = harness(MockClients::default(), settings);
        let task = tokio::spawn(h.session.clone().run());
        assert!(h.mocks.connector.wait_for_connects(1, WAIT).await);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(h.mocks.connector.connects(), 1, "timeouts do not redial");

        h.session.close();
        assert_eq!(tokio::time::timeout(WAIT, task).await.unwrap().unwrap(), SessionExit::Closed);
    }
}
