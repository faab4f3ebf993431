//! Session Registry
//!
//! Owns every live [`Session`], keyed by tenant client id. All map changes
//! happen inside one short critical section; no network call is made while
//! the lock is held. The registry also owns the shared log/alert fan-in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{SessionConfig, Tenant};
use crate::domain::ports::{AlertSink, ClientFactory};
use crate::infrastructure::localization::Translations;
use crate::services::log_channel::{spawn_log_drain, LogSender};
use crate::services::session::{Session, SessionExit, SessionSettings};

/// What `set_session` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// The tenant is inactive; nothing changed.
    Ignored,
    Started,
    Updated,
}

struct SessionEntry {
    session: Arc<Session>,
    handle: JoinHandle<SessionExit>,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    factory: Arc<dyn ClientFactory>,
    translations: Arc<Translations>,
    log: LogSender,
    log_task: JoinHandle<()>,
    settings: SessionSettings,
}

impl SessionRegistry {
    /// Create an empty registry and start its log drain task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        translations: Arc<Translations>,
        alert_sink: Arc<dyn AlertSink>,
        config: &SessionConfig,
    ) -> Self {
        let (log, log_task) = spawn_log_drain(config.log_channel_capacity, alert_sink);
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
            translations,
            log,
            log_task,
            settings: SessionSettings::from(config),
        }
    }

    /// Emit connection lifecycle notes from every session started later.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings = self.settings.with_debug(debug);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start or update the session of an active tenant.
    ///
    /// An existing session only gets the new snapshot and localizer; its
    /// connection and remote clients stay as they are. A session whose task
    /// already ended is replaced.
    pub fn set_session(&self, tenant: &Tenant) -> DomainResult<SessionChange> {
        if !tenant.active {
            return Ok(SessionChange::Ignored);
        }

        let localizer = self.translations.localizer(&tenant.lang);
        let mut sessions = self.lock();

        if let Some(entry) = sessions.get(&tenant.client_id) {
            if !entry.handle.is_finished() {
                entry.session.update(tenant.clone(), localizer);
                debug!(client_id = %tenant.client_id, lang = %tenant.lang, "session updated");
                return Ok(SessionChange::Updated);
            }
            warn!(client_id = %tenant.client_id, "replacing terminated session");
        }

        let clients = self.factory.build(tenant)?;
        let session = Arc::new(Session::new(
            tenant.clone(),
            localizer,
            clients,
            self.log.clone(),
            self.settings,
        ));
        let handle = tokio::spawn(Arc::clone(&session).run());
        sessions.insert(tenant.client_id.clone(), SessionEntry { session, handle });

        info!(client_id = %tenant.client_id, "session started");
        Ok(SessionChange::Started)
    }

    /// Close and forget the session of `client_id`. Returns false when none exists.
    ///
    /// The task observes the request on its own; it is detached here.
    pub fn stop_session(&self, client_id: &str) -> bool {
        let Some(entry) = self.lock().remove(client_id) else {
            return false;
        };
        entry.session.close();
        info!(client_id, "session stopped");
        true
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.lock().contains_key(client_id)
    }

    pub fn session(&self, client_id: &str) -> Option<Arc<Session>> {
        self.lock().get(client_id).map(|entry| Arc::clone(&entry.session))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Client ids with a registered session, sorted.
    pub fn client_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Stop every session and wait for the tasks to finish.
    pub async fn shutdown(&self) {
        let entries: Vec<(String, SessionEntry)> = self.lock().drain().collect();
        for (_, entry) in &entries {
            entry.session.close();
        }
        for (client_id, entry) in entries {
            match entry.handle.await {
                Ok(exit) => debug!(%client_id, ?exit, "session task finished"),
                Err(e) => warn!(%client_id, error = %e, "session task failed"),
            }
        }
        info!("all sessions stopped");
    }

    /// Whether the log drain task is still running.
    pub fn log_drain_running(&self) -> bool {
        !self.log_task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockClientFactory, RecordingAlertSink};
    use crate::services::session::SessionState;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    fn registry() -> (SessionRegistry, Arc<MockClientFactory>) {
        let factory = Arc::new(MockClientFactory::new());
        let registry = SessionRegistry::new(
            factory.clone(),
            Arc::new(Translations::embedded("en").unwrap()),
            Arc::new(RecordingAlertSink::new()),
            &SessionConfig {
                dial_backoff_ms: 10,
                ..SessionConfig::default()
            },
        );
        (registry, factory)
    }

    fn tenant(client_id: &str, active: bool) -> Tenant {
        Tenant::new(client_id, "https://shop.example.com", "key")
            .with_gateway("https://mg.example.com", "token")
            .with_active(active)
            .with_lang("en")
            .with_currency("usd")
    }

    #[tokio::test]
    async fn test_inactive_tenant_is_ignored() {
        let (registry, factory) = registry();
        assert_eq!(registry.set_session(&tenant("c1", false)).unwrap(), SessionChange::Ignored);
        assert!(registry.is_empty());
        assert!(factory.builds().is_empty());
    }

    #[tokio::test]
    async fn test_second_set_updates_without_rebuilding() {
        let (registry, factory) = registry();
        assert_eq!(registry.set_session(&tenant("c1", true)).unwrap(), SessionChange::Started);
        let connector = factory.clients_for("c1").connector;
        assert!(connector.wait_for_connects(1, WAIT).await);

        let updated = tenant("c1", true).with_lang("es").with_currency("eur");
        assert_eq!(registry.set_session(&updated).unwrap(), SessionChange::Updated);

        let session = registry.session("c1").unwrap();
        assert_eq!(session.tenant().currency, "eur");
        assert_eq!(session.localizer().lang(), "es");
        assert_eq!(factory.builds().len(), 1);
        assert_eq!(connector.connects(), 1);
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_removes_and_closes() {
        let (registry, _factory) = registry();
        registry.set_session(&tenant("c1", true)).unwrap();
        let session = registry.session("c1").unwrap();

        assert!(registry.stop_session("c1"));
        assert!(!registry.contains("c1"));
        assert!(session.is_closing());
        assert!(!registry.stop_session("c1"));
    }

    #[tokio::test]
    async fn test_stop_then_set_keeps_one_entry() {
        let (registry, factory) = registry();
        registry.set_session(&tenant("c1", true)).unwrap();
        registry.stop_session("c1");
        assert_eq!(registry.set_session(&tenant("c1", true)).unwrap(), SessionChange::Started);

        assert_eq!(registry.client_ids(), vec!["c1".to_string()]);
        assert_eq!(factory.builds().len(), 2);
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_terminated_session_is_replaced() {
        let (registry, factory) = registry();
        factory.clients_for("c1").gateway.fail_describe("bad token");
        registry.set_session(&tenant("c1", true)).unwrap();

        let session = registry.session("c1").unwrap();
        let mut state = session.subscribe();
        tokio::time::timeout(WAIT, state.wait_for(|s| *s == SessionState::Closed))
            .await
            .unwrap()
            .unwrap();
        tokio::time::timeout(WAIT, async {
            while !registry.lock().get("c1").is_some_and(|e| e.handle.is_finished()) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(registry.set_session(&tenant("c1", true)).unwrap(), SessionChange::Started);
        assert_eq!(factory.builds().len(), 2);
        assert!(registry.log_drain_running());
    }

    #[tokio::test]
    async fn test_shutdown_awaits_all_sessions() {
        let (registry, factory) = registry();
        for id in ["a", "b", "c"] {
            registry.set_session(&tenant(id, true)).unwrap();
        }
        assert_eq!(registry.len(), 3);
        assert!(factory.clients_for("b").connector.wait_for_connects(1, WAIT).await);

        tokio::time::timeout(WAIT, registry.shutdown()).await.unwrap();
        assert!(registry.is_empty());
    }
}
