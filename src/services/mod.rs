//! Service layer: tenant lifecycle, session supervision and reply building.

pub mod bootstrap;
pub mod command_resolver;
pub mod log_channel;
pub mod session;
pub mod session_registry;
pub mod tenant_service;

pub use bootstrap::start_active_sessions;
pub use command_resolver::{resolve, Reply};
pub use log_channel::{spawn_log_drain, LogEntry, LogSender, Severity};
pub use session::{Session, SessionExit, SessionSettings, SessionState};
pub use session_registry::{SessionChange, SessionRegistry};
pub use tenant_service::TenantService;
