/// Lifecycle Audit Events
///
/// Fire-and-forget notifications: sinks are best-effort and must never
/// fail a flow. Only login and logout are audited.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn { user_id: Uuid },
    LoggedOut { user_id: Uuid },
}

/// Outbound port for audit events.
pub trait AuthEventSink: Send + Sync {
    fn publish(&self, event: AuthEvent);
}

/// Default sink: writes events to the structured log.
pub struct TracingEventSink;

impl AuthEventSink for TracingEventSink {
    fn publish(&self, event: AuthEvent) {
        match event {
            AuthEvent::LoggedIn { user_id } => {
                tracing::info!(user_id = %user_id, "user logged in");
            }
            AuthEvent::LoggedOut { user_id } => {
                tracing::info!(user_id = %user_id, "user logged out");
            }
        }
    }
}
