//! Session lifecycle events.
//!
//! The engine itself never retains sessions across calls; the session
//! collaborator owns the current session and announces transitions on a
//! small broadcast bus. Consumers subscribe to re-run discovery or clear
//! caches when the acting principal changes.

use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use graffiti_types::Session;

use crate::config::EngineConfig;

/// A session lifecycle transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session layer finished restoring persisted state.
    Initialized,
    /// An actor logged in.
    Login { actor: String },
    /// An actor logged out.
    Logout { actor: String },
}

/// A broadcast receiver of session events.
pub type SessionEventStream = broadcast::Receiver<SessionEvent>;

/// Fan-out bus for session events.
///
/// Subscribers whose channels are closed are pruned on the next publish.
pub struct SessionEvents {
    subscribers: RwLock<Vec<broadcast::Sender<SessionEvent>>>,
    capacity: usize,
}

impl SessionEvents {
    /// Create a bus whose per-subscriber channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> SessionEventStream {
        let (tx, rx) = broadcast::channel(self.capacity);
        self.subscribers
            .write()
            .expect("session bus lock poisoned")
            .push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn publish(&self, event: SessionEvent) {
        let mut subs = self
            .subscribers
            .write()
            .expect("session bus lock poisoned");
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("session bus lock poisoned")
            .len()
    }
}

/// Holds the current session and announces transitions.
pub struct SessionManager {
    current: RwLock<Option<Session>>,
    events: SessionEvents,
}

impl SessionManager {
    /// Create a manager with no active session, sizing its event
    /// channels from the engine configuration. Emits
    /// [`SessionEvent::Initialized`] for subscribers attached before the
    /// first login.
    pub fn new(config: &EngineConfig) -> Self {
        let manager = Self {
            current: RwLock::new(None),
            events: SessionEvents::new(config.channel_capacity),
        };
        manager.events.publish(SessionEvent::Initialized);
        manager
    }

    /// Start a session for `actor`, replacing any active one.
    pub fn login(&self, actor: impl Into<String>) -> Session {
        let session = Session::new(actor);
        debug!(actor = %session.actor, "session login");
        *self.current.write().expect("session lock poisoned") = Some(session.clone());
        self.events.publish(SessionEvent::Login {
            actor: session.actor.clone(),
        });
        session
    }

    /// End the active session, if any.
    pub fn logout(&self) {
        let previous = self
            .current
            .write()
            .expect("session lock poisoned")
            .take();
        if let Some(session) = previous {
            debug!(actor = %session.actor, "session logout");
            self.events.publish(SessionEvent::Logout {
                actor: session.actor,
            });
        }
    }

    /// The active session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> SessionEventStream {
        self.events.subscribe()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_sets_current_and_broadcasts() {
        let manager = SessionManager::default();
        let mut stream = manager.subscribe();

        let session = manager.login("alice");
        assert_eq!(session.actor, "alice");
        assert_eq!(manager.current(), Some(session));
        assert_eq!(
            stream.try_recv().unwrap(),
            SessionEvent::Login {
                actor: "alice".into()
            }
        );
    }

    #[test]
    fn logout_clears_current_and_broadcasts() {
        let manager = SessionManager::default();
        manager.login("alice");
        let mut stream = manager.subscribe();

        manager.logout();
        assert_eq!(manager.current(), None);
        assert_eq!(
            stream.try_recv().unwrap(),
            SessionEvent::Logout {
                actor: "alice".into()
            }
        );
    }

    #[test]
    fn logout_without_session_emits_nothing() {
        let manager = SessionManager::default();
        let mut stream = manager.subscribe();
        manager.logout();
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn channel_capacity_comes_from_the_engine_config() {
        let mut config = EngineConfig::default();
        config.channel_capacity = 1;
        let manager = SessionManager::new(&config);
        let mut stream = manager.subscribe();

        // With capacity 1, a second publish lags an unread subscriber.
        manager.login("alice");
        manager.logout();
        assert!(matches!(
            stream.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = SessionEvents::new(8);
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        bus.publish(SessionEvent::Initialized);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn every_subscriber_sees_every_event() {
        let manager = SessionManager::default();
        let mut a = manager.subscribe();
        let mut b = manager.subscribe();

        manager.login("alice");
        manager.logout();

        for stream in [&mut a, &mut b] {
            assert!(matches!(
                stream.try_recv().unwrap(),
                SessionEvent::Login { .. }
            ));
            assert!(matches!(
                stream.try_recv().unwrap(),
                SessionEvent::Logout { .. }
            ));
        }
    }
}
