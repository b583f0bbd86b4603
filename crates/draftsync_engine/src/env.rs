//! Environment providers: authentication, connectivity, and notification.
//!
//! The engine reads its surroundings through these traits so hosts can wire
//! in real session/network observers and tests can script every condition.

use draftsync_core::{Clock, OwnerId, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Reports the authentication status of the current session.
pub trait AuthProvider: Send + Sync {
    /// Returns the authenticated owner, or `None` when signed out.
    fn identity(&self) -> Option<OwnerId>;

    /// Returns true if a valid session exists.
    fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

/// Reports whether the network is currently reachable.
pub trait ConnectivityProvider: Send + Sync {
    /// Returns true if the client believes it is online.
    fn is_online(&self) -> bool;
}

/// Receives user-visible failure notifications.
///
/// Autosave failures are silent apart from the sync state and this channel;
/// the engine rate-limits calls through [`CooldownNotifier`].
pub trait FailureNotifier: Send + Sync {
    /// Delivers one failure message.
    fn notify(&self, message: &str);
}

/// The environment an engine instance runs in.
pub struct Environment {
    /// Authentication-status provider.
    pub auth: Arc<dyn AuthProvider>,
    /// Connectivity-status provider.
    pub connectivity: Arc<dyn ConnectivityProvider>,
    /// Clock used for stamps, debounce, and cooldowns.
    pub clock: Arc<dyn Clock>,
    /// Sink for rate-limited failure notifications.
    pub notifier: Arc<dyn FailureNotifier>,
}

/// A scriptable auth provider.
#[derive(Default)]
pub struct StaticAuth {
    identity: Mutex<Option<OwnerId>>,
}

impl StaticAuth {
    /// Creates a provider with no session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Creates a provider signed in as `owner`.
    #[must_use]
    pub fn signed_in(owner: OwnerId) -> Self {
        Self {
            identity: Mutex::new(Some(owner)),
        }
    }

    /// Signs in as `owner`.
    pub fn sign_in(&self, owner: OwnerId) {
        *self.identity.lock() = Some(owner);
    }

    /// Ends the session.
    pub fn sign_out(&self) {
        *self.identity.lock() = None;
    }
}

impl AuthProvider for StaticAuth {
    fn identity(&self) -> Option<OwnerId> {
        *self.identity.lock()
    }
}

/// A scriptable connectivity provider.
pub struct ToggleConnectivity {
    online: std::sync::atomic::AtomicBool,
}

impl ToggleConnectivity {
    /// Creates a provider reporting online.
    #[must_use]
    pub fn online() -> Self {
        Self {
            online: std::sync::atomic::AtomicBool::new(true),
        }
    }

    /// Creates a provider reporting offline.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            online: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Sets the reported connectivity.
    pub fn set_online(&self, online: bool) {
        self.online
            .store(online, std::sync::atomic::Ordering::SeqCst);
    }
}

impl ConnectivityProvider for ToggleConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// A notifier that logs via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl FailureNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(message, "sync failure notification");
    }
}

/// A notifier that records messages for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages delivered so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl FailureNotifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Rate-limits an inner notifier: at most one notification per cooldown
/// window, so repeated autosave failures during an outage do not storm the
/// user.
pub struct CooldownNotifier {
    inner: Arc<dyn FailureNotifier>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    last_notified: Mutex<Option<Timestamp>>,
}

impl CooldownNotifier {
    /// Wraps `inner` with the given cooldown window.
    #[must_use]
    pub fn new(inner: Arc<dyn FailureNotifier>, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            inner,
            clock,
            cooldown,
            last_notified: Mutex::new(None),
        }
    }
}

impl FailureNotifier for CooldownNotifier {
    fn notify(&self, message: &str) {
        let now = self.clock.now();
        let mut last = self.last_notified.lock();
        if let Some(previous) = *last {
            if now.saturating_since(previous) < self.cooldown {
                tracing::debug!(message, "notification suppressed during cooldown");
                return;
            }
        }
        *last = Some(now);
        self.inner.notify(message);
    }
}
