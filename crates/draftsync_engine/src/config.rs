//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for one editing session's engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded timeout for remote calls.
    ///
    /// Transports honor this; a timeout is routed like an offline failure.
    pub remote_timeout: Duration,
    /// Quiet period after the last mutation before autosave fires.
    pub autosave_debounce: Duration,
    /// Minimum gap between user-visible failure notifications, so an
    /// extended outage produces one notification per window instead of a
    /// storm.
    pub notify_cooldown: Duration,
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            remote_timeout: Duration::from_secs(12),
            autosave_debounce: Duration::from_secs(2),
            notify_cooldown: Duration::from_secs(30),
        }
    }

    /// Sets the remote call timeout.
    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Sets the autosave debounce window.
    #[must_use]
    pub fn with_autosave_debounce(mut self, debounce: Duration) -> Self {
        self.autosave_debounce = debounce;
        self
    }

    /// Sets the failure-notification cooldown.
    #[must_use]
    pub fn with_notify_cooldown(mut self, cooldown: Duration) -> Self {
        self.notify_cooldown = cooldown;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_recommended_bands() {
        let config = EngineConfig::new();
        assert!(config.remote_timeout >= Duration::from_secs(10));
        assert!(config.remote_timeout <= Duration::from_secs(15));
        assert!(config.autosave_debounce > Duration::ZERO);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_remote_timeout(Duration::from_secs(5))
            .with_autosave_debounce(Duration::from_millis(500))
            .with_notify_cooldown(Duration::from_secs(60));

        assert_eq!(config.remote_timeout, Duration::from_secs(5));
        assert_eq!(config.autosave_debounce, Duration::from_millis(500));
        assert_eq!(config.notify_cooldown, Duration::from_secs(60));
    }
}
