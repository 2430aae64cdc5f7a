use std::sync::Arc;

use chrono::Duration;

use crate::error::Error;
use crate::logger::{Logger, TracingLogger};

/// Top-level service configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Application name, used in email templates.
    pub app_name: String,

    /// Public base URL of the application (e.g. `"https://app.example.com"`).
    /// Invitation and verification links are built against it.
    pub base_url: String,

    /// Logger implementation. Defaults to a [`TracingLogger`] that delegates
    /// to the `tracing` crate.
    pub logger: Arc<dyn Logger>,

    /// Session configuration.
    pub session: SessionConfig,

    /// Invitation configuration.
    pub invitation: InvitationConfig,
}

/// Session-specific configuration.
///
/// Sessions are issued by the external auth provider; this service only
/// needs to know where to find the token and how long it is valid.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie name carrying the session token.
    pub cookie_name: String,

    /// Session lifetime, used when creating sessions on behalf of the auth
    /// provider (tests, local development).
    pub expires_in: Duration,
}

/// Invitation-specific configuration.
#[derive(Debug, Clone)]
pub struct InvitationConfig {
    /// How long an invitation stays acceptable. Re-inviting resets the
    /// clock.
    pub expires_in: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Usher".to_string(),
            base_url: "http://localhost:3000".to_string(),
            logger: Arc::new(TracingLogger),
            session: SessionConfig::default(),
            invitation: InvitationConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "usher.session-token".to_string(),
            expires_in: Duration::days(7),
        }
    }
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::days(7),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the public base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom logger implementation.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set the session cookie name.
    pub fn session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session.cookie_name = name.into();
        self
    }

    /// Set the session lifetime.
    pub fn session_expires_in(mut self, duration: Duration) -> Self {
        self.session.expires_in = duration;
        self
    }

    /// Set the invitation lifetime.
    pub fn invitation_expires_in(mut self, duration: Duration) -> Self {
        self.invitation.expires_in = duration;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.base_url.is_empty() {
            return Err(Error::config("Base URL cannot be empty"));
        }
        if self.invitation.expires_in <= Duration::zero() {
            return Err(Error::config("Invitation lifetime must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn invitations_default_to_seven_days() {
        let config = AppConfig::default();
        assert_eq!(config.invitation.expires_in, Duration::days(7));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = AppConfig::new()
            .app_name("Outline Dashboard")
            .base_url("https://outlines.example.com")
            .invitation_expires_in(Duration::days(3));
        assert_eq!(config.app_name, "Outline Dashboard");
        assert_eq!(config.base_url, "https://outlines.example.com");
        assert_eq!(config.invitation.expires_in, Duration::days(3));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = AppConfig::new().base_url("");
        assert!(config.validate().is_err());
    }
}
