use std::sync::Arc;

use usher_core::{AppConfig, EmailProvider, Error, Result, SessionLookup, Store};

/// Shared application state handed to every handler.
pub struct AppState<S: Store> {
    pub config: Arc<AppConfig>,
    pub store: Arc<S>,
    pub mailer: Option<Arc<dyn EmailProvider>>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            mailer: self.mailer.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(config: AppConfig, store: S) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            mailer: None,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn EmailProvider>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Session resolver bound to this state's config and store.
    pub fn sessions(&self) -> SessionLookup<S> {
        SessionLookup::new(self.config.clone(), self.store.clone())
    }

    /// Get the email provider, erroring if none is configured.
    pub fn mailer(&self) -> Result<&dyn EmailProvider> {
        self.mailer
            .as_deref()
            .ok_or_else(|| Error::config("No email provider configured"))
    }
}
