//! Application state

use crate::session::SessionStore;
use barangay_business::ServiceContext;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ctx: ServiceContext,
    sessions: SessionStore,
    cookie_name: Arc<str>,
}

impl AppState {
    pub fn new(ctx: ServiceContext, cookie_name: impl Into<String>) -> Self {
        Self {
            ctx,
            sessions: SessionStore::new(),
            cookie_name: Arc::from(cookie_name.into()),
        }
    }

    pub fn ctx(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}
