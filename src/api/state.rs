use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::application::session::SharedSession;
use crate::application::{SessionController, SessionRegistry};
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub controller: Arc<SessionController>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(controller: SessionController, config: AppConfig) -> Self {
        let idle_ttl = Duration::from_secs(config.config.server.session_ttl_seconds);
        Self {
            sessions: SessionRegistry::new(idle_ttl),
            controller: Arc::new(controller),
            config: Arc::new(config),
        }
    }

    pub async fn session(&self, id: Uuid) -> Result<SharedSession, ApiError> {
        self.sessions
            .get(&id)
            .await
            .ok_or(ApiError::SessionNotFound(id))
    }
}
