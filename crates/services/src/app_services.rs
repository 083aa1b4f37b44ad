use std::sync::Arc;

use practice_core::Clock;
use practice_core::model::KindPolicy;

use crate::api::PracticeApi;
use crate::auth::AuthSession;
use crate::catalog_service::CatalogService;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::HttpPracticeApi;
use crate::sessions::PracticeSessionService;

/// Assembles app-facing services around one API client and one auth session.
#[derive(Clone)]
pub struct AppServices {
    auth: AuthSession,
    catalog: Arc<CatalogService>,
    sessions: Arc<PracticeSessionService>,
}

impl AppServices {
    /// Build services talking to the HTTP backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn http(config: ApiConfig, clock: Clock) -> Result<Self, ApiError> {
        let auth = AuthSession::in_memory(config.credentials());
        let policy = config.policy.clone();
        let api: Arc<dyn PracticeApi> = Arc::new(HttpPracticeApi::new(config, auth.clone())?);
        Ok(Self::with_api(api, auth, policy, clock))
    }

    /// Build services over any `PracticeApi`.
    #[must_use]
    pub fn with_api(
        api: Arc<dyn PracticeApi>,
        auth: AuthSession,
        policy: KindPolicy,
        clock: Clock,
    ) -> Self {
        Self {
            auth,
            catalog: Arc::new(CatalogService::new(Arc::clone(&api), policy.clone())),
            sessions: Arc::new(PracticeSessionService::new(api, policy, clock)),
        }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<PracticeSessionService> {
        Arc::clone(&self.sessions)
    }

    /// Drops the stored credentials and user.
    pub fn logout(&self) {
        self.auth.clear();
    }
}
