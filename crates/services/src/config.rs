use std::env;
use std::time::Duration;

use practice_core::model::KindPolicy;

use crate::auth::Credentials;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the practice backend.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub policy: KindPolicy,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            policy: KindPolicy::default(),
            access_token: None,
            refresh_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `PRACTICE_API_URL`, `PRACTICE_DISABLED_KINDS`, `PRACTICE_ACCESS_TOKEN`,
    /// `PRACTICE_REFRESH_TOKEN` and `PRACTICE_HTTP_TIMEOUT_SECS`.
    ///
    /// Unset or blank values fall back to defaults; multiple-choice stays disabled
    /// unless `PRACTICE_DISABLED_KINDS` says otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// `from_env` over an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = var("PRACTICE_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let policy = var("PRACTICE_DISABLED_KINDS")
            .map_or_else(KindPolicy::default, |list| KindPolicy::from_disabled_list(&list));
        let timeout = var("PRACTICE_HTTP_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);

        Self {
            base_url,
            policy,
            access_token: var("PRACTICE_ACCESS_TOKEN"),
            refresh_token: var("PRACTICE_REFRESH_TOKEN"),
            timeout,
        }
    }

    /// Token pair to seed the auth session with, when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(Credentials {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }

    /// `base_url` joined with a relative endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
