#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth;
pub mod catalog_service;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod sessions;

pub use practice_core::Clock;

pub use api::{PracticeApi, QuestionBatch, SubmitAck, SubmitRequest, Transcript};
pub use app_services::AppServices;
pub use auth::{AuthSession, CredentialStore, Credentials, InMemoryCredentialStore, UserProfile};
pub use catalog_service::CatalogService;
pub use config::ApiConfig;
pub use error::{ApiError, AuthError};
pub use http::HttpPracticeApi;
pub use retry::{RetryState, RetryStep};
pub use sessions::{OpenedSession, PracticeSessionService};
