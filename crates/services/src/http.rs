use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use practice_core::model::{QuestionKind, QuestionSource, RawPracticeSet, RawQuestion, VideoId};

use crate::api::{
    PracticeApi, QuestionBatch, SubmitAck, SubmitRequest, Transcript, parse_generated,
    parse_question_batch,
};
use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::retry::{RetryState, RetryStep};

/// `PracticeApi` over the REST backend.
///
/// Every request carries the current access token. A `401` triggers one token
/// refresh and one replay. A rejected refresh or a second `401` clears the shared
/// credentials.
#[derive(Clone, Debug)]
pub struct HttpPracticeApi {
    client: Client,
    config: ApiConfig,
    auth: AuthSession,
}

impl HttpPracticeApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, auth: AuthSession) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            auth,
        })
    }

    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    async fn send<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut retry = RetryState::Idle;
        let response = self.attempt(&build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        // First 401: refresh once, then replay once.
        let step = retry.on_unauthorized();
        debug_assert_eq!(step, RetryStep::Refresh);
        log::debug!("access token rejected, refreshing");
        if let Err(err) = self.refresh_access().await {
            retry.refresh_failed();
            log::warn!("token refresh failed: {err}");
            self.auth.clear();
            return Err(ApiError::AuthExpired);
        }

        let replay = self.attempt(&build).await?;
        if replay.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(replay).await;
        }
        let step = retry.on_unauthorized();
        debug_assert_eq!(step, RetryStep::GiveUp);
        log::warn!("request still unauthorized after token refresh");
        self.auth.clear();
        Err(ApiError::AuthExpired)
    }

    async fn attempt<F>(&self, build: &F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut request = build(&self.client);
        if let Some(token) = self.auth.access_token() {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    async fn refresh_access(&self) -> Result<(), ApiError> {
        let refresh = self.auth.refresh_token().ok_or(ApiError::AuthExpired)?;
        let response = self
            .client
            .post(self.config.endpoint("auth/refresh/"))
            .json(&RefreshRequest { refresh })
            .send()
            .await?;
        let body: RefreshResponse = ensure_success(response).await?.json().await?;
        self.auth.replace_access(body.access)?;
        Ok(())
    }

    async fn get_json(&self, url: Url) -> Result<Value, ApiError> {
        let response = self.send(|client| client.get(url.clone())).await?;
        Ok(response.json().await?)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&self.config.endpoint(path))
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }
}

#[async_trait]
impl PracticeApi for HttpPracticeApi {
    async fn fetch_questions(&self, source: &QuestionSource) -> Result<QuestionBatch, ApiError> {
        let path = match source {
            QuestionSource::Transcript(id) => format!("transcripts/{id}/questions/"),
            QuestionSource::PracticeSet { video_id, kind } => {
                format!("practice/questions/{video_id}/{kind}/")
            }
        };
        let body = self.get_json(self.url(&path)?).await?;
        Ok(parse_question_batch(body)?)
    }

    async fn generate_questions(
        &self,
        source: &QuestionSource,
        kind: &QuestionKind,
    ) -> Result<Vec<RawQuestion>, ApiError> {
        // Practice sets are generated from the transcript of their video.
        let owner = match source {
            QuestionSource::Transcript(id) => id.as_str(),
            QuestionSource::PracticeSet { video_id, .. } => video_id.as_str(),
        };
        let mut url = self.url(&format!("transcripts/{owner}/generate_questions/"))?;
        url.query_pairs_mut().append_pair("type", kind.as_str());
        let body = self.get_json(url).await?;
        Ok(parse_generated(body)?)
    }

    async fn submit_answer(&self, request: &SubmitRequest) -> Result<SubmitAck, ApiError> {
        let (url, body) = match &request.source {
            QuestionSource::Transcript(id) => (
                self.url(&format!(
                    "transcripts/{id}/questions/{}/answer/",
                    request.question_id
                ))?,
                SubmitBody {
                    answer: &request.answer,
                    video_id: None,
                    kind: None,
                    is_correct: None,
                },
            ),
            QuestionSource::PracticeSet { video_id, kind } => (
                self.url(&format!("practice/submit/{}/", request.question_id))?,
                SubmitBody {
                    answer: &request.answer,
                    video_id: Some(video_id.as_str()),
                    kind: Some(kind.as_str()),
                    is_correct: Some(request.is_correct),
                },
            ),
        };
        let response = self
            .send(|client| client.post(url.clone()).json(&body))
            .await?;
        Ok(response.json().await?)
    }

    async fn fetch_transcript(&self, video_id: &VideoId) -> Option<Transcript> {
        let url = self.url(&format!("transcripts/{video_id}/")).ok()?;
        match self.get_json(url).await {
            Ok(body) => serde_json::from_value(body)
                .inspect_err(|err| log::warn!("transcript {video_id}: bad body: {err}"))
                .ok(),
            Err(err) => {
                log::warn!("transcript {video_id}: {err}");
                None
            }
        }
    }

    async fn fetch_practice_sets(&self) -> Result<Vec<RawPracticeSet>, ApiError> {
        let body = self.get_json(self.url("practice/sets/")?).await?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Maps non-success statuses to `ApiError::HttpStatus`, keeping the server's message.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::AuthExpired);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message);
    Err(ApiError::HttpStatus { status, message })
}

#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_correct: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error.or(self.detail).or(self.message)
    }
}
