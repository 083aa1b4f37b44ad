//! Boundary to the practice backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use practice_core::model::{
    QuestionId, QuestionKind, QuestionSource, RawPracticeSet, RawQuestion, UpstreamProgressEntry,
    VideoId,
};

use crate::error::ApiError;

/// Questions for one source plus whatever the server sent alongside them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBatch {
    pub questions: Vec<RawQuestion>,
    /// Server-side completion records keyed by question id.
    pub progress: HashMap<QuestionId, UpstreamProgressEntry>,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub source: QuestionSource,
    pub question_id: QuestionId,
    pub answer: String,
    /// Local verdict, forwarded so the server can store it.
    pub is_correct: bool,
}

/// Server acknowledgement of a recorded answer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Set completion after this answer, `0..=100`.
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Operations the session engine needs from the backend.
#[async_trait]
pub trait PracticeApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` for transport, status, decoding, or auth failures.
    async fn fetch_questions(&self, source: &QuestionSource) -> Result<QuestionBatch, ApiError>;

    /// Asks the backend to generate more questions of `kind` for the source.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport, status, decoding, or auth failures.
    async fn generate_questions(
        &self,
        source: &QuestionSource,
        kind: &QuestionKind,
    ) -> Result<Vec<RawQuestion>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` for transport, status, decoding, or auth failures.
    async fn submit_answer(&self, request: &SubmitRequest) -> Result<SubmitAck, ApiError>;

    /// Transcript attached to a video. Any failure reads as "no transcript".
    async fn fetch_transcript(&self, video_id: &VideoId) -> Option<Transcript>;

    /// # Errors
    ///
    /// Returns `ApiError` for transport, status, decoding, or auth failures.
    async fn fetch_practice_sets(&self) -> Result<Vec<RawPracticeSet>, ApiError>;
}

//
// ─── PAYLOADS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    List(Vec<RawQuestion>),
    Wrapped {
        #[serde(default)]
        questions: Option<Vec<RawQuestion>>,
        #[serde(default)]
        progress: Option<HashMap<QuestionId, UpstreamProgressEntry>>,
        #[serde(default)]
        transcript: Option<String>,
    },
}

impl From<QuestionsPayload> for QuestionBatch {
    fn from(payload: QuestionsPayload) -> Self {
        match payload {
            QuestionsPayload::List(questions) => Self {
                questions,
                ..Self::default()
            },
            QuestionsPayload::Wrapped {
                questions,
                progress,
                transcript,
            } => Self {
                questions: questions.unwrap_or_default(),
                progress: progress.unwrap_or_default(),
                transcript: transcript.filter(|t| !t.trim().is_empty()),
            },
        }
    }
}

/// Accepts a bare question array or an object carrying `questions` and `progress`.
///
/// # Errors
///
/// Returns `serde_json::Error` when the body matches neither shape.
pub fn parse_question_batch(body: Value) -> Result<QuestionBatch, serde_json::Error> {
    serde_json::from_value::<QuestionsPayload>(body).map(QuestionBatch::from)
}

/// Generation answers with `{"questions": [...]}` or a bare array. Anything else,
/// including an object without `questions`, yields no questions.
///
/// # Errors
///
/// Returns `serde_json::Error` when a question array is present but malformed.
pub fn parse_generated(body: Value) -> Result<Vec<RawQuestion>, serde_json::Error> {
    match body {
        Value::Array(_) => serde_json::from_value(body),
        Value::Object(mut map) => match map.remove("questions") {
            Some(list @ Value::Array(_)) => serde_json::from_value(list),
            _ => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}
