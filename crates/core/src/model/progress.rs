use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Completion record for one question within a set. The latest submission wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub question_id: QuestionId,
    pub submitted_answer: String,
    pub is_correct: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        submitted_answer: impl Into<String>,
        is_correct: bool,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            submitted_answer: submitted_answer.into(),
            is_correct,
            submitted_at,
        }
    }
}

/// Entry of the progress map the practice endpoint returns next to its questions.
///
/// Timestamps come from the server as naive ISO strings (no offset) or RFC 3339.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamProgressEntry {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

impl UpstreamProgressEntry {
    /// Converts to a record, using `fallback` when the timestamp is missing or unparsable.
    #[must_use]
    pub fn into_record(self, question_id: QuestionId, fallback: DateTime<Utc>) -> ProgressRecord {
        let submitted_at = self
            .submitted_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(fallback);
        ProgressRecord {
            question_id,
            submitted_answer: self.answer.unwrap_or_default(),
            is_correct: self.is_correct.unwrap_or(false),
            submitted_at,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
