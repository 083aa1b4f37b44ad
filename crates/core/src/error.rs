use thiserror::Error;

use crate::model::{QuestionId, QuestionKind};

/// Failure taxonomy shared by the engine and the layers above it.
///
/// The session keeps one of these as its `Error` phase, so the type stays cheap to
/// clone and compare.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("no questions available")]
    NoQuestionsAvailable,

    #[error("{} questions are not available", .0.display_name())]
    TypeDisabled(QuestionKind),

    #[error("question {0} has no stored answer")]
    InvalidQuestion(QuestionId),

    #[error("failed to submit answer: {0}")]
    SubmissionFailed(String),

    #[error("failed to fetch questions: {0}")]
    FetchFailed(String),

    #[error("authentication expired")]
    AuthExpired,
}

impl PracticeError {
    /// Whether the learner can simply try the same action again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PracticeError::SubmissionFailed(_) | PracticeError::FetchFailed(_)
        )
    }
}
