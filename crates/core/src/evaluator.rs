//! Answer correctness rules.
//!
//! Multiple-choice answers are picked from the question's options, so they are
//! compared byte for byte. Everything else is typed by the learner and is compared
//! after folding case and whitespace.

use crate::error::PracticeError;
use crate::model::Question;

/// Outcome of checking one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
}

/// Decides whether `submitted` answers `question`.
///
/// # Errors
///
/// Returns `PracticeError::InvalidQuestion` if the question carries no answer.
pub fn evaluate(question: &Question, submitted: &str) -> Result<Verdict, PracticeError> {
    let expected = question
        .answer()
        .ok_or_else(|| PracticeError::InvalidQuestion(question.id().clone()))?;

    let is_correct = if question.kind().is_choice() {
        submitted == expected
    } else {
        fold_free_text(submitted) == fold_free_text(expected)
    };

    Ok(Verdict { is_correct })
}

/// Trims, collapses whitespace runs to one space and lowercases.
#[must_use]
pub fn fold_free_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
