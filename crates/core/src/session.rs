use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::PracticeError;
use crate::evaluator::{Verdict, evaluate};
use crate::model::{
    KindPolicy, Question, QuestionId, QuestionKind, QuestionSource, RawQuestion, normalize,
};

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where the session stands with respect to its current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Questions have not arrived yet.
    Loading,
    /// Current question is waiting for an answer.
    Ready,
    /// An answer for the current question is in flight.
    Answering,
    /// The current question has been scored and is waiting for `advance`.
    Feedback { is_correct: bool },
    /// Moved past the last question.
    Complete,
    Error(PracticeError),
}

/// Verdict shown to the learner after a scored submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    /// Disclosed only for incorrect answers.
    pub correct_answer: Option<String>,
}

impl Feedback {
    #[must_use]
    pub fn message(&self) -> String {
        if self.is_correct {
            return "Correct!".to_string();
        }
        match &self.correct_answer {
            Some(answer) => format!("Incorrect. The correct answer is: {answer}"),
            None => "Incorrect. Try again!".to_string(),
        }
    }
}

/// Why a submit call did nothing. None of these change score or feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    AlreadyAnswered,
    InFlight,
    EmptyAnswer,
    UnknownQuestion,
    NotAnswerable,
    /// The result belongs to a session state that was reset or reloaded.
    Stale,
}

/// Answer that has been evaluated locally and is waiting on the remote record.
///
/// Not `Clone`: each pending submission settles exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingSubmission {
    epoch: u64,
    question_id: QuestionId,
    answer: String,
    verdict: Verdict,
}

impl PendingSubmission {
    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.verdict.is_correct
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BeginSubmit {
    Pending(PendingSubmission),
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(Feedback),
    Ignored(IgnoredReason),
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Learner-facing projection of one question. `answer` stays hidden until the
/// question has feedback or answers are revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView<'a> {
    pub id: &'a QuestionId,
    pub text: &'a str,
    pub kind: &'a QuestionKind,
    pub options: &'a [String],
    /// 1-based.
    pub position: usize,
    pub total: usize,
    pub answer: Option<&'a str>,
    pub submitted: Option<&'a str>,
    pub feedback: Option<&'a Feedback>,
    pub in_flight: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory question/answer run for one source.
///
/// Owns the ordered questions, the cursor, per-question answers and feedback and
/// the score. Scored history is keyed by question id, so it survives navigation.
pub struct PracticeSession {
    source: QuestionSource,
    requested_kind: QuestionKind,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, String>,
    feedback: HashMap<QuestionId, Feedback>,
    in_flight: HashSet<QuestionId>,
    score: u32,
    loaded: bool,
    error: Option<PracticeError>,
    epoch: u64,
    reveal_answers: bool,
    last_failure: Option<(QuestionId, PracticeError)>,
}

impl PracticeSession {
    /// Opens a session in `Loading`, or in `Error(TypeDisabled)` when the source is
    /// pinned to a kind the policy switches off.
    #[must_use]
    pub fn open(source: QuestionSource, policy: &KindPolicy) -> Self {
        let requested_kind = source
            .fixed_kind()
            .cloned()
            .unwrap_or(QuestionKind::Novice);
        let error = (!policy.is_enabled(&requested_kind))
            .then(|| PracticeError::TypeDisabled(requested_kind.clone()));

        Self {
            source,
            requested_kind,
            questions: Vec::new(),
            current: 0,
            answers: HashMap::new(),
            feedback: HashMap::new(),
            in_flight: HashSet::new(),
            score: 0,
            loaded: false,
            error,
            epoch: 0,
            reveal_answers: false,
            last_failure: None,
        }
    }

    #[must_use]
    pub fn source(&self) -> &QuestionSource {
        &self.source
    }

    /// Kind used when upstream records omit theirs.
    #[must_use]
    pub fn requested_kind(&self) -> &QuestionKind {
        &self.requested_kind
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        format!("Score: {}/{}", self.score, self.questions.len())
    }

    #[must_use]
    pub fn submitted_answer(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn feedback_for(&self, id: &QuestionId) -> Option<&Feedback> {
        self.feedback.get(id)
    }

    #[must_use]
    pub fn is_in_flight(&self, id: &QuestionId) -> bool {
        self.in_flight.contains(id)
    }

    /// Most recent failed submission, cleared once that question is scored.
    #[must_use]
    pub fn last_failure(&self) -> Option<&(QuestionId, PracticeError)> {
        self.last_failure.as_ref()
    }

    #[must_use]
    pub fn answers_revealed(&self) -> bool {
        self.reveal_answers
    }

    pub fn reveal_answers(&mut self, reveal: bool) {
        self.reveal_answers = reveal;
    }

    /// False once the session hit an error that rules out further network calls.
    #[must_use]
    pub fn accepts_network(&self) -> bool {
        !matches!(
            self.error,
            Some(PracticeError::TypeDisabled(_) | PracticeError::AuthExpired)
        )
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if let Some(error) = &self.error {
            return SessionPhase::Error(error.clone());
        }
        if !self.loaded {
            return SessionPhase::Loading;
        }
        let Some(question) = self.questions.get(self.current) else {
            return SessionPhase::Complete;
        };
        if self.in_flight.contains(question.id()) {
            return SessionPhase::Answering;
        }
        match self.feedback.get(question.id()) {
            Some(feedback) => SessionPhase::Feedback {
                is_correct: feedback.is_correct,
            },
            None => SessionPhase::Ready,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase() == SessionPhase::Complete
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.feedback.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn view(&self, id: &QuestionId) -> Option<QuestionView<'_>> {
        let position = self.questions.iter().position(|q| q.id() == id)?;
        Some(self.view_at(position))
    }

    #[must_use]
    pub fn current_view(&self) -> Option<QuestionView<'_>> {
        (self.current < self.questions.len()).then(|| self.view_at(self.current))
    }

    fn view_at(&self, index: usize) -> QuestionView<'_> {
        let question = &self.questions[index];
        let feedback = self.feedback.get(question.id());
        let answer = if self.reveal_answers || feedback.is_some() {
            question.answer()
        } else {
            None
        };
        QuestionView {
            id: question.id(),
            text: question.text(),
            kind: question.kind(),
            options: question.options(),
            position: index + 1,
            total: self.questions.len(),
            answer,
            submitted: self.submitted_answer(question.id()),
            feedback,
            in_flight: self.in_flight.contains(question.id()),
        }
    }

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    /// Replaces the question list and starts over at the first question.
    ///
    /// An empty list leaves the session in `Error(NoQuestionsAvailable)`. Ignored
    /// once the session is halted by `TypeDisabled` or `AuthExpired`.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        if !self.accepts_network() {
            log::debug!("{}: load ignored, session halted", self.source);
            return;
        }

        self.questions.clear();
        self.clear_progress();
        self.current = 0;
        self.loaded = true;
        for question in questions {
            self.push_unique(question);
        }
        self.error = self
            .questions
            .is_empty()
            .then_some(PracticeError::NoQuestionsAvailable);
    }

    /// Normalizes upstream records with the session's requested kind, then loads them.
    pub fn load_raw(&mut self, raw: Vec<RawQuestion>) {
        let kind = self.requested_kind.clone();
        self.load_questions(raw.into_iter().map(|r| normalize(r, &kind)).collect());
    }

    /// Records that fetching the initial questions failed.
    pub fn fail_load(&mut self, error: PracticeError) {
        if self.accepts_network() {
            self.error = Some(error);
        }
    }

    /// Halts the session after the credentials could not be refreshed.
    pub fn expire_auth(&mut self) {
        self.in_flight.clear();
        self.error = Some(PracticeError::AuthExpired);
    }

    /// Appends freshly generated questions behind the existing ones.
    ///
    /// Cursor, score and feedback are untouched. Returns how many questions were
    /// added; duplicates of already loaded ids are skipped.
    pub fn append_generated(&mut self, raw: Vec<RawQuestion>, kind: &QuestionKind) -> usize {
        if !self.accepts_network() || (!self.loaded && self.error.is_none()) {
            return 0;
        }

        let before = self.questions.len();
        for record in raw {
            self.push_unique(normalize(record, kind));
        }
        let added = self.questions.len() - before;

        if added > 0 && self.error.as_ref().is_some_and(PracticeError::is_recoverable_by_append) {
            self.error = None;
            self.loaded = true;
        }
        added
    }

    fn push_unique(&mut self, mut question: Question) {
        if question.id().is_empty() {
            let mut n = self.questions.len() + 1;
            let id = loop {
                let candidate = QuestionId::new(format!("local-{n}"));
                if !self.questions.iter().any(|q| q.id() == &candidate) {
                    break candidate;
                }
                n += 1;
            };
            question.set_id(id);
        }
        if self.questions.iter().any(|q| q.id() == question.id()) {
            log::warn!("{}: dropping duplicate question id {}", self.source, question.id());
            return;
        }
        self.questions.push(question);
    }

    fn clear_progress(&mut self) {
        self.answers.clear();
        self.feedback.clear();
        self.in_flight.clear();
        self.score = 0;
        self.epoch += 1;
        self.last_failure = None;
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Evaluates and scores an answer in one step.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidQuestion` if the question has no stored answer.
    pub fn submit(
        &mut self,
        question_id: &QuestionId,
        answer: &str,
    ) -> Result<SubmitOutcome, PracticeError> {
        match self.begin_submit(question_id, answer)? {
            BeginSubmit::Pending(pending) => Ok(self.complete_submit(pending)),
            BeginSubmit::Ignored(reason) => Ok(SubmitOutcome::Ignored(reason)),
        }
    }

    /// First half of a submission: evaluates the answer and marks the question in
    /// flight while the caller records it remotely.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidQuestion` if the question has no stored answer.
    pub fn begin_submit(
        &mut self,
        question_id: &QuestionId,
        answer: &str,
    ) -> Result<BeginSubmit, PracticeError> {
        if self.error.is_some() || !self.loaded {
            return Ok(BeginSubmit::Ignored(IgnoredReason::NotAnswerable));
        }
        if answer.trim().is_empty() {
            return Ok(BeginSubmit::Ignored(IgnoredReason::EmptyAnswer));
        }
        let Some(question) = self.questions.iter().find(|q| q.id() == question_id) else {
            return Ok(BeginSubmit::Ignored(IgnoredReason::UnknownQuestion));
        };
        if self.feedback.contains_key(question_id) {
            return Ok(BeginSubmit::Ignored(IgnoredReason::AlreadyAnswered));
        }
        if self.in_flight.contains(question_id) {
            return Ok(BeginSubmit::Ignored(IgnoredReason::InFlight));
        }

        let verdict = evaluate(question, answer)?;
        self.in_flight.insert(question_id.clone());
        self.answers.insert(question_id.clone(), answer.to_string());

        Ok(BeginSubmit::Pending(PendingSubmission {
            epoch: self.epoch,
            question_id: question_id.clone(),
            answer: answer.to_string(),
            verdict,
        }))
    }

    /// Second half of a submission: applies feedback and score.
    ///
    /// Ignored as stale unless the question is still in flight for this epoch.
    /// A correct answer to the current question advances the cursor.
    pub fn complete_submit(&mut self, pending: PendingSubmission) -> SubmitOutcome {
        if pending.epoch != self.epoch {
            return SubmitOutcome::Ignored(IgnoredReason::Stale);
        }
        if !self.in_flight.remove(&pending.question_id) {
            return SubmitOutcome::Ignored(IgnoredReason::Stale);
        }
        if self.feedback.contains_key(&pending.question_id) {
            return SubmitOutcome::Ignored(IgnoredReason::AlreadyAnswered);
        }

        let is_correct = pending.verdict.is_correct;
        let correct_answer = if is_correct {
            None
        } else {
            self.questions
                .iter()
                .find(|q| q.id() == &pending.question_id)
                .and_then(Question::answer)
                .map(str::to_owned)
        };
        let feedback = Feedback {
            is_correct,
            correct_answer,
        };
        self.feedback
            .insert(pending.question_id.clone(), feedback.clone());

        if self
            .last_failure
            .as_ref()
            .is_some_and(|(id, _)| id == &pending.question_id)
        {
            self.last_failure = None;
        }

        if is_correct {
            self.score += 1;
            let answered_current = self
                .current_question()
                .is_some_and(|q| q.id() == &pending.question_id);
            if answered_current {
                self.advance();
            }
        }

        SubmitOutcome::Accepted(feedback)
    }

    /// Abandons a pending submission after the remote call failed.
    ///
    /// Score and feedback stay untouched so the learner can retry. `AuthExpired`
    /// halts the session. Returns false for stale submissions and for questions
    /// no longer in flight.
    pub fn fail_submit(&mut self, pending: PendingSubmission, error: PracticeError) -> bool {
        if pending.epoch != self.epoch {
            return false;
        }
        if !self.in_flight.remove(&pending.question_id) {
            return false;
        }
        if error == PracticeError::AuthExpired {
            self.error = Some(PracticeError::AuthExpired);
        }
        self.last_failure = Some((pending.question_id, error));
        true
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Moves to the next question.
    ///
    /// Refused while the current answer is in flight. From the last question the
    /// session completes once that question has feedback.
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() || !self.loaded {
            return false;
        }
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if self.in_flight.contains(question.id()) {
            return false;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            return true;
        }
        if self.feedback.contains_key(question.id()) {
            self.current = self.questions.len();
            return true;
        }
        false
    }

    /// Starts the set over, keeping the questions.
    pub fn reset(&mut self) {
        if !self.accepts_network() || !self.loaded {
            return;
        }
        self.clear_progress();
        self.current = 0;
        self.reveal_answers = false;
        if self.error.as_ref().is_some_and(PracticeError::is_retryable) {
            self.error = None;
        }
    }
}

impl PracticeError {
    fn is_recoverable_by_append(&self) -> bool {
        matches!(
            self,
            PracticeError::NoQuestionsAvailable | PracticeError::FetchFailed(_)
        )
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("source", &self.source)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("feedback_len", &self.feedback.len())
            .field("in_flight", &self.in_flight.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TranscriptId, VideoId};
    use serde_json::json;

    fn question(id: &str, answer: &str) -> Question {
        Question::new(QuestionId::new(id), format!("prompt {id}"), QuestionKind::Novice)
            .with_answer(answer)
    }

    fn qid(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    fn novice_source() -> QuestionSource {
        QuestionSource::practice_set(VideoId::new("v1"), QuestionKind::Novice)
    }

    fn loaded_session() -> PracticeSession {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        session.load_questions(vec![
            question("q1", "एक"),
            question("q2", "दो"),
            question("q3", "तीन"),
        ]);
        session
    }

    #[test]
    fn new_session_is_loading() {
        let session = PracticeSession::open(novice_source(), &KindPolicy::default());
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert!(session.accepts_network());
    }

    #[test]
    fn disabled_kind_opens_in_error() {
        let source = QuestionSource::practice_set(VideoId::new("v1"), QuestionKind::Mcq);
        let session = PracticeSession::open(source, &KindPolicy::default());
        assert_eq!(
            session.phase(),
            SessionPhase::Error(PracticeError::TypeDisabled(QuestionKind::Mcq))
        );
        assert!(!session.accepts_network());
    }

    #[test]
    fn empty_load_is_no_questions_available() {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        session.load_questions(Vec::new());
        assert_eq!(
            session.phase(),
            SessionPhase::Error(PracticeError::NoQuestionsAvailable)
        );
    }

    #[test]
    fn correct_answer_scores_and_auto_advances() {
        let mut session = loaded_session();
        assert_eq!(session.phase(), SessionPhase::Ready);

        let outcome = session.submit(&qid("q1"), "एक").unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(Feedback { is_correct: true, .. })));
        assert_eq!(session.score(), 1);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn incorrect_answer_waits_for_manual_advance() {
        let mut session = loaded_session();
        session.submit(&qid("q1"), "एक").unwrap();

        let outcome = session.submit(&qid("q2"), "चार").unwrap();
        let SubmitOutcome::Accepted(feedback) = outcome else {
            panic!("expected feedback");
        };
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct_answer.as_deref(), Some("दो"));
        assert_eq!(feedback.message(), "Incorrect. The correct answer is: दो");
        assert_eq!(session.score(), 1);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.phase(), SessionPhase::Feedback { is_correct: false });

        assert!(session.advance());
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn second_submission_is_a_no_op() {
        let mut session = loaded_session();
        session.submit(&qid("q1"), "एक").unwrap();
        let again = session.submit(&qid("q1"), "एक").unwrap();
        assert_eq!(again, SubmitOutcome::Ignored(IgnoredReason::AlreadyAnswered));
        assert_eq!(session.score(), 1);

        session.submit(&qid("q2"), "wrong").unwrap();
        let retry = session.submit(&qid("q2"), "दो").unwrap();
        assert_eq!(retry, SubmitOutcome::Ignored(IgnoredReason::AlreadyAnswered));
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn in_flight_question_rejects_reentrant_submit_and_advance() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!(
            session.begin_submit(&qid("q1"), "एक").unwrap(),
            BeginSubmit::Ignored(IgnoredReason::InFlight)
        );
        assert!(!session.advance());

        session.complete_submit(pending);
        assert_eq!(session.score(), 1);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn failed_submission_allows_retry_without_scoring() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        let failure = PracticeError::SubmissionFailed("timeout".into());
        assert!(session.fail_submit(pending, failure.clone()));
        assert_eq!(session.score(), 0);
        assert!(session.feedback_for(&qid("q1")).is_none());
        assert_eq!(session.last_failure(), Some(&(qid("q1"), failure)));
        assert_eq!(session.phase(), SessionPhase::Ready);

        let outcome = session.submit(&qid("q1"), "एक").unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert!(session.last_failure().is_none());
    }

    #[test]
    fn failed_submission_cannot_settle_again() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        let late = PendingSubmission {
            epoch: pending.epoch,
            question_id: pending.question_id.clone(),
            answer: pending.answer.clone(),
            verdict: pending.verdict,
        };
        assert!(session.fail_submit(
            pending,
            PracticeError::SubmissionFailed("timeout".into())
        ));
        assert_eq!(
            session.complete_submit(late),
            SubmitOutcome::Ignored(IgnoredReason::Stale)
        );
        assert_eq!(session.score(), 0);
        assert!(session.feedback_for(&qid("q1")).is_none());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn result_after_auth_expiry_is_not_scored() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        session.expire_auth();
        assert_eq!(
            session.complete_submit(pending),
            SubmitOutcome::Ignored(IgnoredReason::Stale)
        );
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn auth_expiry_halts_the_session() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        session.fail_submit(pending, PracticeError::AuthExpired);
        assert_eq!(session.phase(), SessionPhase::Error(PracticeError::AuthExpired));
        assert!(!session.accepts_network());
        assert_eq!(
            session.submit(&qid("q2"), "दो").unwrap(),
            SubmitOutcome::Ignored(IgnoredReason::NotAnswerable)
        );
    }

    #[test]
    fn expired_auth_blocks_reload_and_generation() {
        let mut session = loaded_session();
        session.expire_auth();
        session.load_questions(vec![question("q9", "नौ")]);
        assert_eq!(session.append_generated(Vec::new(), &QuestionKind::Novice), 0);
        assert_eq!(session.phase(), SessionPhase::Error(PracticeError::AuthExpired));
        assert_eq!(session.questions().len(), 3);
    }

    #[test]
    fn results_after_reset_are_stale() {
        let mut session = loaded_session();
        let BeginSubmit::Pending(pending) = session.begin_submit(&qid("q1"), "एक").unwrap() else {
            panic!("expected pending submission");
        };
        session.reset();
        assert_eq!(
            session.complete_submit(pending),
            SubmitOutcome::Ignored(IgnoredReason::Stale)
        );
        assert_eq!(session.score(), 0);
        assert!(session.feedback_for(&qid("q1")).is_none());
    }

    #[test]
    fn reset_keeps_questions_and_clears_progress() {
        let mut session = loaded_session();
        session.submit(&qid("q1"), "एक").unwrap();
        session.submit(&qid("q2"), "x").unwrap();
        session.reveal_answers(true);

        session.reset();
        assert_eq!(session.questions().len(), 3);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.feedback_for(&qid("q1")).is_none());
        assert!(session.submitted_answer(&qid("q2")).is_none());
        assert!(!session.answers_revealed());
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn last_question_completes_only_after_feedback() {
        let mut session = loaded_session();
        assert!(session.advance());
        assert!(session.advance());
        assert_eq!(session.current_index(), 2);
        assert!(!session.advance());

        session.submit(&qid("q3"), "तीन").unwrap();
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert!(session.progress().is_complete);
        assert!(session.current_view().is_none());
    }

    #[test]
    fn answering_a_non_current_question_does_not_move_cursor() {
        let mut session = loaded_session();
        session.submit(&qid("q3"), "तीन").unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 1);
        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.progress().remaining, 2);
    }

    #[test]
    fn append_generated_keeps_cursor_score_and_feedback() {
        let mut session = loaded_session();
        session.submit(&qid("q1"), "एक").unwrap();

        let added = session.append_generated(
            vec![
                serde_json::from_value(json!({"_id": "g1", "question": "नया?", "answer": "हाँ"}))
                    .unwrap(),
                serde_json::from_value(json!({"id": "q2", "question_text": "dup"})).unwrap(),
            ],
            &QuestionKind::Factual,
        );
        assert_eq!(added, 1);
        assert_eq!(session.questions().len(), 4);
        assert_eq!(session.questions()[3].kind(), &QuestionKind::Factual);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.score(), 1);
        assert!(session.feedback_for(&qid("q1")).is_some());
    }

    #[test]
    fn generation_recovers_an_empty_transcript_panel() {
        let source = QuestionSource::Transcript(TranscriptId::new("t1"));
        let mut session = PracticeSession::open(source, &KindPolicy::default());
        session.load_raw(Vec::new());
        assert_eq!(
            session.phase(),
            SessionPhase::Error(PracticeError::NoQuestionsAvailable)
        );

        let added = session.append_generated(
            vec![serde_json::from_value(json!({"question": "क्या?", "answer": "यह"})).unwrap()],
            &QuestionKind::Novice,
        );
        assert_eq!(added, 1);
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.questions()[0].id().as_str(), "local-1");
    }

    #[test]
    fn append_before_load_is_ignored() {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        let added = session.append_generated(
            vec![serde_json::from_value(json!({"id": "x"})).unwrap()],
            &QuestionKind::Novice,
        );
        assert_eq!(added, 0);
        assert_eq!(session.phase(), SessionPhase::Loading);
    }

    #[test]
    fn duplicate_ids_on_load_keep_first() {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        session.load_questions(vec![question("a", "1"), question("a", "2"), question("b", "3")]);
        assert_eq!(session.questions().len(), 2);
        assert_eq!(session.questions()[0].answer(), Some("1"));
    }

    #[test]
    fn synthesized_ids_skip_taken_upstream_ids() {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        session.load_raw(vec![
            serde_json::from_value(json!({"id": "local-2", "question": "a", "answer": "x"}))
                .unwrap(),
            serde_json::from_value(json!({"question": "b", "answer": "y"})).unwrap(),
        ]);
        assert_eq!(session.questions().len(), 2);
        assert_eq!(session.questions()[0].id().as_str(), "local-2");
        assert_eq!(session.questions()[1].id().as_str(), "local-3");
        assert_eq!(session.questions()[1].text(), "b");
    }

    #[test]
    fn answer_hidden_until_feedback_or_reveal() {
        let mut session = loaded_session();
        let view = session.current_view().unwrap();
        assert_eq!(view.position, 1);
        assert_eq!(view.total, 3);
        assert!(view.answer.is_none());

        session.reveal_answers(true);
        assert_eq!(session.current_view().unwrap().answer, Some("एक"));
        session.reveal_answers(false);

        session.submit(&qid("q2"), "nope").unwrap();
        let view = session.view(&qid("q2")).unwrap();
        assert_eq!(view.answer, Some("दो"));
        assert_eq!(view.submitted, Some("nope"));
    }

    #[test]
    fn empty_and_unknown_submissions_are_ignored() {
        let mut session = loaded_session();
        assert_eq!(
            session.submit(&qid("q1"), "   ").unwrap(),
            SubmitOutcome::Ignored(IgnoredReason::EmptyAnswer)
        );
        assert_eq!(
            session.submit(&qid("zzz"), "x").unwrap(),
            SubmitOutcome::Ignored(IgnoredReason::UnknownQuestion)
        );
        assert_eq!(session.score_label(), "Score: 0/3");
    }

    #[test]
    fn question_without_answer_is_invalid() {
        let mut session = PracticeSession::open(novice_source(), &KindPolicy::default());
        session.load_questions(vec![Question::new(qid("bare"), "?", QuestionKind::Novice)]);
        let err = session.submit(&qid("bare"), "x").unwrap_err();
        assert_eq!(err, PracticeError::InvalidQuestion(qid("bare")));
        assert!(!session.is_in_flight(&qid("bare")));
    }
}
