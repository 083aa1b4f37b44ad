use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use practice_core::model::{KindPolicy, QuestionId, QuestionKind, QuestionSource};
use practice_core::{
    BeginSubmit, Clock, PendingSubmission, PracticeError, PracticeSession, ProgressTracker,
    SessionPhase, SetProgress, SubmitOutcome,
};

use crate::api::{PracticeApi, SubmitAck, SubmitRequest};
use crate::error::ApiError;

use super::view::OpenedSession;

/// Drives practice sessions against the backend.
///
/// Sessions stay owned by the caller; the service runs the network half of each
/// operation and keeps the shared progress tracker in step with what was scored.
#[derive(Clone)]
pub struct PracticeSessionService {
    api: Arc<dyn PracticeApi>,
    policy: KindPolicy,
    progress: Arc<Mutex<ProgressTracker>>,
}

impl PracticeSessionService {
    #[must_use]
    pub fn new(api: Arc<dyn PracticeApi>, policy: KindPolicy, clock: Clock) -> Self {
        Self {
            api,
            policy,
            progress: Arc::new(Mutex::new(ProgressTracker::new(clock))),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &KindPolicy {
        &self.policy
    }

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    /// Opens a session and loads its questions.
    ///
    /// Failures end up in the session phase rather than the return value. A source
    /// pinned to a disabled kind never reaches the network.
    pub async fn open(&self, source: QuestionSource) -> OpenedSession {
        let mut session = PracticeSession::open(source, &self.policy);
        if !session.accepts_network() {
            log::info!("{}: kind disabled, not fetching", session.source());
            return OpenedSession {
                session,
                transcript: None,
            };
        }

        let batch = match self.api.fetch_questions(session.source()).await {
            Ok(batch) => batch,
            Err(err) => {
                log::warn!("{}: loading questions failed: {err}", session.source());
                apply_fetch_error(&mut session, &err);
                return OpenedSession {
                    session,
                    transcript: None,
                };
            }
        };

        let transcript = match (batch.transcript, session.source()) {
            (Some(text), _) => Some(text),
            (None, QuestionSource::PracticeSet { video_id, .. }) => self
                .api
                .fetch_transcript(video_id)
                .await
                .map(|t| t.content)
                .filter(|content| !content.trim().is_empty()),
            (None, QuestionSource::Transcript(_)) => None,
        };

        session.load_raw(batch.questions);
        log::debug!(
            "{}: loaded {} questions, {} with server progress",
            session.source(),
            session.questions().len(),
            batch.progress.len()
        );

        let source = session.source().clone();
        let known: HashMap<QuestionId, _> = batch
            .progress
            .into_iter()
            .filter(|(id, _)| session.questions().iter().any(|q| q.id() == id))
            .collect();
        let mut tracker = self.tracker();
        tracker.register_set(&source, session.questions().len());
        tracker.hydrate(&source, known);
        drop(tracker);

        OpenedSession {
            session,
            transcript,
        }
    }

    /// Generates more questions of `kind` and appends them to the session.
    ///
    /// Returns how many questions were added.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::TypeDisabled` for a disabled kind without calling the
    /// backend, `NoQuestionsAvailable` when nothing new came back, and the mapped
    /// `ApiError` otherwise. `AuthExpired` also halts the session.
    pub async fn generate(
        &self,
        session: &mut PracticeSession,
        kind: QuestionKind,
    ) -> Result<usize, PracticeError> {
        if !self.policy.is_enabled(&kind) {
            return Err(PracticeError::TypeDisabled(kind));
        }
        if !session.accepts_network() {
            return Err(match session.phase() {
                SessionPhase::Error(err) => err,
                _ => PracticeError::AuthExpired,
            });
        }

        let raw = match self.api.generate_questions(session.source(), &kind).await {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("{}: generating {kind} failed: {err}", session.source());
                let mapped = err.to_fetch_error();
                if mapped == PracticeError::AuthExpired {
                    session.expire_auth();
                }
                return Err(mapped);
            }
        };

        let added = session.append_generated(raw, &kind);
        if added == 0 {
            return Err(PracticeError::NoQuestionsAvailable);
        }
        log::info!("{}: appended {added} generated {kind} questions", session.source());
        self.tracker()
            .register_set(session.source(), session.questions().len());
        Ok(added)
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Scores an answer locally, records it remotely, then applies the verdict.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidQuestion` for a question without a stored
    /// answer, and the mapped `ApiError` when recording fails. A failed record
    /// leaves score and feedback untouched.
    pub async fn submit(
        &self,
        session: &mut PracticeSession,
        question_id: &QuestionId,
        answer: &str,
    ) -> Result<SubmitOutcome, PracticeError> {
        let pending = match session.begin_submit(question_id, answer)? {
            BeginSubmit::Pending(pending) => pending,
            BeginSubmit::Ignored(reason) => {
                log::debug!("{}: submit for {question_id} ignored: {reason:?}", session.source());
                return Ok(SubmitOutcome::Ignored(reason));
            }
        };
        let result = self.record(session.source(), &pending).await;
        self.apply(session, pending, result)
    }

    /// Network half of a submission. Touches neither the session nor the tracker.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the backend call fails.
    pub async fn record(
        &self,
        source: &QuestionSource,
        pending: &PendingSubmission,
    ) -> Result<SubmitAck, ApiError> {
        let request = SubmitRequest {
            source: source.clone(),
            question_id: pending.question_id().clone(),
            answer: pending.answer().to_string(),
            is_correct: pending.is_correct(),
        };
        self.api.submit_answer(&request).await
    }

    /// Applies the outcome of `record` to the session and the tracker.
    ///
    /// The local verdict stands even when the server reports a different one.
    ///
    /// # Errors
    ///
    /// Returns the mapped error when `result` is a failure.
    pub fn apply(
        &self,
        session: &mut PracticeSession,
        pending: PendingSubmission,
        result: Result<SubmitAck, ApiError>,
    ) -> Result<SubmitOutcome, PracticeError> {
        let ack = match result {
            Ok(ack) => ack,
            Err(err) => {
                log::warn!(
                    "{}: recording answer for {} failed: {err}",
                    session.source(),
                    pending.question_id()
                );
                let mapped = err.to_submission_error();
                session.fail_submit(pending, mapped.clone());
                return Err(mapped);
            }
        };

        if ack.is_correct.is_some_and(|remote| remote != pending.is_correct()) {
            log::info!(
                "{}: server verdict for {} differs from local, keeping local",
                session.source(),
                pending.question_id()
            );
        }

        let question_id = pending.question_id().clone();
        let answer = pending.answer().to_string();
        let is_correct = pending.is_correct();
        let outcome = session.complete_submit(pending);
        if matches!(outcome, SubmitOutcome::Accepted(_)) {
            self.tracker()
                .record(session.source(), question_id, answer, is_correct);
        }
        Ok(outcome)
    }

    //
    // ─── PROGRESS ──────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn percent_complete(&self, source: &QuestionSource) -> f64 {
        self.tracker().percent_complete(source)
    }

    #[must_use]
    pub fn progress_snapshot(&self, source: &QuestionSource) -> Option<SetProgress> {
        self.tracker().get(source).cloned()
    }

    fn tracker(&self) -> MutexGuard<'_, ProgressTracker> {
        self.progress
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn apply_fetch_error(session: &mut PracticeSession, err: &ApiError) {
    match err.to_fetch_error() {
        PracticeError::AuthExpired => session.expire_auth(),
        other => session.fail_load(other),
    }
}

impl std::fmt::Debug for PracticeSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticeSessionService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
