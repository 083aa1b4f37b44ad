use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{ProgressRecord, QuestionId, QuestionSource, UpstreamProgressEntry};
use crate::time::Clock;

/// Completion state for one set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetProgress {
    total_questions: usize,
    records: HashMap<QuestionId, ProgressRecord>,
    total_attempts: u32,
    correct_attempts: u32,
}

impl SetProgress {
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn record(&self, id: &QuestionId) -> Option<&ProgressRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn correct_attempts(&self) -> u32 {
        self.correct_attempts
    }

    /// `answered / total * 100`, clamped to `0..=100`; zero for an empty set.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.records.len() as f64 / self.total_questions as f64;
        (ratio * 100.0).clamp(0.0, 100.0)
    }
}

/// Per-set completion records. Recording a question twice keeps the latest answer.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    clock: Clock,
    sets: HashMap<QuestionSource, SetProgress>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            sets: HashMap::new(),
        }
    }

    /// Sets how many questions the set holds. Existing records are kept.
    pub fn register_set(&mut self, set: &QuestionSource, total_questions: usize) {
        self.sets.entry(set.clone()).or_default().total_questions = total_questions;
    }

    /// Records an answer stamped with the tracker's clock.
    pub fn record(
        &mut self,
        set: &QuestionSource,
        question_id: QuestionId,
        submitted_answer: impl Into<String>,
        is_correct: bool,
    ) -> ProgressRecord {
        let now = self.clock.now();
        self.record_at(set, question_id, submitted_answer, is_correct, now)
    }

    pub fn record_at(
        &mut self,
        set: &QuestionSource,
        question_id: QuestionId,
        submitted_answer: impl Into<String>,
        is_correct: bool,
        submitted_at: DateTime<Utc>,
    ) -> ProgressRecord {
        let record = ProgressRecord::new(question_id, submitted_answer, is_correct, submitted_at);
        let progress = self.sets.entry(set.clone()).or_default();
        progress.total_attempts = progress.total_attempts.saturating_add(1);
        if is_correct {
            progress.correct_attempts = progress.correct_attempts.saturating_add(1);
        }
        progress
            .records
            .insert(record.question_id.clone(), record.clone());
        record
    }

    /// Seeds a set from the progress map the server returns with its questions.
    ///
    /// Server-side records do not count as attempts made in this process.
    pub fn hydrate(
        &mut self,
        set: &QuestionSource,
        upstream: HashMap<QuestionId, UpstreamProgressEntry>,
    ) {
        let fallback = self.clock.now();
        let progress = self.sets.entry(set.clone()).or_default();
        for (id, entry) in upstream {
            let record = entry.into_record(id.clone(), fallback);
            progress.records.insert(id, record);
        }
    }

    #[must_use]
    pub fn get(&self, set: &QuestionSource) -> Option<&SetProgress> {
        self.sets.get(set)
    }

    #[must_use]
    pub fn percent_complete(&self, set: &QuestionSource) -> f64 {
        self.sets.get(set).map_or(0.0, SetProgress::percent_complete)
    }

    /// Drops every record for a set, keeping its registered size.
    pub fn clear_set(&mut self, set: &QuestionSource) {
        if let Some(progress) = self.sets.get_mut(set) {
            progress.records.clear();
            progress.total_attempts = 0;
            progress.correct_attempts = 0;
        }
    }
}
