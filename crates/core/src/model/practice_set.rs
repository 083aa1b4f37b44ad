use serde::{Deserialize, Serialize};

use crate::model::ids::VideoId;
use crate::model::kind::QuestionKind;
use crate::model::source::QuestionSource;

/// One row of the upstream practice-set feed, grouped by (video, kind) server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPracticeSet {
    pub video_id: VideoId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "questionCount", default)]
    pub question_count: u32,
    #[serde(default)]
    pub progress: Option<f64>,
}

/// Read-only catalog entry produced by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSet {
    pub video_id: VideoId,
    pub kind: QuestionKind,
    /// `"{video title} - {kind display name}"`.
    pub title: String,
    pub question_count: u32,
    /// Completion in `0..=100`.
    pub progress: f64,
    /// 1-based position among feed rows sharing this (video, kind).
    pub ordinal: usize,
    pub original_title: Option<String>,
    pub display_id: String,
}

impl PracticeSet {
    /// Source to open when the learner picks this entry.
    #[must_use]
    pub fn source(&self) -> QuestionSource {
        QuestionSource::practice_set(self.video_id.clone(), self.kind.clone())
    }

    /// Progress rounded for display.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{}% Complete", self.progress.round())
    }
}
