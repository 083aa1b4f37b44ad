use std::fmt;

use crate::model::ids::{TranscriptId, VideoId};
use crate::model::kind::QuestionKind;

/// Where a session's questions come from.
///
/// Also the key the progress tracker files records under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionSource {
    /// Q&A panel attached to a stored transcript. Mixed kinds, grown by generation.
    Transcript(TranscriptId),
    /// One practice set from the catalog.
    PracticeSet { video_id: VideoId, kind: QuestionKind },
}

impl QuestionSource {
    #[must_use]
    pub fn practice_set(video_id: VideoId, kind: QuestionKind) -> Self {
        Self::PracticeSet { video_id, kind }
    }

    /// Kind fixed by the source, if any. Transcript panels accept every kind.
    #[must_use]
    pub fn fixed_kind(&self) -> Option<&QuestionKind> {
        match self {
            QuestionSource::Transcript(_) => None,
            QuestionSource::PracticeSet { kind, .. } => Some(kind),
        }
    }
}

impl fmt::Display for QuestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionSource::Transcript(id) => write!(f, "transcript/{id}"),
            QuestionSource::PracticeSet { video_id, kind } => write!(f, "practice/{video_id}/{kind}"),
        }
    }
}
