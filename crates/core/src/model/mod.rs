mod ids;
mod kind;
mod practice_set;
mod progress;
mod question;
mod source;

pub use ids::{ParseIdError, QuestionId, TranscriptId, VideoId};
pub use kind::{KindPolicy, QuestionKind};
pub use practice_set::{PracticeSet, RawPracticeSet};
pub use progress::{ProgressRecord, UpstreamProgressEntry};
pub use question::{Question, RawQuestion, normalize, normalize_all};
pub use source::QuestionSource;
