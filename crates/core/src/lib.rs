#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod progress;
pub mod session;
pub mod time;

pub use catalog::{CatalogFilter, aggregate};
pub use error::PracticeError;
pub use evaluator::{Verdict, evaluate};
pub use progress::{ProgressTracker, SetProgress};
pub use session::{
    BeginSubmit, Feedback, IgnoredReason, PendingSubmission, PracticeSession, QuestionView,
    SessionPhase, SessionProgress, SubmitOutcome,
};
pub use time::Clock;
