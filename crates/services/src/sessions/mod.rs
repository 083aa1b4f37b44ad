mod service;
mod view;

pub use service::PracticeSessionService;
pub use view::OpenedSession;
