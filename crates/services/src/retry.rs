/// Per-request token refresh state: at most one refresh, then give up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryState {
    #[default]
    Idle,
    /// Refreshed once; the request has been replayed.
    Retried,
    Failed,
}

/// What to do after a `401 Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Refresh,
    GiveUp,
}

impl RetryState {
    pub fn on_unauthorized(&mut self) -> RetryStep {
        match self {
            RetryState::Idle => {
                *self = RetryState::Retried;
                RetryStep::Refresh
            }
            RetryState::Retried | RetryState::Failed => {
                *self = RetryState::Failed;
                RetryStep::GiveUp
            }
        }
    }

    /// The refresh call itself failed.
    pub fn refresh_failed(&mut self) {
        *self = RetryState::Failed;
    }

    #[must_use]
    pub fn is_failed(self) -> bool {
        self == RetryState::Failed
    }
}
