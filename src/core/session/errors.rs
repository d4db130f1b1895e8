/// Failures that end a session.
///
/// Provider failures never appear here; the turn pipeline recovers from them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Outbound channel closed")]
    ChannelClosed,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Turn task failed: {0}")]
    TaskFailed(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
