use std::time::Duration;

use async_trait::async_trait;

use super::prompts::END_SENTINEL;
use super::state::DialogueState;

/// Error types for the dialogue step
#[derive(Debug, Clone, thiserror::Error)]
pub enum DialogueError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("No reply within {0:?}")]
    Timeout(Duration),
}

/// What the dialogue engine wants said next.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueReply {
    pub text: String,
    /// The reply closes the session once delivered
    pub end_of_session: bool,
}

impl DialogueReply {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end_of_session = contains_end_sentinel(&text);
        Self {
            text,
            end_of_session,
        }
    }
}

/// Turn-taking engine behind the conversation.
///
/// The caller records the user's transcript in `state` before calling
/// `respond` and records the returned reply afterwards. The engine may update
/// the form-field store.
#[async_trait]
pub trait DialogueEngine: Send + Sync {
    async fn respond(
        &self,
        transcript: &str,
        state: &mut DialogueState,
    ) -> Result<DialogueReply, DialogueError>;

    fn get_provider_info(&self) -> &'static str;
}

/// Case-insensitive check for the end-of-conversation phrase.
pub fn contains_end_sentinel(text: &str) -> bool {
    text.to_uppercase().contains(END_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(contains_end_sentinel("END OF CONVERSATION"));
        assert!(contains_end_sentinel("Thanks! end of conversation."));
        assert!(!contains_end_sentinel("What is your business address?"));
    }

    #[test]
    fn test_timeout_message() {
        let err = DialogueError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "No reply within 10s");
    }

    #[test]
    fn test_reply_sets_end_flag() {
        assert!(DialogueReply::new("End Of Conversation").end_of_session);
        assert!(!DialogueReply::new("Next question").end_of_session);
    }
}
