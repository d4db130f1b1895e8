//! Conversation state and the turn-taking engine that produces replies.

mod base;
pub mod openai;
pub mod prompts;
mod state;

pub use base::{DialogueEngine, DialogueError, DialogueReply, contains_end_sentinel};
pub use openai::{OpenAIChatConfig, OpenAIDialogueEngine};
pub use prompts::{END_SENTINEL, FALLBACK_REPLY, FORM_FIELDS, GREETING};
pub use state::{ConversationEntry, DialogueState, Role};
