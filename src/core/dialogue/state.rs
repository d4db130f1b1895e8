use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompts::FORM_FIELDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

/// Per-session conversation history and form-field store.
///
/// The session hands a clone of this to each turn. A stale turn's copy is
/// discarded, so it leaves no trace; otherwise the copy is adopted and the
/// assistant's reply is recorded only after it has been written to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueState {
    history: Vec<ConversationEntry>,
    form_fields: BTreeMap<String, Option<String>>,
    last_assistant_message: String,
}

impl DialogueState {
    /// Start a conversation whose first assistant line is `greeting`.
    pub fn new(greeting: &str) -> Self {
        let form_fields = FORM_FIELDS
            .iter()
            .map(|name| (name.to_string(), None))
            .collect();

        let mut state = Self {
            history: Vec::new(),
            form_fields,
            last_assistant_message: String::new(),
        };
        state.record_assistant(greeting);
        state
    }

    pub fn record_user(&mut self, text: &str) {
        self.history.push(ConversationEntry {
            role: Role::User,
            text: text.to_string(),
            timestamp_ms: now_ms(),
        });
    }

    pub fn record_assistant(&mut self, text: &str) {
        self.history.push(ConversationEntry {
            role: Role::Assistant,
            text: text.to_string(),
            timestamp_ms: now_ms(),
        });
        self.last_assistant_message = text.to_string();
    }

    /// Merge extracted values into the form store.
    ///
    /// Unknown keys and nulls are ignored; numbers and booleans are stored as
    /// their JSON text. Returns how many fields were set.
    pub fn apply_extracted(&mut self, values: &serde_json::Map<String, Value>) -> usize {
        let mut updated = 0;
        for (key, value) in values {
            let Some(slot) = self.form_fields.get_mut(key) else {
                continue;
            };
            let text = match value {
                Value::Null => continue,
                Value::String(s) if s.trim().is_empty() => continue,
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            *slot = Some(text);
            updated += 1;
        }
        updated
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn form_fields(&self) -> &BTreeMap<String, Option<String>> {
        &self.form_fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form_fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn last_assistant_message(&self) -> &str {
        &self.last_assistant_message
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
