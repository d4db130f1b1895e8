//! Dialogue engine backed by the OpenAI Chat Completions API.
//!
//! Each user turn makes two calls: a low-temperature extraction call that
//! fills form fields from the last question/answer pair, then the reply call
//! that continues the interview.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{DialogueEngine, DialogueError, DialogueReply};
use super::prompts::{EXTRACTION_SYSTEM_PROMPT, FORM_FIELDS, INSTRUCTION_PROMPT, extraction_prompt};
use super::state::{DialogueState, Role};
use crate::core::stt::OPENAI_API_URL;
use crate::utils::http::{HttpClientConfig, build_http_client, join_url};

/// Configuration for [`OpenAIDialogueEngine`].
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub extraction_temperature: f32,
    pub reply_temperature: f32,
    pub http: HttpClientConfig,
}

impl Default for OpenAIChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_API_URL.to_string(),
            model: "gpt-4".to_string(),
            extraction_temperature: 0.2,
            reply_temperature: 0.7,
            http: HttpClientConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAIDialogueEngine {
    client: reqwest::Client,
    config: OpenAIChatConfig,
}

impl OpenAIDialogueEngine {
    pub fn new(config: OpenAIChatConfig) -> Result<Self, DialogueError> {
        if config.api_key.is_empty() {
            return Err(DialogueError::ConfigurationError(
                "API key is required for OpenAI chat".to_string(),
            ));
        }

        let client = build_http_client(&config.http)
            .map_err(|e| DialogueError::ConfigurationError(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage<'_>>,
        temperature: f32,
    ) -> Result<String, DialogueError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature,
        };

        let response = self
            .client
            .post(join_url(&self.config.base_url, "chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DialogueError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DialogueError::ProviderError(format!(
                "API error ({status}): {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DialogueError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| DialogueError::InvalidResponse("no choices in response".to_string()))
    }

    async fn extract_fields(
        &self,
        transcript: &str,
        state: &mut DialogueState,
    ) -> Result<usize, DialogueError> {
        let prompt = extraction_prompt(FORM_FIELDS, state.last_assistant_message(), transcript);
        let messages = vec![
            ChatMessage {
                role: "system",
                content: EXTRACTION_SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ];

        let content = self
            .complete(messages, self.config.extraction_temperature)
            .await?;
        let values = parse_extraction(&content).ok_or_else(|| {
            DialogueError::InvalidResponse(format!("extraction is not a JSON object: {content}"))
        })?;

        Ok(state.apply_extracted(&values))
    }
}

#[async_trait]
impl DialogueEngine for OpenAIDialogueEngine {
    async fn respond(
        &self,
        transcript: &str,
        state: &mut DialogueState,
    ) -> Result<DialogueReply, DialogueError> {
        match self.extract_fields(transcript, state).await {
            Ok(updated) => debug!("Field extraction updated {} field(s)", updated),
            Err(e) => warn!("Field extraction failed: {}", e),
        }

        let mut messages = vec![ChatMessage {
            role: "system",
            content: INSTRUCTION_PROMPT,
        }];
        messages.extend(state.history().iter().map(|entry| ChatMessage {
            role: match entry.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &entry.text,
        }));

        let text = self
            .complete(messages, self.config.reply_temperature)
            .await?;
        Ok(DialogueReply::new(text))
    }

    fn get_provider_info(&self) -> &'static str {
        "openai-chat"
    }
}

/// Parse the extraction reply, tolerating a Markdown code fence around it.
fn parse_extraction(content: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let mut body = content.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
        body = body.trim_end().strip_suffix("```").unwrap_or(body);
        body = body.trim();
    }

    if !(body.starts_with('{') && body.ends_with('}')) {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}
