//! OpenAI Whisper transcription over the REST API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error};

use super::base::{STTError, Transcriber};
use crate::core::audio::CanonicalAudio;
use crate::utils::http::{HttpClientConfig, build_http_client, join_url};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Configuration for [`OpenAITranscriber`].
#[derive(Debug, Clone)]
pub struct OpenAISTTConfig {
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub http: HttpClientConfig,
}

impl Default for OpenAISTTConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_API_URL.to_string(),
            model: "whisper-1".to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Sends each turn as a WAV upload to `/audio/transcriptions`.
pub struct OpenAITranscriber {
    client: reqwest::Client,
    config: OpenAISTTConfig,
}

impl OpenAITranscriber {
    pub fn new(config: OpenAISTTConfig) -> Result<Self, STTError> {
        if config.api_key.is_empty() {
            return Err(STTError::ConfigurationError(
                "API key is required for OpenAI transcription".to_string(),
            ));
        }

        let client = build_http_client(&config.http)
            .map_err(|e| STTError::ConfigurationError(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn build_form(&self, wav: Vec<u8>, language: &str) -> Result<Form, STTError> {
        let file = Part::bytes(wav)
            .file_name("turn.wav")
            .mime_str("audio/wav")
            .map_err(|e| STTError::AudioProcessingError(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("response_format", "json");
        if !language.is_empty() {
            form = form.text("language", language.to_string());
        }
        Ok(form)
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn transcribe(&self, audio: &CanonicalAudio, language: &str) -> Result<String, STTError> {
        let wav = audio
            .to_wav_bytes()
            .map_err(|e| STTError::AudioProcessingError(e.to_string()))?;
        let form = self.build_form(wav, language)?;

        let url = join_url(&self.config.base_url, "audio/transcriptions");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| STTError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(STTError::AuthenticationFailed(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Transcription API error ({}): {}", status, body);
            return Err(STTError::ProviderError(format!("API error ({status}): {body}")));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| STTError::InvalidResponse(e.to_string()))?;

        let transcript = parsed.text.trim().to_string();
        debug!("Transcribed {:?} of audio: {:?}", audio.duration(), transcript);
        Ok(transcript)
    }

    fn get_provider_info(&self) -> &'static str {
        "openai-whisper"
    }
}
