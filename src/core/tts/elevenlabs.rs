use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use super::base::{AudioData, Synthesizer, TTSError, TTSResult};
use crate::utils::http::{HttpClientConfig, build_http_client, join_url};

pub const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

/// Voice settings for ElevenLabs TTS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice stability (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// Similarity boost (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    /// Style strength (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
    /// Use speaker boost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.75),
            style: None,
            use_speaker_boost: None,
        }
    }
}

/// Configuration for [`ElevenLabsTTS`].
#[derive(Debug, Clone)]
pub struct ElevenLabsTTSConfig {
    pub api_key: String,
    /// API root, e.g. `https://api.elevenlabs.io/v1`
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    /// ElevenLabs `output_format` query value
    pub output_format: String,
    pub voice_settings: VoiceSettings,
    pub http: HttpClientConfig,
}

impl Default for ElevenLabsTTSConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: ELEVENLABS_API_URL.to_string(),
            voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            output_format: "mp3_44100_128".to_string(),
            voice_settings: VoiceSettings::default(),
            http: HttpClientConfig::default(),
        }
    }
}

impl ElevenLabsTTSConfig {
    /// Short format name reported with the audio ("mp3", "pcm", "ulaw").
    fn audio_format(&self) -> &str {
        self.output_format
            .split('_')
            .next()
            .filter(|f| !f.is_empty())
            .unwrap_or("mp3")
    }

    fn accept_header(&self) -> &'static str {
        match self.audio_format() {
            "pcm" => "audio/pcm",
            "ulaw" => "audio/basic",
            _ => "audio/mpeg",
        }
    }
}

/// Builds the ElevenLabs `text-to-speech` request
#[derive(Debug, Clone)]
struct ElevenLabsRequestBuilder {
    config: ElevenLabsTTSConfig,
}

impl ElevenLabsRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let url = join_url(
            &self.config.base_url,
            &format!("text-to-speech/{}", self.config.voice_id),
        );

        let body = json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": self.config.voice_settings,
        });

        client
            .post(url)
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", self.config.accept_header())
            .json(&body)
    }
}

/// ElevenLabs TTS provider implementation using the ElevenLabs HTTP REST API
pub struct ElevenLabsTTS {
    client: reqwest::Client,
    request_builder: ElevenLabsRequestBuilder,
}

impl ElevenLabsTTS {
    pub fn new(config: ElevenLabsTTSConfig) -> TTSResult<Self> {
        if config.api_key.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "API key is required for ElevenLabs".to_string(),
            ));
        }
        if config.voice_id.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "voice_id is required for ElevenLabs".to_string(),
            ));
        }

        let client = build_http_client(&config.http)
            .map_err(|e| TTSError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            request_builder: ElevenLabsRequestBuilder { config },
        })
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<AudioData> {
        let response = self
            .request_builder
            .build_http_request(&self.client, text)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("TTS API error ({}): {}", status, error_body);
            return Err(TTSError::ProviderError(format!(
                "API error ({status}): {error_body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Failed to read audio: {e}")))?;
        if bytes.is_empty() {
            return Err(TTSError::AudioGenerationFailed(
                "provider returned no audio".to_string(),
            ));
        }

        debug!("Synthesized {} bytes for {} chars", bytes.len(), text.len());
        Ok(AudioData::new(
            bytes.to_vec(),
            self.request_builder.config.audio_format(),
        ))
    }

    fn get_provider_info(&self) -> serde_json::Value {
        let config = &self.request_builder.config;
        json!({
            "provider": "elevenlabs",
            "api_type": "HTTP REST",
            "voice_id": config.voice_id,
            "model_id": config.model_id,
            "output_format": config.output_format,
            "documentation": "https://elevenlabs.io/docs/api-reference/text-to-speech",
        })
    }
}
