//! Configuration module for the voiceform server
//!
//! Server configuration comes from environment variables, optionally layered
//! over a YAML file. Environment variables always override YAML values, and
//! YAML values override the built-in defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Parsing helpers shared by the loaders
//!
//! # Example
//! ```rust,no_run
//! use voiceform::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::dialogue::{FALLBACK_REPLY, GREETING};
use crate::core::session::SessionConfig;
use crate::core::stt::OPENAI_API_URL;
use crate::core::tts::ELEVENLABS_API_URL;
use crate::core::turn_gate::TurnGateConfig;
use crate::core::vad::{VADConfig, VADEngine};

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Server configuration
///
/// Everything needed to run the server:
/// - Listener settings (host, port)
/// - Provider credentials and endpoints (OpenAI, ElevenLabs)
/// - Turn gate thresholds
/// - Per-session behaviour
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // OpenAI (transcription + dialogue)
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    pub openai_transcribe_model: String,

    // ElevenLabs (speech synthesis)
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model_id: String,

    // Turn gate
    pub turn_min_duration_ms: u64,
    pub turn_max_duration_ms: u64,
    pub turn_cooldown_ms: u64,
    pub vad_engine: VADEngine,
    pub vad_threshold: f32,
    pub transcript_min_words: usize,
    pub hallucination_token: String,
    pub hallucination_max_repeats: usize,

    // Session
    pub dialogue_timeout_ms: u64,
    pub stt_language: String,
    pub input_sample_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            openai_api_key: None,
            openai_base_url: OPENAI_API_URL.to_string(),
            openai_chat_model: "gpt-4".to_string(),
            openai_transcribe_model: "whisper-1".to_string(),
            elevenlabs_api_key: None,
            elevenlabs_base_url: ELEVENLABS_API_URL.to_string(),
            elevenlabs_voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            elevenlabs_model_id: "eleven_monolingual_v1".to_string(),
            turn_min_duration_ms: 250,
            turn_max_duration_ms: 8000,
            turn_cooldown_ms: 1000,
            vad_engine: VADEngine::Energy,
            vad_threshold: 0.5,
            transcript_min_words: 2,
            hallucination_token: "sí".to_string(),
            hallucination_max_repeats: 8,
            dialogue_timeout_ms: 10_000,
            stt_language: "en".to_string(),
            input_sample_rate: 48_000,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// The merged configuration is validated before it is returned.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // A .env file is not loaded here: with an explicit YAML file only real
        // environment variables override it.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get API key for a specific provider
    ///
    /// # Arguments
    /// * `provider` - The name of the provider ("openai" or "elevenlabs")
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.as_ref().cloned().ok_or_else(|| {
                "OpenAI API key not configured in server environment".to_string()
            }),
            "elevenlabs" => self.elevenlabs_api_key.as_ref().cloned().ok_or_else(|| {
                "ElevenLabs API key not configured in server environment".to_string()
            }),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }

    /// Thresholds for the turn gate.
    pub fn turn_gate_config(&self) -> TurnGateConfig {
        TurnGateConfig {
            input_sample_rate: self.input_sample_rate,
            min_duration: Duration::from_millis(self.turn_min_duration_ms),
            max_duration: Duration::from_millis(self.turn_max_duration_ms),
            cooldown: Duration::from_millis(self.turn_cooldown_ms),
            vad: VADConfig {
                engine: self.vad_engine,
                threshold: self.vad_threshold,
                ..Default::default()
            },
            min_words: self.transcript_min_words,
            hallucination_token: self.hallucination_token.clone(),
            hallucination_max_repeats: self.hallucination_max_repeats,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            dialogue_timeout: Duration::from_millis(self.dialogue_timeout_ms),
            language: self.stt_language.clone(),
            greeting: GREETING.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}
