use serde::Deserialize;
use std::path::PathBuf;

use crate::core::vad::VADEngine;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Environment
/// variables can override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// providers:
///   openai_api_key: "sk-..."
///   openai_base_url: "https://api.openai.com/v1"
///   openai_chat_model: "gpt-4"
///   openai_transcribe_model: "whisper-1"
///   elevenlabs_api_key: "your-elevenlabs-key"
///   elevenlabs_voice_id: "EXAVITQu4vr4xnSDxMaL"
///   elevenlabs_model_id: "eleven_monolingual_v1"
///
/// turn:
///   min_duration_ms: 250
///   max_duration_ms: 8000
///   cooldown_ms: 1000
///   vad_engine: energy
///   vad_threshold: 0.5
///   min_words: 2
///   hallucination_token: "sí"
///   hallucination_max_repeats: 8
///
/// session:
///   dialogue_timeout_ms: 10000
///   language: "en"
///   input_sample_rate: 48000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub turn: Option<TurnYaml>,
    pub session: Option<SessionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Provider credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_chat_model: Option<String>,
    pub openai_transcribe_model: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub elevenlabs_model_id: Option<String>,
}

/// Turn gate thresholds from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TurnYaml {
    pub min_duration_ms: Option<u64>,
    pub max_duration_ms: Option<u64>,
    pub cooldown_ms: Option<u64>,
    pub vad_engine: Option<VADEngine>,
    pub vad_threshold: Option<f32>,
    pub min_words: Option<usize>,
    pub hallucination_token: Option<String>,
    pub hallucination_max_repeats: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub dialogue_timeout_ms: Option<u64>,
    pub language: Option<String>,
    pub input_sample_rate: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
