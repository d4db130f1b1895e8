use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::dialogue::{DialogueError, OpenAIChatConfig, OpenAIDialogueEngine};
use crate::core::session::{SessionArchive, SessionConfig, VoiceServices};
use crate::core::stt::{OpenAISTTConfig, OpenAITranscriber, STTError};
use crate::core::tts::{ElevenLabsTTS, ElevenLabsTTSConfig, TTSError};
use crate::core::turn_gate::TurnGate;
use crate::core::vad::VADError;

/// Failure to build one of the shared voice services at startup.
#[derive(Debug, thiserror::Error)]
pub enum CoreInitError {
    #[error("Transcriber: {0}")]
    Transcriber(#[from] STTError),
    #[error("Dialogue engine: {0}")]
    Dialogue(#[from] DialogueError),
    #[error("Synthesizer: {0}")]
    Synthesizer(#[from] TTSError),
    #[error("Turn gate: {0}")]
    TurnGate(#[from] VADError),
}

/// Core-specific shared state for the application.
///
/// Holds the provider clients every session shares, the per-session
/// settings and the archive of session snapshots.
#[derive(Clone)]
pub struct CoreState {
    pub services: VoiceServices,
    pub session_config: Arc<SessionConfig>,
    pub archive: Arc<SessionArchive>,
}

impl CoreState {
    /// Build the OpenAI and ElevenLabs clients and the turn gate from `config`.
    pub fn new(config: &ServerConfig) -> Result<Arc<Self>, CoreInitError> {
        let openai_key = config.openai_api_key.clone().unwrap_or_default();

        let transcriber = OpenAITranscriber::new(OpenAISTTConfig {
            api_key: openai_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.openai_transcribe_model.clone(),
            ..Default::default()
        })?;

        let dialogue = OpenAIDialogueEngine::new(OpenAIChatConfig {
            api_key: openai_key,
            base_url: config.openai_base_url.clone(),
            model: config.openai_chat_model.clone(),
            ..Default::default()
        })?;

        let synthesizer = ElevenLabsTTS::new(ElevenLabsTTSConfig {
            api_key: config.elevenlabs_api_key.clone().unwrap_or_default(),
            base_url: config.elevenlabs_base_url.clone(),
            voice_id: config.elevenlabs_voice_id.clone(),
            model_id: config.elevenlabs_model_id.clone(),
            ..Default::default()
        })?;

        let gate = TurnGate::from_config(config.turn_gate_config())?;
        info!(
            "Voice services ready: transcriber={}, dialogue={}, vad={}",
            config.openai_transcribe_model,
            config.openai_chat_model,
            config.vad_engine.as_str()
        );

        let services = VoiceServices {
            transcriber: Arc::new(transcriber),
            dialogue: Arc::new(dialogue),
            synthesizer: Arc::new(synthesizer),
            gate: Arc::new(gate),
        };

        Ok(Self::with_services(services, config.session_config()))
    }

    /// Wrap already-built services, e.g. stand-ins for the real providers.
    pub fn with_services(services: VoiceServices, session_config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            services,
            session_config: Arc::new(session_config),
            archive: Arc::new(SessionArchive::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stt::Transcriber;

    #[test]
    fn test_new_requires_openai_key() {
        let config = ServerConfig {
            elevenlabs_api_key: Some("el".to_string()),
            ..Default::default()
        };

        let result = CoreState::new(&config);
        assert!(matches!(
            result,
            Err(CoreInitError::Transcriber(STTError::ConfigurationError(_)))
        ));
    }

    #[test]
    fn test_new_requires_elevenlabs_key() {
        let config = ServerConfig {
            openai_api_key: Some("sk".to_string()),
            ..Default::default()
        };

        let result = CoreState::new(&config);
        assert!(matches!(result, Err(CoreInitError::Synthesizer(_))));
    }

    #[test]
    fn test_new_with_keys() {
        let config = ServerConfig {
            openai_api_key: Some("sk".to_string()),
            elevenlabs_api_key: Some("el".to_string()),
            dialogue_timeout_ms: 1234,
            ..Default::default()
        };

        let state = CoreState::new(&config).unwrap();
        assert_eq!(state.services.transcriber.get_provider_info(), "openai-whisper");
        assert_eq!(
            state.session_config.dialogue_timeout,
            std::time::Duration::from_millis(1234)
        );
        assert!(state.archive.is_empty());
    }
}
