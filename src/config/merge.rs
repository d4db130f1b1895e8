use super::ServerConfig;
use super::utils::{env_string, parse_env};
use super::yaml::YamlConfig;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration providing base values
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = ServerConfig::default();

    // Helper macro for string values: ENV > YAML > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            env_string($env_var)
                .or($yaml_value)
                .unwrap_or($default)
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            env_string($env_var).or($yaml_value)
        };
    }

    // Helper macro for parsed values: ENV > YAML > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            parse_env($env_var)?.or($yaml_value).unwrap_or($default)
        };
    }

    let server = yaml.server.unwrap_or_default();
    let providers = yaml.providers.unwrap_or_default();
    let turn = yaml.turn.unwrap_or_default();
    let session = yaml.session.unwrap_or_default();

    Ok(ServerConfig {
        host: get_value!("HOST", server.host, defaults.host),
        port: get_parsed!("PORT", server.port, defaults.port),

        openai_api_key: get_optional!("OPENAI_API_KEY", providers.openai_api_key),
        openai_base_url: get_value!(
            "OPENAI_BASE_URL",
            providers.openai_base_url,
            defaults.openai_base_url
        ),
        openai_chat_model: get_value!(
            "OPENAI_CHAT_MODEL",
            providers.openai_chat_model,
            defaults.openai_chat_model
        ),
        openai_transcribe_model: get_value!(
            "OPENAI_TRANSCRIBE_MODEL",
            providers.openai_transcribe_model,
            defaults.openai_transcribe_model
        ),

        elevenlabs_api_key: get_optional!("ELEVENLABS_API_KEY", providers.elevenlabs_api_key),
        elevenlabs_base_url: get_value!(
            "ELEVENLABS_BASE_URL",
            providers.elevenlabs_base_url,
            defaults.elevenlabs_base_url
        ),
        elevenlabs_voice_id: get_value!(
            "ELEVENLABS_VOICE_ID",
            providers.elevenlabs_voice_id,
            defaults.elevenlabs_voice_id
        ),
        elevenlabs_model_id: get_value!(
            "ELEVENLABS_MODEL_ID",
            providers.elevenlabs_model_id,
            defaults.elevenlabs_model_id
        ),

        turn_min_duration_ms: get_parsed!(
            "TURN_MIN_DURATION_MS",
            turn.min_duration_ms,
            defaults.turn_min_duration_ms
        ),
        turn_max_duration_ms: get_parsed!(
            "TURN_MAX_DURATION_MS",
            turn.max_duration_ms,
            defaults.turn_max_duration_ms
        ),
        turn_cooldown_ms: get_parsed!(
            "TURN_COOLDOWN_MS",
            turn.cooldown_ms,
            defaults.turn_cooldown_ms
        ),
        vad_engine: get_parsed!("VAD_ENGINE", turn.vad_engine, defaults.vad_engine),
        vad_threshold: get_parsed!("VAD_THRESHOLD", turn.vad_threshold, defaults.vad_threshold),
        transcript_min_words: get_parsed!(
            "TRANSCRIPT_MIN_WORDS",
            turn.min_words,
            defaults.transcript_min_words
        ),
        hallucination_token: get_value!(
            "HALLUCINATION_TOKEN",
            turn.hallucination_token,
            defaults.hallucination_token
        ),
        hallucination_max_repeats: get_parsed!(
            "HALLUCINATION_MAX_REPEATS",
            turn.hallucination_max_repeats,
            defaults.hallucination_max_repeats
        ),

        dialogue_timeout_ms: get_parsed!(
            "DIALOGUE_TIMEOUT_MS",
            session.dialogue_timeout_ms,
            defaults.dialogue_timeout_ms
        ),
        stt_language: get_value!("STT_LANGUAGE", session.language, defaults.stt_language),
        input_sample_rate: get_parsed!(
            "INPUT_SAMPLE_RATE",
            session.input_sample_rate,
            defaults.input_sample_rate
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{ProvidersYaml, TurnYaml};
    use crate::core::vad::VADEngine;
    use serial_test::serial;
    use std::env;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_CHAT_MODEL");
            env::remove_var("TURN_COOLDOWN_MS");
            env::remove_var("VAD_ENGINE");
            env::remove_var("PORT");
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults_without_yaml() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();
        let defaults = ServerConfig::default();

        assert_eq!(config.port, defaults.port);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.turn_cooldown_ms, 1000);
        assert_eq!(config.vad_engine, VADEngine::Energy);
    }

    #[test]
    #[serial]
    fn test_merge_env_over_yaml() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            providers: Some(ProvidersYaml {
                openai_api_key: Some("yaml-key".to_string()),
                openai_chat_model: Some("gpt-4o".to_string()),
                ..Default::default()
            }),
            turn: Some(TurnYaml {
                cooldown_ms: Some(2000),
                vad_engine: Some(VADEngine::Silero),
                ..Default::default()
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var("OPENAI_API_KEY", "env-key");
            env::set_var("TURN_COOLDOWN_MS", "0");
            env::set_var("VAD_ENGINE", "energy");
        }

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.openai_api_key, Some("env-key".to_string()));
        assert_eq!(config.openai_chat_model, "gpt-4o");
        assert_eq!(config.turn_cooldown_ms, 0);
        assert_eq!(config.vad_engine, VADEngine::Energy);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_env_number() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = merge_config(None);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid PORT environment variable")
        );

        cleanup_env_vars();
    }
}
