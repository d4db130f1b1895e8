use super::ServerConfig;

/// Validate the merged configuration
///
/// Checks that:
/// - the VAD threshold is a probability in [0, 1]
/// - the minimum turn duration is below the maximum
/// - at least one word is required of a transcript
/// - the hallucination filter has a non-empty token
/// - the input sample rate and dialogue timeout are positive
pub fn validate_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&config.vad_threshold) {
        return Err(format!(
            "VAD_THRESHOLD must be between 0.0 and 1.0, got {}",
            config.vad_threshold
        )
        .into());
    }

    if config.turn_min_duration_ms >= config.turn_max_duration_ms {
        return Err(format!(
            "TURN_MIN_DURATION_MS ({}) must be less than TURN_MAX_DURATION_MS ({})",
            config.turn_min_duration_ms, config.turn_max_duration_ms
        )
        .into());
    }

    if config.transcript_min_words < 1 {
        return Err("TRANSCRIPT_MIN_WORDS must be at least 1".into());
    }

    if config.hallucination_token.trim().is_empty() {
        return Err("HALLUCINATION_TOKEN cannot be empty".into());
    }

    if config.input_sample_rate == 0 {
        return Err("INPUT_SAMPLE_RATE must be greater than 0".into());
    }

    if config.dialogue_timeout_ms == 0 {
        return Err("DIALOGUE_TIMEOUT_MS must be greater than 0".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = ServerConfig {
            vad_threshold: -0.1,
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("VAD_THRESHOLD"));
    }

    #[test]
    fn test_min_duration_must_be_below_max() {
        let config = ServerConfig {
            turn_min_duration_ms: 8000,
            turn_max_duration_ms: 8000,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_min_words_at_least_one() {
        let config = ServerConfig {
            transcript_min_words: 0,
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.to_string(), "TRANSCRIPT_MIN_WORDS must be at least 1");
    }

    #[test]
    fn test_zero_sample_rate() {
        let config = ServerConfig {
            input_sample_rate: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_hallucination_token() {
        let config = ServerConfig {
            hallucination_token: "  ".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
