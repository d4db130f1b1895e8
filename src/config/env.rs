use super::ServerConfig;
use super::merge::merge_config;
use super::validation::validate_config;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with defaults for
    /// everything except provider API keys. Also loads a `.env` file if
    /// present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A numeric or enum variable is malformed
    /// - The resulting configuration fails validation
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        validate_config(&config)?;
        Ok(config)
    }
}
