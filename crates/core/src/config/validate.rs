use super::{Config, ConfigError};

/// Validate cross-field constraints that serde defaults cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.metadata.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "metadata.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.torrent_index.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "torrent_index.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.torrent_index.base_url.is_empty() {
        return Err(ConfigError::Invalid(
            "torrent_index.base_url must not be empty".to_string(),
        ));
    }

    if config.metadata.country.len() != 2 {
        return Err(ConfigError::Invalid(format!(
            "metadata.country must be a two-letter ISO 3166-1 code, got '{}'",
            config.metadata.country
        )));
    }

    Ok(())
}
