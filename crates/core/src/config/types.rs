use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub torrent_index: TorrentIndexConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shelfline.db")
}

/// Movie metadata API configuration (TMDB-compatible).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// API key. Lookups fail soft to empty results when unset.
    #[serde(default)]
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// ISO 3166-1 country whose certification is used (default: GB).
    #[serde(default = "default_country")]
    pub country: String,
    /// ISO 639-1 language ranked first when sorting poster images.
    #[serde(default = "default_language")]
    pub primary_language: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            image_base_url: None,
            country: default_country(),
            primary_language: default_language(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_country() -> String {
    "GB".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u32 {
    10
}

/// Torrent index API configuration (YTS-compatible).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentIndexConfig {
    /// Base URL (default: https://yts.mx/api/v2).
    #[serde(default = "default_torrent_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for TorrentIndexConfig {
    fn default() -> Self {
        Self {
            base_url: default_torrent_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_torrent_base_url() -> String {
    "https://yts.mx/api/v2".to_string()
}

/// Local media storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Directory where downloaded poster images are stored.
    #[serde(default = "default_poster_dir")]
    pub poster_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            poster_dir: default_poster_dir(),
        }
    }
}

fn default_poster_dir() -> PathBuf {
    PathBuf::from("posters")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub metadata: SanitizedMetadataConfig,
    pub torrent_index: TorrentIndexConfig,
    pub media: MediaConfig,
}

/// Sanitized metadata config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMetadataConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub country: String,
    pub primary_language: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            metadata: SanitizedMetadataConfig {
                api_key_configured: !config.metadata.api_key.is_empty(),
                base_url: config.metadata.base_url.clone(),
                country: config.metadata.country.clone(),
                primary_language: config.metadata.primary_language.clone(),
                timeout_secs: config.metadata.timeout_secs,
            },
            torrent_index: config.torrent_index.clone(),
            media: config.media.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "shelfline.db");
        assert_eq!(config.metadata.country, "GB");
        assert_eq!(config.metadata.timeout_secs, 10);
        assert_eq!(config.torrent_index.base_url, "https://yts.mx/api/v2");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/collection.db"

[metadata]
api_key = "test-key"
country = "US"
primary_language = "fr"

[torrent_index]
base_url = "http://localhost:9117"
timeout_secs = 5

[media]
poster_dir = "/data/posters"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.metadata.api_key, "test-key");
        assert_eq!(config.metadata.country, "US");
        assert_eq!(config.metadata.primary_language, "fr");
        assert_eq!(config.torrent_index.timeout_secs, 5);
        assert_eq!(config.media.poster_dir.to_str().unwrap(), "/data/posters");
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let mut config: Config = toml::from_str("").unwrap();
        config.metadata.api_key = "secret".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.metadata.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_sanitized_config_without_api_key() {
        let config: Config = toml::from_str("").unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.metadata.api_key_configured);
    }
}
