// Runtime configuration for place-discovery
// Defaults, optional JSON file, then environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "PLACE_DISCOVERY_CONFIG";
pub const API_BASE_ENV: &str = "PLACE_DISCOVERY_API_BASE";
pub const DB_PATH_ENV: &str = "PLACE_DISCOVERY_DB_PATH";
pub const TAXONOMY_ENV: &str = "PLACE_DISCOVERY_TAXONOMY";

/// Directory name used under the platform data dir
const APP_DIR: &str = "place-discovery";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub api_base: String,
    /// Version date appended to every catalog request
    pub catalog_version: String,
    /// Version date appended to every personalized request
    pub personalized_version: String,
    pub personalized_timeout_secs: u64,
    pub catalog_idle_timeout_secs: u64,
    pub catalog_total_timeout_secs: u64,
    pub cache_refresh_timeout_secs: u64,
    pub background_grace_secs: u64,
    pub near_location_radius: u32,
    pub autocomplete_radius: u32,
    pub location_search_radius: u32,
    pub default_limit: u32,
    /// Keyed-store service name for the catalog API key
    pub catalog_service: String,
    /// Keyed-store service name for the personalized service key
    pub personalized_service: String,
    pub db_path: PathBuf,
    pub taxonomy_path: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.foursquare.com/".to_string(),
            catalog_version: "20241227".to_string(),
            personalized_version: "20240101".to_string(),
            personalized_timeout_secs: 5,
            catalog_idle_timeout_secs: 15,
            catalog_total_timeout_secs: 30,
            cache_refresh_timeout_secs: 10,
            background_grace_secs: 20,
            near_location_radius: 25000,
            autocomplete_radius: 50000,
            location_search_radius: 100000,
            default_limit: 50,
            catalog_service: "foursquare".to_string(),
            personalized_service: "foursquareService".to_string(),
            db_path: default_data_dir().join("discovery.db"),
            taxonomy_path: None,
        }
    }
}

impl DiscoveryConfig {
    /// Load defaults, then the config file if any, then env overrides
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let candidate = default_data_dir().join("config.json");
                candidate.exists().then_some(candidate)
            });

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            self.api_base = base;
        }
        if let Some(path) = std::env::var_os(DB_PATH_ENV) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(path) = std::env::var_os(TAXONOMY_ENV) {
            self.taxonomy_path = Some(PathBuf::from(path));
        }
    }

    /// Base URL joined with a relative endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn personalized_timeout(&self) -> Duration {
        Duration::from_secs(self.personalized_timeout_secs)
    }

    pub fn catalog_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_idle_timeout_secs)
    }

    pub fn catalog_total_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_total_timeout_secs)
    }

    pub fn cache_refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_timeout_secs)
    }

    pub fn background_grace(&self) -> Duration {
        Duration::from_secs(self.background_grace_secs)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_provider_contract() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.near_location_radius, 25000);
        assert_eq!(config.personalized_timeout(), Duration::from_secs(5));
        assert_eq!(config.catalog_total_timeout(), Duration::from_secs(30));
        assert_eq!(config.catalog_version, "20241227");
        assert_eq!(config.personalized_version, "20240101");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base": "http://localhost:9000", "default_limit": 10}"#).unwrap();

        let config = DiscoveryConfig::from_file(&path).unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.cache_refresh_timeout_secs, 10);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = DiscoveryConfig {
            api_base: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint("v3/places/search"), "http://localhost:9000/v3/places/search");
        assert_eq!(config.endpoint("/v2/venues/1/related"), "http://localhost:9000/v2/venues/1/related");
    }
}
