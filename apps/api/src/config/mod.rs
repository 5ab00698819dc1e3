use crate::error::{ApiError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{collections::HashMap, env, path::PathBuf};

/// Activity synonyms used when no table is configured.
///
/// Keys are the lower-cased activities a caller may request; values are the
/// catalog activity tags that count as the same occasion.
static DEFAULT_ACTIVITY_SYNONYMS: Lazy<HashMap<String, Vec<String>>> = Lazy::new(|| {
    [
        ("work", &["work", "office", "business"][..]),
        ("gym", &["gym", "sports", "athletic", "workout"][..]),
        ("party", &["party", "social events", "night out"][..]),
        ("social events", &["party", "social events"][..]),
        ("formal occasions", &["party", "work", "formal occasions"][..]),
        ("lounging", &["lounging", "lounge", "home"][..]),
        (
            "outdoor",
            &["outdoor", "sports", "casual outing", "casual outings"][..],
        ),
        ("casual outing", &["casual outing", "casual outings", "outdoor"][..]),
        ("casual outings", &["casual outing", "casual outings", "outdoor"][..]),
    ]
    .into_iter()
    .map(|(activity, synonyms)| {
        (
            activity.to_string(),
            synonyms.iter().map(|s| s.to_string()).collect(),
        )
    })
    .collect()
});

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// How many candidate images are embedded at once per request
    pub extraction_concurrency: usize,
    /// JSON catalog of outfits; when set it replaces the Mongo store
    pub catalog_path: Option<PathBuf>,
    pub huggingface: HuggingFaceConfig,
    pub mongo: MongoConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Base URL of the Atlas Data API, e.g. `https://data.mongodb-api.com/app/<app-id>/endpoint/data/v1`
    pub data_api_url: String,
    pub api_key: String,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    pub candidate_limit: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub activity_boost: f32,
    pub comfort_boost: f32,
    pub formality_boost: f32,
    /// An outfit counts as layered when it has more item categories than this
    pub layered_min_items: usize,
    pub activity_synonyms: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            extraction_concurrency: 4,
            catalog_path: None,
            huggingface: HuggingFaceConfig::default(),
            mongo: MongoConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            model_name: "google/vit-base-patch16-224".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 15,
            retry_attempts: 3,
            retry_delay_ms: 500,
            cache_size: 256,
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            data_api_url: String::new(),
            api_key: String::new(),
            data_source: "Cluster0".to_string(),
            database: "test".to_string(),
            collection: "outfits".to_string(),
            candidate_limit: 100,
            timeout_seconds: 15,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            activity_boost: 1.3,
            comfort_boost: 1.2,
            formality_boost: 1.1,
            layered_min_items: 2,
            activity_synonyms: DEFAULT_ACTIVITY_SYNONYMS.clone(),
        }
    }
}

impl Config {
    /// Load and validate configuration.
    pub fn load() -> Result<Self> {
        let config = Self::from_sources()?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from `config/default.*` (optional) and `APP_*`
    /// environment variables, nested sections separated by `__`, without
    /// validating it.
    pub fn from_sources() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        // Hosting platforms hand out the port through a bare PORT variable
        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ApiError::ConfigError(format!("Invalid PORT value: {}", port)))?;
        }

        Ok(config)
    }

    /// Check that the adapters this configuration selects can be built.
    pub fn validate(&self) -> Result<()> {
        if self.extraction_concurrency == 0 {
            return Err(ApiError::ConfigError(
                "extraction_concurrency must be at least 1".to_string(),
            ));
        }

        if self.huggingface.api_key.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "Missing APP_HUGGINGFACE__API_KEY".to_string(),
            ));
        }

        if self.catalog_path.is_none() {
            if self.mongo.data_api_url.trim().is_empty() {
                return Err(ApiError::ConfigError(
                    "Set APP_MONGO__DATA_API_URL or APP_CATALOG_PATH".to_string(),
                ));
            }
            if self.mongo.api_key.trim().is_empty() {
                return Err(ApiError::ConfigError(
                    "Missing APP_MONGO__API_KEY".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.huggingface.api_key = "hf_test".to_string();
        config.catalog_path = Some(PathBuf::from("catalog.json"));
        config
    }

    #[test]
    fn test_default_scoring_constants() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.activity_boost, 1.3);
        assert_eq!(scoring.comfort_boost, 1.2);
        assert_eq!(scoring.formality_boost, 1.1);
        assert_eq!(scoring.layered_min_items, 2);
        assert_eq!(
            scoring.activity_synonyms["outdoor"],
            vec!["outdoor", "sports", "casual outing", "casual outings"]
        );
    }

    #[test]
    fn test_catalog_replaces_mongo_credentials() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_mongo_credentials_required_without_catalog() {
        let mut config = valid_config();
        config.catalog_path = None;
        assert!(matches!(config.validate(), Err(ApiError::ConfigError(_))));

        config.mongo.data_api_url = "https://data.example.com/v1".to_string();
        config.mongo.api_key = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_huggingface_key_rejected() {
        let mut config = valid_config();
        config.huggingface.api_key = "   ".to_string();
        assert!(matches!(config.validate(), Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = valid_config();
        config.extraction_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
