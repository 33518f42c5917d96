use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Where rounds, bets and user apps are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Round timing rules
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub admin_token: Option<String>,
    pub round_inactivity_timeout_secs: i64,
    pub max_round_duration_secs: i64,
    pub bet_time_extension_secs: i64,
    pub recent_bets_limit: usize,
}

/// Background job schedule and payout rules
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub enabled: bool,
    pub end_round_interval_secs: u64,
    pub payout_interval_secs: u64,
    pub payout_batch_size: i64,
    pub house_cut_percent: u32,
}

/// Algorand node and hot wallet settings
#[derive(Debug, Clone)]
pub struct AlgorandConfig {
    pub algod_node: String,
    pub algod_token: String,
    pub hot_wallet_mnemonic: Option<String>,
}

/// Image generation settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_model: String,
}

/// Generated HTML content storage
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub base_dir: String,
    pub public_base_url: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageBackend,
    pub game: GameConfig,
    pub jobs: JobsConfig,
    pub algorand: AlgorandConfig,
    pub openai: OpenAiConfig,
    pub content: ContentConfig,
    pub log_level: String,
    pub log_json: bool,
    pub http_port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub environment: String,
}

/// Read a variable, treating blank values as unset
fn lookup_non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn lookup_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup_non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create database config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup_non_empty(&lookup, "DATABASE_URL")
            .ok_or("DATABASE_URL environment variable is required")?;

        let max_connections = lookup_parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let acquire_timeout_secs = lookup_parsed(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64)?;
        let idle_timeout_secs = lookup_parsed(&lookup, "DATABASE_IDLE_TIMEOUT_SECS", 600u64)?; // 10 minutes
        let max_lifetime_secs = lookup_parsed(&lookup, "DATABASE_MAX_LIFETIME_SECS", 1800u64)?; // 30 minutes
        let test_before_acquire = lookup_parsed(&lookup, "DATABASE_TEST_BEFORE_ACQUIRE", true)?;

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/algofomo".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl GameConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            admin_token: lookup_non_empty(lookup, "ADMIN_TOKEN"),
            round_inactivity_timeout_secs: lookup_parsed(lookup, "ROUND_INACTIVITY_TIMEOUT_SEC", 1200i64)?,
            max_round_duration_secs: lookup_parsed(lookup, "MAX_ROUND_DURATION_SEC", 86400i64)?,
            bet_time_extension_secs: lookup_parsed(lookup, "BET_TIME_EXTENSION_SEC", 60i64)?,
            recent_bets_limit: lookup_parsed(lookup, "RECENT_BETS_LIMIT", 10usize)?,
        };

        if config.round_inactivity_timeout_secs <= 0 || config.max_round_duration_secs <= 0 {
            return Err("Round timeouts must be greater than 0".to_string());
        }
        if config.bet_time_extension_secs < 0 {
            return Err("BET_TIME_EXTENSION_SEC must not be negative".to_string());
        }

        Ok(config)
    }

    pub fn inactivity_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.round_inactivity_timeout_secs)
    }

    pub fn max_round_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_round_duration_secs)
    }

    pub fn bet_time_extension(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.bet_time_extension_secs)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            round_inactivity_timeout_secs: 1200, // 20 minutes
            max_round_duration_secs: 86400,      // 24 hours
            bet_time_extension_secs: 60,
            recent_bets_limit: 10,
        }
    }
}

impl JobsConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            enabled: lookup_parsed(lookup, "ENABLE_BACKGROUND_JOBS", true)?,
            end_round_interval_secs: lookup_parsed(lookup, "END_ROUND_INTERVAL_SECS", 60u64)?,
            payout_interval_secs: lookup_parsed(lookup, "PAYOUT_INTERVAL_SECS", 300u64)?,
            payout_batch_size: lookup_parsed(lookup, "PAYOUT_BATCH_SIZE", 5i64)?,
            house_cut_percent: lookup_parsed(lookup, "HOUSE_CUT_PERCENT", 10u32)?,
        };

        if config.end_round_interval_secs == 0 || config.payout_interval_secs == 0 {
            return Err("Job intervals must be greater than 0".to_string());
        }
        if config.payout_batch_size <= 0 {
            return Err("PAYOUT_BATCH_SIZE must be greater than 0".to_string());
        }
        if config.house_cut_percent > 100 {
            return Err("HOUSE_CUT_PERCENT must be between 0 and 100".to_string());
        }

        Ok(config)
    }

    pub fn end_round_interval(&self) -> Duration {
        Duration::from_secs(self.end_round_interval_secs)
    }

    pub fn payout_interval(&self) -> Duration {
        Duration::from_secs(self.payout_interval_secs)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            end_round_interval_secs: 60,
            payout_interval_secs: 300,
            payout_batch_size: 5,
            house_cut_percent: 10,
        }
    }
}

impl Default for AlgorandConfig {
    fn default() -> Self {
        Self {
            algod_node: "https://mainnet-api.algonode.cloud".to_string(),
            algod_token: String::new(),
            hot_wallet_mnemonic: None,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            image_model: "dall-e-3".to_string(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_dir: "./content".to_string(),
            public_base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create application config from a fixed set of variables
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, String> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Create application config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup_non_empty(&lookup, "STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(format!(
                    "Invalid STORAGE_BACKEND: {}. Must be one of: [\"postgres\", \"memory\"]",
                    other
                ))
            }
        };

        let database = match storage {
            StorageBackend::Postgres => DatabaseConfig::from_lookup(&lookup)?,
            StorageBackend::Memory => DatabaseConfig::default(),
        };

        let log_level = lookup_non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup_non_empty(&lookup, "LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let http_port = lookup_parsed(&lookup, "HTTP_PORT", 8000u16)?;

        let environment =
            lookup_non_empty(&lookup, "ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let cors_allowed_origins = lookup_non_empty(&lookup, "CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let game = GameConfig::from_lookup(&lookup)?;
        let jobs = JobsConfig::from_lookup(&lookup)?;

        let algorand = AlgorandConfig {
            algod_node: lookup_non_empty(&lookup, "ALGOD_NODE")
                .unwrap_or_else(|| AlgorandConfig::default().algod_node),
            algod_token: lookup_non_empty(&lookup, "ALGOD_TOKEN").unwrap_or_default(),
            hot_wallet_mnemonic: lookup_non_empty(&lookup, "HOT_WALLET_MNEMONIC"),
        };

        let openai_defaults = OpenAiConfig::default();
        let openai = OpenAiConfig {
            api_key: lookup_non_empty(&lookup, "OPENAI_API_KEY"),
            base_url: lookup_non_empty(&lookup, "OPENAI_BASE_URL").unwrap_or(openai_defaults.base_url),
            image_model: lookup_non_empty(&lookup, "OPENAI_IMAGE_MODEL")
                .unwrap_or(openai_defaults.image_model),
        };

        let content_defaults = ContentConfig::default();
        let content = ContentConfig {
            base_dir: lookup_non_empty(&lookup, "CONTENT_BASE_DIR").unwrap_or(content_defaults.base_dir),
            public_base_url: lookup_non_empty(&lookup, "CONTENT_PUBLIC_BASE_URL")
                .unwrap_or(content_defaults.public_base_url)
                .trim_end_matches('/')
                .to_string(),
        };

        let config = Self {
            database,
            storage,
            game,
            jobs,
            algorand,
            openai,
            content,
            log_level: log_level.to_lowercase(),
            log_json,
            http_port,
            cors_allowed_origins,
            environment: environment.to_lowercase(),
        };

        if config.is_production() && config.game.admin_token.is_none() {
            return Err("ADMIN_TOKEN is required in production".to_string());
        }

        Ok(config)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            storage: StorageBackend::Postgres,
            game: GameConfig::default(),
            jobs: JobsConfig::default(),
            algorand: AlgorandConfig::default(),
            openai: OpenAiConfig::default(),
            content: ContentConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
            http_port: 8000,
            cors_allowed_origins: vec!["*".to_string()],
            environment: "development".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.game.round_inactivity_timeout_secs, 1200);
        assert_eq!(config.game.max_round_duration_secs, 86400);
        assert_eq!(config.game.bet_time_extension_secs, 60);
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        let err = AppConfig::from_map(&vars(&[])).unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = AppConfig::from_map(&vars(&[("STORAGE_BACKEND", "memory")])).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.jobs.payout_batch_size, 5);
        assert_eq!(config.jobs.house_cut_percent, 10);
        assert!(config.game.admin_token.is_none());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = AppConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://db/algofomo"),
            ("HTTP_PORT", "9000"),
            ("ADMIN_TOKEN", " secret "),
            ("BET_TIME_EXTENSION_SEC", "30"),
            ("LOG_FORMAT", "json"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();

        assert_eq!(config.database_url(), "postgres://db/algofomo");
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.game.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.game.bet_time_extension_secs, 30);
        assert!(config.log_json);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_map(&vars(&[("STORAGE_BACKEND", "memory"), ("HTTP_PORT", "port")]))
            .unwrap_err();
        assert!(err.contains("HTTP_PORT"));

        let err = AppConfig::from_map(&vars(&[("STORAGE_BACKEND", "memory"), ("LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(err.contains("LOG_LEVEL"));

        let err = AppConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "memory"),
            ("HOUSE_CUT_PERCENT", "150"),
        ]))
        .unwrap_err();
        assert!(err.contains("HOUSE_CUT_PERCENT"));
    }

    #[test]
    fn test_production_requires_admin_token() {
        let err = AppConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "memory"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap_err();
        assert!(err.contains("ADMIN_TOKEN"));
    }
}
