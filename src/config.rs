use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::llm::ProviderConfig;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub embedding_cache: EmbeddingCacheConfig,
    pub embedding_provider: EmbeddingProviderConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Timeout budget and arbitration thresholds for the search pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub soft_timeout_ms: u64,
    pub hard_timeout_ms: u64,
    /// Below this regex confidence the hybrid extractor considers calling
    /// the LLM.
    pub regex_confidence_threshold: f64,
    pub default_max_results: u32,
}

impl PipelineConfig {
    pub fn soft_timeout(&self) -> Duration {
        Duration::from_millis(self.soft_timeout_ms)
    }

    pub fn hard_timeout(&self) -> Duration {
        Duration::from_millis(self.hard_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingCacheConfig {
    pub capacity: usize,
    pub ttl_minutes: u64,
}

impl EmbeddingCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
    pub api_base: String,
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub providers: Vec<ProviderConfig>,
    pub circuit_failure_threshold: u32,
    pub circuit_cooldown_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { providers: Vec::new(), circuit_failure_threshold: 5, circuit_cooldown_ms: 30_000 }
    }
}

impl LlmConfig {
    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_cooldown_ms)
    }
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone)]
#[command(name = "nl-search-pipeline")]
#[command(version, about = "Natural-language community search pipeline")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Logging level (overrides config file, e.g., "info,nl_search_pipeline=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Pipeline soft timeout in milliseconds (overrides config file)
    #[arg(long, value_name = "MS")]
    pub pipeline_soft_timeout_ms: Option<u64>,

    /// Pipeline hard timeout in milliseconds (overrides config file)
    #[arg(long, value_name = "MS")]
    pub pipeline_hard_timeout_ms: Option<u64>,

    /// Default max results per search (overrides config file)
    #[arg(long, value_name = "N")]
    pub default_max_results: Option<u32>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(&cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL
    /// - APP_LOG_LEVEL
    /// - APP_PIPELINE_SOFT_TIMEOUT_MS / APP_PIPELINE_HARD_TIMEOUT_MS
    /// - APP_DEFAULT_MAX_RESULTS
    ///
    /// LLM provider API keys are never read here: each `ProviderConfig`
    /// names its own `api_key_env` and the gateway reads it at call time.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(ms) = std::env::var("APP_PIPELINE_SOFT_TIMEOUT_MS")
            && let Ok(ms) = ms.parse()
        {
            self.pipeline.soft_timeout_ms = ms;
            tracing::info!("Override pipeline.soft_timeout_ms from env: {}", ms);
        }

        if let Ok(ms) = std::env::var("APP_PIPELINE_HARD_TIMEOUT_MS")
            && let Ok(ms) = ms.parse()
        {
            self.pipeline.hard_timeout_ms = ms;
            tracing::info!("Override pipeline.hard_timeout_ms from env: {}", ms);
        }

        if let Ok(n) = std::env::var("APP_DEFAULT_MAX_RESULTS")
            && let Ok(n) = n.parse()
        {
            self.pipeline.default_max_results = n;
            tracing::info!("Override pipeline.default_max_results from env: {}", n);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(db_url) = &args.database_url {
            self.database.url = db_url.clone();
            tracing::info!("Override database.url from CLI");
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(ms) = args.pipeline_soft_timeout_ms {
            self.pipeline.soft_timeout_ms = ms;
            tracing::info!("Override pipeline.soft_timeout_ms from CLI: {}", ms);
        }

        if let Some(ms) = args.pipeline_hard_timeout_ms {
            self.pipeline.hard_timeout_ms = ms;
            tracing::info!("Override pipeline.hard_timeout_ms from CLI: {}", ms);
        }

        if let Some(n) = args.default_max_results {
            self.pipeline.default_max_results = n;
            tracing::info!("Override pipeline.default_max_results from CLI: {}", n);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.pipeline.soft_timeout_ms == 0 || self.pipeline.hard_timeout_ms == 0 {
            anyhow::bail!("pipeline timeouts must be > 0");
        }
        if self.pipeline.soft_timeout_ms > self.pipeline.hard_timeout_ms {
            anyhow::bail!("pipeline.soft_timeout_ms must be <= pipeline.hard_timeout_ms");
        }
        if !(0.0..=1.0).contains(&self.pipeline.regex_confidence_threshold) {
            anyhow::bail!("pipeline.regex_confidence_threshold must be within [0, 1]");
        }
        if self.pipeline.default_max_results == 0 {
            anyhow::bail!("pipeline.default_max_results must be > 0");
        }

        if self.embedding_cache.capacity == 0 {
            anyhow::bail!("embedding_cache.capacity must be > 0");
        }

        if self.embedding_provider.dimension == 0 {
            anyhow::bail!("embedding_provider.dimension must be > 0");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/nl_search.db".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,nl_search_pipeline=debug".to_string(),
            file: Some("logs/nl_search_pipeline.log".to_string()),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            soft_timeout_ms: 3_000,
            hard_timeout_ms: 10_000,
            regex_confidence_threshold: 0.6,
            default_max_results: 10,
        }
    }
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self { capacity: 10_000, ttl_minutes: 60 }
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            model: "text-embedding-nomic-embed-text-v1.5".to_string(),
            dimension: 768,
        }
    }
}
