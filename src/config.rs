//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// HTTP header name for API key authentication.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "postgres://lm:lm@localhost:5432/lifemonitor";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8000;
    pub const DB_MAX_CONNECTIONS: u32 = 10;
    pub const DB_MIN_CONNECTIONS: u32 = 1;
    pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const BUILD_CACHE_TTL_SECS: u64 = 10;
    pub const MAX_CRATE_SIZE: usize = 104_857_600; // 100MB per RO-Crate archive
    pub const MAX_LISTED_BUILDS: usize = 10;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// SeaORM connection URL (postgres://..., sqlite::memory:)
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Timeouts applied to every outbound HTTP client (CI backends, registries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(defaults::HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(defaults::HTTP_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpClientSettings {
    /// Build a reqwest client honouring both timeouts.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(concat!("lifemonitor/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection settings
    pub database: DatabaseSettings,
    /// Outbound HTTP client timeouts
    pub http: HttpClientSettings,
    /// How long CI job metadata may be served from cache (zero disables caching)
    pub build_cache_ttl: Duration,
    /// Maximum accepted RO-Crate archive size in bytes
    pub max_crate_size: usize,
    /// Maximum number of builds listed per test instance
    pub max_listed_builds: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `LM_HOST`: Server host (default: 127.0.0.1)
    /// - `LM_PORT`: Server port (default: 8000)
    /// - `DATABASE_URL`: Database connection string (required in production)
    /// - `LM_DB_MAX_CONNECTIONS` / `LM_DB_MIN_CONNECTIONS`: pool bounds (default: 10 / 1)
    /// - `LM_HTTP_CONNECT_TIMEOUT_SECS`: outbound connect timeout (default: 5)
    /// - `LM_HTTP_REQUEST_TIMEOUT_SECS`: outbound total timeout (default: 30)
    /// - `LM_BUILD_CACHE_TTL_SECS`: CI metadata cache TTL, 0 disables (default: 10)
    /// - `LM_MAX_CRATE_SIZE`: max RO-Crate download in bytes (default: 100MB)
    /// - `LM_MAX_LISTED_BUILDS`: builds listed per test instance (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("LM_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());
        let port = parse_var("LM_PORT", defaults::DEV_PORT, "LM_PORT must be a valid port number")?;

        let database = DatabaseSettings {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string()),
            max_connections: parse_var(
                "LM_DB_MAX_CONNECTIONS",
                defaults::DB_MAX_CONNECTIONS,
                "LM_DB_MAX_CONNECTIONS must be a valid number",
            )?,
            min_connections: parse_var(
                "LM_DB_MIN_CONNECTIONS",
                defaults::DB_MIN_CONNECTIONS,
                "LM_DB_MIN_CONNECTIONS must be a valid number",
            )?,
        };

        let http = HttpClientSettings {
            connect_timeout: Duration::from_secs(parse_var(
                "LM_HTTP_CONNECT_TIMEOUT_SECS",
                defaults::HTTP_CONNECT_TIMEOUT_SECS,
                "LM_HTTP_CONNECT_TIMEOUT_SECS must be a valid number",
            )?),
            request_timeout: Duration::from_secs(parse_var(
                "LM_HTTP_REQUEST_TIMEOUT_SECS",
                defaults::HTTP_REQUEST_TIMEOUT_SECS,
                "LM_HTTP_REQUEST_TIMEOUT_SECS must be a valid number",
            )?),
        };

        let build_cache_ttl = Duration::from_secs(parse_var(
            "LM_BUILD_CACHE_TTL_SECS",
            defaults::BUILD_CACHE_TTL_SECS,
            "LM_BUILD_CACHE_TTL_SECS must be a valid number",
        )?);

        let max_crate_size = parse_var(
            "LM_MAX_CRATE_SIZE",
            defaults::MAX_CRATE_SIZE,
            "LM_MAX_CRATE_SIZE must be a valid number",
        )?;

        let max_listed_builds = parse_var(
            "LM_MAX_LISTED_BUILDS",
            defaults::MAX_LISTED_BUILDS,
            "LM_MAX_LISTED_BUILDS must be a valid number",
        )?;

        let config = Config {
            environment,
            host,
            port,
            database,
            http,
            build_cache_ttl,
            max_crate_size,
            max_listed_builds,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database.url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set a production PostgreSQL URL.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            errors.push(
                "LM_DB_MIN_CONNECTIONS must not exceed LM_DB_MAX_CONNECTIONS".to_string(),
            );
        }

        if self.http.request_timeout.is_zero() {
            errors.push("LM_HTTP_REQUEST_TIMEOUT_SECS must be greater than zero".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
