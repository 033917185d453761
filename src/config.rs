use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// PostgreSQL connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// Process configuration, loaded once at startup and never mutated
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub server_addr: String,
    pub store_timeout: Duration,
    pub cleanup_interval: Duration,
    /// None selects the in-memory credential store
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let jwt_secret = require("JWT_SECRET")?;
        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let store_timeout = parse_secs(&get, "STORE_TIMEOUT_SECS", 5)?;
        let cleanup_interval = parse_secs(&get, "REFRESH_CLEANUP_INTERVAL_SECS", 60 * 60)?;

        let database = match get("POSTGRES_HOST") {
            Some(host) => Some(DatabaseConfig {
                username: require("POSTGRES_USER")?,
                password: require("POSTGRES_PASSWORD")?,
                host,
                port: parse_or(&get, "POSTGRES_PORT", 5432)?,
                database: require("POSTGRES_DB")?,
            }),
            None => None,
        };

        Ok(Self {
            jwt_secret,
            server_addr,
            store_timeout,
            cleanup_interval,
            database,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server_addr", &self.server_addr)
            .field("store_timeout", &self.store_timeout)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// A zero duration would panic the cleanup interval or expire every store call
fn parse_secs<G>(get: &G, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match parse_or(get, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}
