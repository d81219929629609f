use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string. Without it the server runs on the
    /// in-memory store and loses its data on restart.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long background services get to drain after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Upper bound on every store call made while serving a request.
    pub store_timeout_secs: u64,
    /// Period of the published-to-completed sweep.
    pub completion_sweep_interval_secs: u64,
    pub log_format: LogFormat,
    pub jwt: JwtConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `DATABASE_URL`                   | unset (in-memory store) |
    /// | `HOST`                           | `0.0.0.0`               |
    /// | `PORT`                           | `3000`                  |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                    |
    /// | `STORE_TIMEOUT_SECS`             | `10`                    |
    /// | `COMPLETION_SWEEP_INTERVAL_SECS` | `300`                   |
    /// | `LOG_FORMAT`                     | `pretty` (or `json`)    |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on malformed numeric values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            database_url,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            store_timeout_secs: env_or("STORE_TIMEOUT_SECS", 10),
            completion_sweep_interval_secs: env_or("COMPLETION_SWEEP_INTERVAL_SECS", 300),
            log_format: LogFormat::parse(
                &std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()),
            ),
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn completion_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.completion_sweep_interval_secs)
    }
}
