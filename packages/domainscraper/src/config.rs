use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Parallel requests inside a single getter
    pub fetch_concurrency: usize,
    pub http_timeout: Duration,
    pub http_user_agent: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup, applying defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://results.db".to_string()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            fetch_concurrency: match lookup("FETCH_CONCURRENCY") {
                Some(raw) => raw
                    .parse()
                    .context("FETCH_CONCURRENCY must be a valid number")?,
                None => default_fetch_concurrency(),
            },
            http_timeout: Duration::from_secs(
                lookup("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("HTTP_TIMEOUT_SECS must be a valid number")?,
            ),
            http_user_agent: lookup("HTTP_USER_AGENT")
                .unwrap_or_else(|| format!("domainscraper/{}", env!("CARGO_PKG_VERSION"))),
        })
    }

    /// Replace the database location (command line override).
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }
}

// Fetching is I/O bound, so allow far more requests than cores
fn default_fetch_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        * 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.database_url, "sqlite://results.db");
        assert_eq!(config.database_max_connections, 5);
        assert!(config.fetch_concurrency >= 8);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.http_user_agent.starts_with("domainscraper/"));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("FETCH_CONCURRENCY", "3"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ])
        .unwrap()
        .with_database_url(Some("sqlite://other.db".to_string()));

        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.fetch_concurrency, 3);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = config(&[("DATABASE_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}
