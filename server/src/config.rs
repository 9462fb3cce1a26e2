//! Configuration management for the storefront server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Only the identity backend location and key are required.

use anyhow::{Context, bail};
use serde::Serialize;
use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Hosted backend configuration
    pub supabase: SupabaseConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Session coordinator configuration
    pub session: SessionSettings,
}

/// Hosted backend configuration
#[derive(Clone, Serialize)]
pub struct SupabaseConfig {
    /// Project URL (`SUPABASE_URL`)
    pub url: String,
    /// Public anon key (`SUPABASE_ANON_KEY`)
    #[serde(skip)]
    pub anon_key: String,
    /// Collection products are read from (`PRODUCTS_TABLE`, default `products`)
    pub products_table: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("products_table", &self.products_table)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Host to bind to (`HOST`, default `127.0.0.1`)
    ///
    /// The server fronts one process-wide session, so it listens on
    /// loopback unless told otherwise.
    pub host: String,
    /// Port to bind to (`PORT`, default 8080)
    pub port: u16,
    /// Graceful shutdown timeout in seconds (`SHUTDOWN_TIMEOUT`, default 30)
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Session coordinator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SessionSettings {
    /// Sign-in/up/out round-trip timeout in seconds (`SESSION_REQUEST_TIMEOUT`, default 10)
    pub request_timeout: u64,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if `SUPABASE_URL` or `SUPABASE_ANON_KEY` is missing,
    /// or if a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("{key} must be set"),
            }
        };

        Ok(Self {
            supabase: SupabaseConfig {
                url: required("SUPABASE_URL")?,
                anon_key: required("SUPABASE_ANON_KEY")?,
                products_table: lookup("PRODUCTS_TABLE")
                    .unwrap_or_else(|| "products".to_string()),
            },
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_or(&lookup, "PORT", 8080)?,
                shutdown_timeout: parse_or(&lookup, "SHUTDOWN_TIMEOUT", 30)?,
            },
            session: SessionSettings {
                request_timeout: parse_or(&lookup, "SESSION_REQUEST_TIMEOUT", 10)?,
            },
        })
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }

    /// Session request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.session.request_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is not valid: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.supabase.products_table, "products");
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("SHUTDOWN_TIMEOUT", "5"),
            ("SESSION_REQUEST_TIMEOUT", "2"),
            ("PRODUCTS_TABLE", "items"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.supabase.products_table, "items");
    }

    #[test]
    fn missing_backend_settings_fail() {
        let error = Config::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert_eq!(error.to_string(), "SUPABASE_URL must be set");

        let error = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "  "),
        ]))
        .unwrap_err();
        assert_eq!(error.to_string(), "SUPABASE_ANON_KEY must be set");
    }

    #[test]
    fn bad_port_is_reported() {
        let error = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(error.to_string().starts_with("PORT is not valid"));
    }

    #[test]
    fn anon_key_is_redacted() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "very-secret"),
        ]))
        .unwrap();
        assert!(!format!("{config:?}").contains("very-secret"));
    }
}
