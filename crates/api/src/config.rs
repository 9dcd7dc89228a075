//! Application configuration loaded from environment variables.

use checkout::StorefrontConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `5`)
/// - `GUEST_COOKIE_MAX_AGE_DAYS` — lifetime of the guest cookie (default: `30`)
/// - `MAX_CONFLICT_RETRIES` — replays after a lost cart version race (default: `3`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub guest_cookie_max_age_days: u64,
    pub max_conflict_retries: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(
                lookup("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            ),
            guest_cookie_max_age_days: parse_or(
                lookup("GUEST_COOKIE_MAX_AGE_DAYS"),
                defaults.guest_cookie_max_age_days,
            ),
            max_conflict_retries: parse_or(
                lookup("MAX_CONFLICT_RETRIES"),
                defaults.max_conflict_retries,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Guest cookie lifetime in seconds.
    pub fn guest_cookie_max_age_secs(&self) -> u64 {
        self.guest_cookie_max_age_days.saturating_mul(24 * 60 * 60)
    }

    /// Settings for the cart and checkout services.
    pub fn storefront(&self) -> StorefrontConfig {
        StorefrontConfig {
            max_conflict_retries: self.max_conflict_retries,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            guest_cookie_max_age_days: 30,
            max_conflict_retries: 3,
        }
    }
}
