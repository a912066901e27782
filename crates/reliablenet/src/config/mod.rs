use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::reviews::UserId;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub badges: BadgeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_tokens = parse_api_tokens(&env::var("RELIABLENET_API_TOKENS").unwrap_or_default())?;
        let moderators = parse_list(&env::var("RELIABLENET_MODERATORS").unwrap_or_default())
            .map(|value| UserId(value.to_string()))
            .collect();

        let recompute_mode = RecomputeMode::parse(
            &env::var("RELIABLENET_RECOMPUTE_MODE").unwrap_or_else(|_| "queued".to_string()),
        )?;
        let queue_depth = env::var("RELIABLENET_RECOMPUTE_QUEUE_DEPTH")
            .unwrap_or_else(|_| "256".to_string())
            .parse::<usize>()
            .ok()
            .filter(|depth| *depth > 0)
            .ok_or(ConfigError::InvalidQueueDepth)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                api_tokens,
                moderators,
            },
            badges: BadgeConfig {
                recompute_mode,
                queue_depth,
            },
        })
    }
}

fn parse_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

fn parse_api_tokens(raw: &str) -> Result<BTreeMap<String, UserId>, ConfigError> {
    let mut tokens = BTreeMap::new();
    for entry in parse_list(raw) {
        let (user, token) = entry
            .split_once(':')
            .map(|(user, token)| (user.trim(), token.trim()))
            .filter(|(user, token)| !user.is_empty() && !token.is_empty())
            .ok_or_else(|| ConfigError::InvalidApiToken {
                entry: entry.to_string(),
            })?;
        tokens.insert(token.to_string(), UserId(user.to_string()));
    }
    Ok(tokens)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bearer tokens accepted by mutating routes, keyed by token.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub api_tokens: BTreeMap<String, UserId>,
    pub moderators: BTreeSet<UserId>,
}

/// How badge recomputation is triggered after data changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeMode {
    /// Run the pipeline inside the triggering request.
    Inline,
    /// Hand the complex id to a background worker.
    Queued,
}

impl RecomputeMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" | "sync" => Ok(Self::Inline),
            "queued" | "queue" | "async" => Ok(Self::Queued),
            other => Err(ConfigError::InvalidRecomputeMode {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BadgeConfig {
    pub recompute_mode: RecomputeMode,
    pub queue_depth: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApiToken { entry: String },
    InvalidRecomputeMode { value: String },
    InvalidQueueDepth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiToken { entry } => write!(
                f,
                "RELIABLENET_API_TOKENS entry '{entry}' must look like user_id:token"
            ),
            ConfigError::InvalidRecomputeMode { value } => write!(
                f,
                "RELIABLENET_RECOMPUTE_MODE '{value}' must be 'inline' or 'queued'"
            ),
            ConfigError::InvalidQueueDepth => write!(
                f,
                "RELIABLENET_RECOMPUTE_QUEUE_DEPTH must be a positive integer"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApiToken { .. }
            | ConfigError::InvalidRecomputeMode { .. }
            | ConfigError::InvalidQueueDepth => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("RELIABLENET_API_TOKENS");
        env::remove_var("RELIABLENET_MODERATORS");
        env::remove_var("RELIABLENET_RECOMPUTE_MODE");
        env::remove_var("RELIABLENET_RECOMPUTE_QUEUE_DEPTH");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.auth.api_tokens.is_empty());
        assert_eq!(config.badges.recompute_mode, RecomputeMode::Queued);
        assert_eq!(config.badges.queue_depth, 256);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn parses_tokens_and_moderators() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RELIABLENET_API_TOKENS", "alex:tok-1, sam:tok-2");
        env::set_var("RELIABLENET_MODERATORS", "sam");
        env::set_var("RELIABLENET_RECOMPUTE_MODE", "inline");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.auth.api_tokens.get("tok-2"),
            Some(&UserId("sam".to_string()))
        );
        assert!(config.auth.moderators.contains(&UserId("sam".to_string())));
        assert_eq!(config.badges.recompute_mode, RecomputeMode::Inline);
        reset_env();
    }

    #[test]
    fn rejects_token_without_user() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RELIABLENET_API_TOKENS", "just-a-token");
        match AppConfig::load() {
            Err(ConfigError::InvalidApiToken { entry }) => assert_eq!(entry, "just-a-token"),
            other => panic!("expected invalid token error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_zero_queue_depth() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RELIABLENET_RECOMPUTE_QUEUE_DEPTH", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidQueueDepth)
        ));
        reset_env();
    }
}
