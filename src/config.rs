/*
 * Responsibility
 * - Load settings from the environment (.env via dotenvy)
 * - Validate them up front (missing / invalid values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Path namespace reserved for administrative routes.
///
/// Matches on whole segments: `/api/v1/admin` covers `/api/v1/admin` and
/// `/api/v1/admin/users`, but not `/api/v1/administrators`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrefix(String);

impl AdminPrefix {
    pub const DEFAULT: &'static str = "/api/v1/admin";

    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        let trimmed = prefix.trim().trim_end_matches('/');
        // also mounted as a route prefix, so no path parameters or wildcards
        let routable = !trimmed
            .chars()
            .any(|c| matches!(c, '{' | '}' | '*') || c.is_whitespace());
        if !trimmed.starts_with('/') || trimmed.len() < 2 || !routable {
            return Err(ConfigError::Invalid("ADMIN_PATH_PREFIX"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl Default for AdminPrefix {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt_secret: Vec<u8>,
    pub access_token_ttl_seconds: u64,

    pub admin_prefix: AdminPrefix,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("admin_prefix", &self.admin_prefix)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the process env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let jwt_secret = lookup("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        let jwt_secret = STANDARD
            .decode(jwt_secret.trim())
            .map_err(|_| ConfigError::Invalid("JWT_SECRET_KEY"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET_KEY"));
        }

        let access_token_ttl_seconds = match lookup("ACCESS_TOKEN_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => 60 * 60, // 60 min
        };

        let admin_prefix = match lookup("ADMIN_PATH_PREFIX") {
            Some(raw) => AdminPrefix::new(&raw)?,
            None => AdminPrefix::default(),
        };

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            access_token_ttl_seconds,
            admin_prefix,
        })
    }
}
