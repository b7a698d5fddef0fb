use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

use crate::workflows::nomination::{PortalSettings, UploadPolicy};

const DEVELOPMENT_ADMIN_PASSWORD: &str = "change-me";

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
    pub portal: PortalConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig::load(environment)?,
        })
    }
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

/// Portal-specific knobs: public links, the upload bucket, and admin access.
#[derive(Clone)]
pub struct PortalConfig {
    pub public_base_url: String,
    pub storage_base_url: String,
    pub admin_password: String,
    pub form_access_code: Option<String>,
    pub session_ttl: Duration,
    pub draft_ttl: Duration,
}

impl PortalConfig {
    fn load(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let public_base_url = env::var("PORTAL_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let storage_base_url = env::var("PORTAL_STORAGE_BASE_URL").unwrap_or_else(|_| {
            format!(
                "{}/storage/v1/object/public/tops-uploads",
                public_base_url.trim_end_matches('/')
            )
        });

        let admin_password = match non_empty_var("PORTAL_ADMIN_PASSWORD") {
            Some(password) => password,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingAdminPassword)
            }
            None => DEVELOPMENT_ADMIN_PASSWORD.to_string(),
        };

        Ok(Self {
            public_base_url,
            storage_base_url,
            admin_password,
            form_access_code: non_empty_var("PORTAL_FORM_ACCESS_CODE"),
            session_ttl: seconds_var("PORTAL_SESSION_TTL_SECS", 8 * 60 * 60)?,
            draft_ttl: seconds_var("PORTAL_DRAFT_TTL_SECS", 2 * 60 * 60)?,
        })
    }

    pub fn settings(&self) -> PortalSettings {
        PortalSettings {
            public_base_url: self.public_base_url.trim_end_matches('/').to_string(),
            upload_policy: UploadPolicy::default(),
        }
    }
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("public_base_url", &self.public_base_url)
            .field("storage_base_url", &self.storage_base_url)
            .field("admin_password", &"<redacted>")
            .field("form_access_code", &self.form_access_code.as_ref().map(|_| "<redacted>"))
            .field("session_ttl", &self.session_ttl)
            .field("draft_ttl", &self.draft_ttl)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(key: &'static str, default: i64) -> Result<Duration, ConfigError> {
    let Some(raw) = non_empty_var(key) else {
        return Ok(Duration::seconds(default));
    };
    match raw.parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::seconds(secs)),
        _ => Err(ConfigError::InvalidDuration { key }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDuration { key: &'static str },
    MissingAdminPassword,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { key } => {
                write!(f, "{key} must be a positive number of seconds")
            }
            ConfigError::MissingAdminPassword => {
                write!(f, "PORTAL_ADMIN_PASSWORD is required in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDuration { .. }
            | ConfigError::MissingAdminPassword => None,
        }
    }
}
