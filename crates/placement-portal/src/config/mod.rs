use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
            portal: PortalConfig::from_env()?,
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

/// Placement rules that vary between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// When false, only the cgpa floor gates which jobs a student sees.
    pub enforce_branch_eligibility: bool,
    pub jobs_per_page: usize,
    pub require_email_verification: bool,
    /// Redirect handed to the identity provider for sign-up confirmation links.
    pub site_url: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            enforce_branch_eligibility: true,
            jobs_per_page: 12,
            require_email_verification: false,
            site_url: "http://127.0.0.1:3000/".to_string(),
        }
    }
}

impl PortalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let enforce_branch_eligibility = read_flag(
            "PORTAL_ENFORCE_BRANCH_ELIGIBILITY",
            defaults.enforce_branch_eligibility,
        )?;
        let require_email_verification = read_flag(
            "PORTAL_REQUIRE_EMAIL_VERIFICATION",
            defaults.require_email_verification,
        )?;

        let jobs_per_page = match env::var("PORTAL_JOBS_PER_PAGE") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidPageSize),
            },
            Err(_) => defaults.jobs_per_page,
        };

        let site_url = env::var("PORTAL_SITE_URL").unwrap_or(defaults.site_url);

        Ok(Self {
            enforce_branch_eligibility,
            jobs_per_page,
            require_email_verification,
            site_url,
        })
    }
}

fn read_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str },
    InvalidPageSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name } => {
                write!(f, "{name} must be one of true/false/1/0/yes/no/on/off")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "PORTAL_JOBS_PER_PAGE must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidPageSize => None,
        }
    }
}
