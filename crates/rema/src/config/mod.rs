use crate::inventory::catalog::DEFAULT_FACET_TTL;
use crate::inventory::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::valuation::classifier::DEFAULT_THRESHOLD_PCT;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

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
    pub valuation: ValuationConfig,
    pub inventory: InventoryConfig,
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

        let model_path = env::var("REMA_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_path());
        let threshold_pct: f64 = parse_var("REMA_VALUATION_THRESHOLD_PCT", DEFAULT_THRESHOLD_PCT)?;
        if !threshold_pct.is_finite() || threshold_pct <= 0.0 {
            return Err(ConfigError::InvalidNumber {
                key: "REMA_VALUATION_THRESHOLD_PCT",
                value: threshold_pct.to_string(),
            });
        }

        let data_path = env::var("REMA_INVENTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_inventory_path());
        let currency = env::var("REMA_CURRENCY")
            .map(|value| value.trim().to_ascii_uppercase())
            .unwrap_or_else(|_| "JOD".to_string());
        let default_page_size: usize = parse_var("REMA_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_page_size: usize = parse_var("REMA_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?;
        if default_page_size == 0 || default_page_size > max_page_size {
            return Err(ConfigError::InvalidNumber {
                key: "REMA_DEFAULT_PAGE_SIZE",
                value: default_page_size.to_string(),
            });
        }
        let facet_cache_ttl_secs: u64 =
            parse_var("REMA_FACET_CACHE_TTL_SECS", DEFAULT_FACET_TTL.as_secs())?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            valuation: ValuationConfig {
                model_path,
                threshold_pct,
            },
            inventory: InventoryConfig {
                data_path,
                currency,
                default_page_size,
                max_page_size,
                facet_cache_ttl: Duration::from_secs(facet_cache_ttl_secs),
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Location of the hedonic model artifact shipped with the crate.
pub fn default_model_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/hedonic_model.json"))
}

/// Location of the sample inventory shipped with the crate.
pub fn default_inventory_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sample_inventory.csv"))
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

/// Model artifact location and the single valuation band threshold.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    pub model_path: PathBuf,
    pub threshold_pct: f64,
}

/// Inventory source and query limits.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub data_path: PathBuf,
    pub currency: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub facet_cache_ttl: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
