use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::eligibility::{AssetType, EligibilityRuleSet, PipelineSettings};

const DEFAULT_ASSET_TYPES: &str = "Flat,House,Dwelling,StudioFlat,SelfContainedBedsit";
const DEFAULT_TENURE_CODES: &str = "INT,SEC";
const MAX_CONCURRENT_LOOKUPS: u64 = 1024;

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
    pub rules: EligibilityRuleSet,
    pub pipeline: PipelineSettings,
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
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            rules: load_rules()?,
            pipeline: load_pipeline()?,
        })
    }
}

fn load_rules() -> Result<EligibilityRuleSet, ConfigError> {
    let asset_types = list_var("ELIGIBLE_ASSET_TYPES", DEFAULT_ASSET_TYPES)
        .into_iter()
        .map(|label| AssetType::from_label(&label).ok_or(ConfigError::UnknownAssetType(label)))
        .collect::<Result<Vec<_>, _>>()?;
    if asset_types.is_empty() {
        return Err(ConfigError::EmptyList("ELIGIBLE_ASSET_TYPES"));
    }

    let tenure_codes = list_var("ELIGIBLE_TENURE_CODES", DEFAULT_TENURE_CODES);
    if tenure_codes.is_empty() {
        return Err(ConfigError::EmptyList("ELIGIBLE_TENURE_CODES"));
    }

    Ok(EligibilityRuleSet::new(asset_types, tenure_codes))
}

fn load_pipeline() -> Result<PipelineSettings, ConfigError> {
    let max_concurrent_lookups = match number_var("APP_MAX_CONCURRENT_LOOKUPS", 8)? {
        limit if limit > MAX_CONCURRENT_LOOKUPS => {
            return Err(ConfigError::OutOfRange {
                name: "APP_MAX_CONCURRENT_LOOKUPS",
                max: MAX_CONCURRENT_LOOKUPS,
            })
        }
        limit => limit.max(1) as usize,
    };
    let request_timeout = match number_var("APP_REQUEST_TIMEOUT_SECS", 30)? {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(PipelineSettings {
        max_concurrent_lookups,
        request_timeout,
    })
}

fn list_var(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn number_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVariable(name))
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Base URL and key for one upstream API.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl ServiceEndpoint {
    fn load(uri_var: &'static str, key_var: &'static str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: required_var(uri_var)?,
            api_key: required_var(key_var)?,
        })
    }
}

/// Endpoints for the four upstream lookups. Every variable is required.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub housing_search: ServiceEndpoint,
    pub asset: ServiceEndpoint,
    pub tenure: ServiceEndpoint,
    pub repairs_hub_alerts: ServiceEndpoint,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            housing_search: ServiceEndpoint::load(
                "HOUSING_SEARCH_API_URI",
                "HOUSING_SEARCH_API_KEY",
            )?,
            asset: ServiceEndpoint::load("HOUSING_ASSET_API_URI", "HOUSING_ASSET_API_KEY")?,
            tenure: ServiceEndpoint::load(
                "TENURE_INFORMATION_API_URI",
                "TENURE_INFORMATION_API_KEY",
            )?,
            repairs_hub_alerts: ServiceEndpoint::load(
                "REPAIRS_HUB_PROPERTIES_URL",
                "REPAIRS_HUB_PROPERTIES_API_KEY",
            )?,
            timeout: Duration::from_secs(number_var("UPSTREAM_TIMEOUT_SECS", 10)?.max(1)),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    OutOfRange { name: &'static str, max: u64 },
    MissingVariable(&'static str),
    UnknownAssetType(String),
    EmptyList(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(name) => {
                write!(f, "{name} must be a non-negative whole number")
            }
            ConfigError::OutOfRange { name, max } => {
                write!(f, "{name} must not exceed {max}")
            }
            ConfigError::MissingVariable(name) => write!(
                f,
                "Incorrect configuration: '{name}' environment variable must be set"
            ),
            ConfigError::UnknownAssetType(label) => {
                write!(f, "ELIGIBLE_ASSET_TYPES contains unknown asset type '{label}'")
            }
            ConfigError::EmptyList(name) => write!(f, "{name} must list at least one value"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
