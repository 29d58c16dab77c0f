// Configuration resolution: environment variables merged with CLI overrides

use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const ENV_API_KEY: &str = "FINPILOT_API_KEY";
pub const ENV_JWT_TOKEN: &str = "FINPILOT_JWT_TOKEN";
pub const ENV_API_GATEWAY_URL: &str = "FINPILOT_API_GATEWAY_URL";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_REQUEST_TIMEOUT: &str = "FINPILOT_REQUEST_TIMEOUT";
pub const ENV_UPLOAD_TIMEOUT: &str = "FINPILOT_UPLOAD_TIMEOUT";

/// Gateway used in `development` when no URL is configured
pub const LOCAL_API_GATEWAY_URL: &str = "http://localhost:8000";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8002;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Startup configuration failure. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Deployment environment tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!(
                "unknown environment '{}', expected production, staging or development",
                other
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport the process serves on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportMode {
    #[default]
    Stdio,
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::Http => f.write_str("http"),
        }
    }
}

/// A credential that never shows up in `Debug` output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Non-secret settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub mode: Option<TransportMode>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_gateway_url: Option<String>,
    pub environment: Option<Environment>,
    pub reload: bool,
}

/// Resolved, immutable process configuration
#[derive(Debug, Clone)]
pub struct Configuration {
    pub api_key: Secret,
    pub jwt_token: Option<Secret>,
    /// Gateway base URL without a trailing slash
    pub gateway_url: String,
    pub environment: Environment,
    pub mode: TransportMode,
    pub host: String,
    pub port: u16,
    pub reload: bool,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Configuration {
    /// Credential carried in the `Authorization: Bearer` header
    pub fn bearer_token(&self) -> &str {
        self.jwt_token
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose()
    }

    pub fn is_local_dev(&self) -> bool {
        self.environment == Environment::Development
    }

    /// `host:port` for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the configuration from the process environment
pub fn from_process_env(cli: &CliOverrides) -> Result<Configuration, ConfigError> {
    resolve(|name| std::env::var(name).ok(), cli)
}

/// Merge an environment lookup with CLI overrides.
///
/// Precedence is CLI flag, then environment variable, then default. Blank
/// values count as unset.
pub fn resolve<F>(env: F, cli: &CliOverrides) -> Result<Configuration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| {
        env(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let api_key = lookup(ENV_API_KEY)
        .map(Secret::new)
        .ok_or(ConfigError::MissingCredential(ENV_API_KEY))?;
    let jwt_token = lookup(ENV_JWT_TOKEN).map(Secret::new);

    let environment = match cli.environment {
        Some(environment) => environment,
        None => match lookup(ENV_ENVIRONMENT) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidValue {
                name: ENV_ENVIRONMENT,
                reason,
            })?,
            None => Environment::default(),
        },
    };

    let gateway_url = cli
        .api_gateway_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .or_else(|| lookup(ENV_API_GATEWAY_URL))
        .or_else(|| {
            (environment == Environment::Development).then(|| LOCAL_API_GATEWAY_URL.to_string())
        })
        .ok_or(ConfigError::MissingCredential(ENV_API_GATEWAY_URL))?;
    let gateway_url = validate_gateway_url(&gateway_url)?;

    let mode = cli.mode.unwrap_or_default();
    if cli.reload && mode != TransportMode::Http {
        return Err(ConfigError::InvalidValue {
            name: "--reload",
            reason: "only supported in http mode".to_string(),
        });
    }

    let request_timeout = match lookup(ENV_REQUEST_TIMEOUT) {
        Some(raw) => parse_timeout(ENV_REQUEST_TIMEOUT, &raw)?,
        None => DEFAULT_REQUEST_TIMEOUT,
    };
    let upload_timeout = match lookup(ENV_UPLOAD_TIMEOUT) {
        Some(raw) => parse_timeout(ENV_UPLOAD_TIMEOUT, &raw)?,
        None => DEFAULT_UPLOAD_TIMEOUT,
    };

    Ok(Configuration {
        api_key,
        jwt_token,
        gateway_url,
        environment,
        mode,
        host: cli
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: cli.port.unwrap_or(DEFAULT_PORT),
        reload: cli.reload,
        request_timeout,
        upload_timeout,
    })
}

fn validate_gateway_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: ENV_API_GATEWAY_URL,
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(format!("'{}': {}", raw, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!(
            "'{}': only http and https are supported",
            raw
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_timeout(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds: f64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        reason: format!("'{}' is not a number of seconds", raw),
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ConfigError::InvalidValue {
            name,
            reason: format!("'{}' must be a positive number of seconds", raw),
        });
    }

    let timeout = Duration::try_from_secs_f64(seconds).map_err(|e| ConfigError::InvalidValue {
        name,
        reason: format!("'{}' is out of range: {}", raw, e),
    })?;

    if timeout.is_zero() {
        return Err(ConfigError::InvalidValue {
            name,
            reason: format!("'{}' rounds down to zero", raw),
        });
    }

    Ok(timeout)
}
