use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub acme: AcmeConfig,
    pub http: HttpConfig,
    pub https: HttpsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AcmeConfig {
    /// Domain the certificate is issued for.
    pub domain: String,
    /// Contact email used for account registration.
    pub email: String,
    /// Use the Let's Encrypt staging environment.
    #[serde(default = "default_staging")]
    pub staging: bool,
    /// Path to the acme.sh executable.
    #[serde(default = "default_client_path")]
    pub client_path: String,
    /// Base directory acme.sh keeps account state and issued material in.
    #[serde(default)]
    pub account_dir: Option<String>,
    /// Renewal loop period.
    #[serde(default = "default_renew_interval")]
    pub renew_interval_secs: u64,
    /// Delay before the first renewal cycle, so the companion HTTP layer
    /// has bound its port and can answer challenge requests.
    #[serde(default = "default_startup_grace")]
    pub startup_grace_secs: u64,
}

fn default_staging() -> bool { true }
fn default_client_path() -> String { "acme.sh".to_string() }
fn default_renew_interval() -> u64 { 60 * 60 }
fn default_startup_grace() -> u64 { 3 }

impl AcmeConfig {
    /// Resolved account directory, `~/.acme.sh` unless configured.
    pub fn account_dir_path(&self) -> PathBuf {
        match &self.account_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".acme.sh"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Plaintext listener address; ACME HTTP-01 validation arrives here.
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,
}

fn default_http_addr() -> String { "0.0.0.0:80".to_string() }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpsConfig {
    #[serde(default = "default_https_addr")]
    pub listen_addr: String,
    /// How long a stopping listener may drain in-flight requests.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_https_addr() -> String { "0.0.0.0:443".to_string() }
fn default_shutdown_grace() -> u64 { 5 }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_output")]
    pub output: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
fn default_log_output() -> String { "console".to_string() }

pub fn load_config(path: &str) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.acme.domain.is_empty() {
        anyhow::bail!("acme.domain must not be empty");
    }
    if config.acme.email.is_empty() {
        anyhow::bail!("acme.email must not be empty");
    }
    config
        .http
        .listen_addr
        .parse::<std::net::SocketAddr>()
        .with_context(|| format!("Invalid http.listen_addr: {}", config.http.listen_addr))?;
    config
        .https
        .listen_addr
        .parse::<std::net::SocketAddr>()
        .with_context(|| format!("Invalid https.listen_addr: {}", config.https.listen_addr))?;
    Ok(())
}
