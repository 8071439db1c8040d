use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_PUBLIC_HOST_SUFFIX: &str = "schoolhub.site";
pub const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Parent domain of school subdomains, e.g. `greenwood.schoolhub.site`.
    pub public_host_suffix: String,
    pub billing: BillingConfig,
    pub lifecycle: LifecycleConfig,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("schoolhub.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            public_host_suffix: DEFAULT_PUBLIC_HOST_SUFFIX.to_string(),
            billing: BillingConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// Razorpay credentials. Billing endpoints answer 503 until both the key id
/// and the key secret are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            webhook_secret: None,
            api_base: DEFAULT_RAZORPAY_API_BASE.to_string(),
        }
    }
}

/// Delays of the simulated provisioning steps, and worker tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub transfer_step_delay_secs: u64,
    pub ssl_issue_delay_secs: u64,
    pub privacy_delay_secs: u64,
    pub dns_propagation_delay_secs: u64,
    pub poll_interval_ms: u64,
    pub max_attempts: i64,
}

impl LifecycleConfig {
    /// Every step due immediately, polled often. Used by tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            transfer_step_delay_secs: 0,
            ssl_issue_delay_secs: 0,
            privacy_delay_secs: 0,
            dns_propagation_delay_secs: 0,
            poll_interval_ms: 20,
            max_attempts: 3,
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            transfer_step_delay_secs: 30,
            ssl_issue_delay_secs: 10,
            privacy_delay_secs: 5,
            dns_propagation_delay_secs: 5,
            poll_interval_ms: 1000,
            max_attempts: 3,
        }
    }
}
