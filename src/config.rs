use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    pub server_base_url: String,
    #[serde(default = "default_internet_test_host")]
    pub internet_test_host: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_host_range_start")]
    pub host_range_start: u16,
    #[serde(default = "default_host_range_end")]
    pub host_range_end: u16,
    #[serde(default)]
    pub friendly_names: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,
    #[serde(default = "default_notes_timeout_ms")]
    pub notes_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            host_range_start: default_host_range_start(),
            host_range_end: default_host_range_end(),
            friendly_names: HashMap::new(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            ping_timeout_ms: default_ping_timeout_ms(),
            status_timeout_ms: default_status_timeout_ms(),
            notes_timeout_ms: default_notes_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let mut cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;
        cfg.normalize();

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn normalize(&mut self) {
        let trimmed = self.server_base_url.trim().trim_end_matches('/').to_string();
        self.server_base_url = trimmed;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a valid host:port socket address".to_string(),
            ));
        }
        if self.server_base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server_base_url is required".to_string(),
            ));
        }
        if !self.server_base_url.starts_with("http://")
            && !self.server_base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "server_base_url '{}' must start with http:// or https://",
                self.server_base_url
            )));
        }
        if self.internet_test_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "internet_test_host must not be empty".to_string(),
            ));
        }

        validate_network(&self.network)?;
        validate_probe(&self.probe)?;
        validate_remote(&self.remote)?;

        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_network(cfg: &NetworkConfig) -> Result<(), ConfigError> {
    if cfg.prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "network.prefix must not be empty".to_string(),
        ));
    }
    if cfg.host_range_start >= cfg.host_range_end {
        return Err(ConfigError::Validation(format!(
            "network.host_range_start ({}) must be below host_range_end ({})",
            cfg.host_range_start, cfg.host_range_end
        )));
    }
    if cfg.host_range_end > 256 {
        return Err(ConfigError::Validation(
            "network.host_range_end must be <= 256".to_string(),
        ));
    }
    for (ip, name) in &cfg.friendly_names {
        if ip.trim().is_empty() {
            return Err(ConfigError::Validation(
                "network.friendly_names keys must not be empty".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "network.friendly_names '{ip}' must have a non-empty name"
            )));
        }
    }
    Ok(())
}

fn validate_probe(cfg: &ProbeConfig) -> Result<(), ConfigError> {
    if cfg.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "probe.timeout_ms must be > 0".to_string(),
        ));
    }
    if cfg.max_concurrency < 1 {
        return Err(ConfigError::Validation(
            "probe.max_concurrency must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_remote(cfg: &RemoteConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("ping_timeout_ms", cfg.ping_timeout_ms),
        ("status_timeout_ms", cfg.status_timeout_ms),
        ("notes_timeout_ms", cfg.notes_timeout_ms),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "remote.{name} must be > 0"
            )));
        }
    }
    Ok(())
}

fn default_internet_test_host() -> String {
    "8.8.8.8".to_string()
}

fn default_prefix() -> String {
    "192.168.1.".to_string()
}

const fn default_host_range_start() -> u16 {
    1
}

const fn default_host_range_end() -> u16 {
    50
}

const fn default_probe_timeout_ms() -> u64 {
    1000
}

const fn default_max_concurrency() -> usize {
    16
}

const fn default_ping_timeout_ms() -> u64 {
    2000
}

const fn default_status_timeout_ms() -> u64 {
    3000
}

const fn default_notes_timeout_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            listen: "127.0.0.1:4444".to_string(),
            server_base_url: "http://10.0.0.5:5000".to_string(),
            internet_test_host: "8.8.8.8".to_string(),
            network: NetworkConfig::default(),
            probe: ProbeConfig::default(),
            remote: RemoteConfig::default(),
        }
    }

    #[test]
    fn example_yaml_is_valid() {
        let mut cfg: Config =
            serde_yaml::from_str(Config::example_yaml()).expect("example must parse");
        cfg.normalize();
        cfg.validate().expect("example must validate");
        assert_eq!(
            cfg.network.friendly_names.get("192.168.1.20").map(String::as_str),
            Some("Gaming PC")
        );
    }

    #[test]
    fn minimal_yaml_takes_defaults() {
        let yaml = "listen: \"0.0.0.0:8080\"\nserver_base_url: \"http://srv:5000/\"\n";
        let mut cfg: Config = serde_yaml::from_str(yaml).expect("minimal config");
        cfg.normalize();
        cfg.validate().expect("defaults are valid");

        assert_eq!(cfg.server_base_url, "http://srv:5000");
        assert_eq!(cfg.internet_test_host, "8.8.8.8");
        assert_eq!(cfg.network.prefix, "192.168.1.");
        assert_eq!(cfg.network.host_range_start, 1);
        assert_eq!(cfg.network.host_range_end, 50);
        assert_eq!(cfg.probe.timeout(), Duration::from_secs(1));
        assert_eq!(cfg.remote.ping_timeout_ms, 2000);
        assert_eq!(cfg.remote.status_timeout_ms, 3000);
    }

    #[test]
    fn empty_host_range_is_rejected() {
        let mut cfg = valid_config();
        cfg.network.host_range_start = 10;
        cfg.network.host_range_end = 10;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        let mut cfg = valid_config();
        cfg.server_base_url = "10.0.0.5:5000".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut cfg = valid_config();
        cfg.remote.notes_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.probe.timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = Config::load_from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
