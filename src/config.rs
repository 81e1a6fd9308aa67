//! Capture run parameters and the netmon configuration file.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CaptureProtocol, SessionOptions, DEFAULT_BUFFER_SIZE};
use crate::error::ConfigError;
use crate::parser::MIN_HEADER_SIZE;
use crate::sink::DEFAULT_OUTPUT_PATH;

const DEFAULT_CONFIG_PATH: &str = "/etc/netmon.conf";

/// Parameters of one bounded capture run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Receive attempts to make
    pub packet_count: usize,
    /// Where the dataset is saved
    pub output_path: PathBuf,
    /// Bytes requested per receive
    pub buffer_size: usize,
}

impl CaptureConfig {
    pub fn new(packet_count: usize, output_path: impl Into<PathBuf>) -> Self {
        Self {
            packet_count,
            output_path: output_path.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Check the run can be attempted at all. Called before any socket opens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output path is empty".to_string()));
        }
        // The save happens after capture; a missing directory would lose the run.
        if let Some(dir) = self.output_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                return Err(ConfigError::Invalid(format!(
                    "output directory {} does not exist",
                    dir.display()
                )));
            }
        }
        validate_buffer_size(self.buffer_size)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new(10, DEFAULT_OUTPUT_PATH)
    }
}

fn validate_buffer_size(size: usize) -> Result<(), ConfigError> {
    if !(MIN_HEADER_SIZE..=DEFAULT_BUFFER_SIZE).contains(&size) {
        return Err(ConfigError::Invalid(format!(
            "buffer size {} out of range {}..={}",
            size, MIN_HEADER_SIZE, DEFAULT_BUFFER_SIZE
        )));
    }
    Ok(())
}

/// Settings loaded from `/etc/netmon.conf` and `NETMON_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output_path: PathBuf,
    pub buffer_size: usize,
    pub bind_address: Option<Ipv4Addr>,
    pub interface: Option<String>,
    pub protocol: CaptureProtocol,
    pub poll_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            buffer_size: DEFAULT_BUFFER_SIZE,
            bind_address: None,
            interface: None,
            protocol: CaptureProtocol::default(),
            poll_interval: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("NETMON_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = Config::default();

        if Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            config.apply_file(&content)?;
        }

        // Allow environment variable overrides
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Apply `key = value` lines; blank lines and `#` comments are skipped.
    pub fn apply_file(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.set(key.trim(), value.trim())?;
            }
        }
        Ok(())
    }

    /// Apply `NETMON_*` overrides using `var` to look variables up.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        const OVERRIDES: [(&str, &str); 6] = [
            ("NETMON_OUTPUT", "output_path"),
            ("NETMON_BUFFER_SIZE", "buffer_size"),
            ("NETMON_BIND_ADDRESS", "bind_address"),
            ("NETMON_INTERFACE", "interface"),
            ("NETMON_PROTOCOL", "protocol"),
            ("NETMON_POLL_MS", "poll_interval_ms"),
        ];

        for (env_key, key) in OVERRIDES {
            if let Some(val) = var(env_key) {
                self.set(key, val.trim())
                    .map_err(|e| ConfigError::Invalid(format!("{}: {}", env_key, e)))?;
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "output_path" => self.output_path = PathBuf::from(value),
            "buffer_size" => {
                let size = value.parse().map_err(|_| {
                    ConfigError::Invalid(format!("Invalid buffer_size: {}", value))
                })?;
                validate_buffer_size(size)?;
                self.buffer_size = size;
            }
            "bind_address" => {
                self.bind_address = Some(value.parse().map_err(|_| {
                    ConfigError::Invalid(format!("Invalid bind_address: {}", value))
                })?);
            }
            "interface" => self.interface = Some(value.to_string()),
            "protocol" => {
                self.protocol = value.parse().map_err(ConfigError::Invalid)?;
            }
            "poll_interval_ms" => {
                let ms: u64 = value.parse().map_err(|_| {
                    ConfigError::Invalid(format!("Invalid poll_interval_ms: {}", value))
                })?;
                self.poll_interval = (ms > 0).then(|| Duration::from_millis(ms));
            }
            _ => tracing::debug!("Ignoring unknown config key: {}", key),
        }
        Ok(())
    }

    /// Socket acquisition settings.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            bind_address: self.bind_address,
            interface: self.interface.clone(),
            protocol: self.protocol,
            poll_interval: self.poll_interval,
        }
    }

    /// Run parameters for `packet_count` packets.
    pub fn capture_config(&self, packet_count: usize) -> CaptureConfig {
        CaptureConfig::new(packet_count, self.output_path.clone())
            .with_buffer_size(self.buffer_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_apply_file() {
        let mut config = Config::default();
        config
            .apply_file(
                "# capture settings\n\
                 output_path = /tmp/trace.csv\n\
                 \n\
                 buffer_size=1500\n\
                 interface = eth0\n\
                 protocol = udp\n\
                 poll_interval_ms = 250\n\
                 colour = blue\n",
            )
            .unwrap();

        assert_eq!(config.output_path, PathBuf::from("/tmp/trace.csv"));
        assert_eq!(config.buffer_size, 1500);
        assert_eq!(config.interface.as_deref(), Some("eth0"));
        assert_eq!(config.protocol, CaptureProtocol::Udp);
        assert_eq!(config.poll_interval, Some(Duration::from_millis(250)));
        assert_eq!(config.bind_address, None);
    }

    #[test]
    fn test_apply_file_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.apply_file("buffer_size = lots").is_err());
        assert!(config.apply_file("buffer_size = 12").is_err());
        assert!(config.apply_file("bind_address = 10.0.0.300").is_err());
        assert!(config.apply_file("protocol = sctp").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_file("output_path = from_file.csv").unwrap();

        let env: HashMap<&str, &str> = [
            ("NETMON_OUTPUT", "from_env.csv"),
            ("NETMON_BIND_ADDRESS", "192.168.1.10"),
            ("NETMON_POLL_MS", "0"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.output_path, PathBuf::from("from_env.csv"));
        assert_eq!(config.bind_address, Some(Ipv4Addr::new(192, 168, 1, 10)));
        assert_eq!(config.poll_interval, None);
    }

    #[test]
    fn test_env_error_names_variable() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "NETMON_BUFFER_SIZE").then(|| "nope".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("NETMON_BUFFER_SIZE"));
    }

    #[test]
    fn test_capture_config_validation() {
        assert!(CaptureConfig::new(10, "packet_log.csv").validate().is_ok());
        assert!(CaptureConfig::new(0, "packet_log.csv").validate().is_ok());
        assert!(CaptureConfig::new(10, "").validate().is_err());
        assert!(CaptureConfig::new(10, "out.csv")
            .with_buffer_size(19)
            .validate()
            .is_err());
        assert!(CaptureConfig::new(10, "out.csv")
            .with_buffer_size(65536)
            .validate()
            .is_err());
    }

    #[test]
    fn test_capture_config_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let nested = CaptureConfig::new(10, dir.path().join("nope").join("out.csv"));
        assert!(nested.validate().is_err());

        let file_parent = dir.path().join("plain");
        std::fs::write(&file_parent, "").unwrap();
        let under_file = CaptureConfig::new(10, file_parent.join("out.csv"));
        assert!(under_file.validate().is_err());

        assert!(CaptureConfig::new(10, dir.path().join("out.csv"))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_capture_config_from_config() {
        let mut config = Config::default();
        config.apply_file("buffer_size = 2048").unwrap();

        let capture = config.capture_config(5);
        assert_eq!(capture.packet_count, 5);
        assert_eq!(capture.buffer_size, 2048);
        assert_eq!(capture.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
    }
}
