// src/config.rs
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
}

/// Gateway settings, read once at startup and never changed afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_ip")]
    pub listen_ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub verify_url: String,
    pub mc_shop_id: i64,
    #[serde(default)]
    pub secret_key: String,
    /// Reject requests that carry no `Sign` at all. Off by default so
    /// unsigned legacy terminals keep working.
    #[serde(default)]
    pub require_sign: bool,
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Daily log files kept before the oldest is deleted.
    #[serde(default = "default_log_max_files")]
    pub log_max_files: usize,
    #[serde(default)]
    pub devices: Vec<Device>,
}

fn default_listen_ip() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_verify_timeout_ms() -> u64 {
    5000
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_utc_offset_hours() -> i32 {
    8
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_log_max_files() -> usize {
    7
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.verify_url.trim().is_empty() {
            return Err(ConfigError::MissingVerifyUrl);
        }
        let mut seen = HashSet::new();
        for d in &self.devices {
            if !seen.insert(d.id.as_str()) {
                return Err(ConfigError::DuplicateDevice(d.id.clone()));
            }
        }
        // The backend call must give up before the request deadline so a slow
        // backend still ends in a 200 reply.
        if self.verify_timeout_ms == 0
            || self.request_timeout_secs == 0
            || self.verify_timeout() >= self.request_timeout()
        {
            return Err(ConfigError::Timeouts {
                verify_ms: self.verify_timeout_ms,
                request_secs: self.request_timeout_secs,
            });
        }
        if self.log_max_files == 0 {
            return Err(ConfigError::LogMaxFiles);
        }
        self.listen_addr()?;
        self.utc_offset()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.listen_ip, self.port);
        raw.parse().map_err(|_| ConfigError::ListenAddr(raw))
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::UtcOffset(self.utc_offset_hours))
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
