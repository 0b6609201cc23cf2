//! Configuration module

use std::time::Duration;

use serde::Deserialize;

use crate::megad::{Channel, PollMode};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

/// Controller address and bus wiring
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Access password, sent as the first URL path segment
    #[serde(default = "default_password")]
    pub password: String,
    /// Controller port the sensor bus is wired to
    #[serde(default = "default_port")]
    pub port: u16,
    /// SCL line selector on that port
    #[serde(default)]
    pub scl: u8,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Refresh cadence in seconds; fractional values are allowed and zero
    /// disables polling.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: f64,
    #[serde(default = "default_mode")]
    pub mode: PollMode,
    /// Channels the state model subscribes to
    #[serde(default = "default_channels")]
    pub channels: Vec<Channel>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            password: default_password(),
            port: default_port(),
            scl: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
            mode: default_mode(),
            channels: default_channels(),
        }
    }
}

fn default_host() -> String {
    // Factory default address of a MegaD controller
    "192.168.0.14".to_string()
}

fn default_password() -> String {
    "sec".to_string()
}

fn default_port() -> u16 {
    1
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh_secs() -> f64 {
    10.0
}

fn default_mode() -> PollMode {
    PollMode::PerChannel
}

fn default_channels() -> Vec<Channel> {
    Channel::ALL.to_vec()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("MEGAD").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize().unwrap_or_else(|_| Config {
            device: DeviceConfig::default(),
            poll: PollConfig::default(),
        });

        Ok(config)
    }
}

impl PollConfig {
    /// Refresh cadence as a millisecond-resolution duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis((self.refresh_secs * 1000.0) as u64)
    }
}
