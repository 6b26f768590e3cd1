//! # Console Configuration
//!
//! Runtime settings for the plot director: where the remote plot service
//! lives, how the dispatch loop is paced, the calibration jog step, log
//! capacities, and the operator API bind address.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [service]
//! host = "plotter.local"
//! port = 50051
//!
//! [dispatch]
//! pause_poll_ms = 100
//! command_delay_ms = 50
//!
//! [calibration]
//! axis_step = 0.1
//!
//! [logs]
//! command_log_size = 200
//! message_log_size = 30
//!
//! [web]
//! bind = "127.0.0.1:3000"
//!
//! [notify]
//! webhook = "https://hooks.example.com/plotter"
//! ```
//!
//! Every section is optional; missing keys fall back to the defaults below.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the service link, dispatch pacing, calibration and logs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub logs: LogConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Address of the remote plot service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ServiceConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Pacing of the command dispatch loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Interval between state checks while a job is not plotting.
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,
    /// Delay after each dispatched queue entry.
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pause_poll_ms: default_pause_poll_ms(),
            command_delay_ms: default_command_delay_ms(),
        }
    }
}

impl DispatchConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalibrationConfig {
    /// Distance the carriage is walked per jog, in millimetres.
    #[serde(default = "default_axis_step")]
    pub axis_step: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            axis_step: default_axis_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_command_log_size")]
    pub command_log_size: usize,
    #[serde(default = "default_message_log_size")]
    pub message_log_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            command_log_size: default_command_log_size(),
            message_log_size: default_message_log_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Where to announce finished plots. No webhook, no notification.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook: None,
            timeout_ms: default_notify_timeout_ms(),
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl Config {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.host.trim().is_empty() {
            return Err(ConfigError::Invalid("service.host must not be empty".to_string()));
        }
        if self.service.port == 0 {
            return Err(ConfigError::Invalid("service.port must be > 0".to_string()));
        }
        if !(self.calibration.axis_step > 0.0) {
            return Err(ConfigError::Invalid("calibration.axis_step must be > 0".to_string()));
        }
        if self.dispatch.pause_poll_ms == 0 || self.dispatch.command_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.pause_poll_ms and dispatch.command_delay_ms must be > 0".to_string(),
            ));
        }
        if self.notify.webhook.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::Invalid("notify.webhook must not be empty when set".to_string()));
        }
        if self.logs.command_log_size == 0 || self.logs.message_log_size == 0 {
            return Err(ConfigError::Invalid("log sizes must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 50051 }
fn default_connect_timeout_ms() -> u64 { 5000 }
fn default_pause_poll_ms() -> u64 { 100 }
fn default_command_delay_ms() -> u64 { 50 }
fn default_axis_step() -> f32 { 0.1 }
fn default_command_log_size() -> usize { 200 }
fn default_message_log_size() -> usize { 30 }
fn default_bind() -> String { "127.0.0.1:3000".to_string() }
fn default_notify_timeout_ms() -> u64 { 5000 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: Config = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.service.address(), "localhost:50051");
        assert_eq!(config.dispatch.pause_poll(), Duration::from_millis(100));
        assert_eq!(config.dispatch.command_delay(), Duration::from_millis(50));
        assert_eq!(config.calibration.axis_step, 0.1);
        assert_eq!(config.logs.command_log_size, 200);
        assert_eq!(config.logs.message_log_size, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("director.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[service]\nhost = 'plotter.local'\nport = 6000\n\n[dispatch]\ncommand_delay_ms = 5").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.service.address(), "plotter.local:6000");
        assert_eq!(config.dispatch.command_delay_ms, 5);
        // Defaults for missing fields
        assert_eq!(config.dispatch.pause_poll_ms, 100);
        assert_eq!(config.web.bind, "127.0.0.1:3000");
        assert_eq!(config.notify.webhook, None);
        assert_eq!(config.notify.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_load_config_webhook() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("notify.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[notify]\nwebhook = 'http://127.0.0.1:9/done'").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.notify.webhook.as_deref(), Some("http://127.0.0.1:9/done"));
    }

    #[test]
    fn test_load_config_rejects_zero_pacing() {
        let dir = tempdir().unwrap();
        for (name, body) in [
            ("poll.toml", "[dispatch]\npause_poll_ms = 0"),
            ("delay.toml", "[dispatch]\ncommand_delay_ms = 0"),
        ] {
            let file_path = dir.path().join(name);
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "{}", body).unwrap();
            file.flush().unwrap();
            let result = load_config(file_path.to_str().unwrap());
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{} accepted", name);
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_config_rejects_zero_step() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("step.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[calibration]\naxis_step = 0.0").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
