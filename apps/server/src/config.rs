//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path of the control socket.
    /// Override: `LUMABEAT_SOCKET`
    pub socket_path: PathBuf,

    /// Hostname of the display device.
    /// Override: `LUMABEAT_HOSTNAME`
    pub hostname: String,

    /// UDP port of the frame listener on the display device.
    /// Override: `LUMABEAT_UDP_PORT`
    pub udp_port: u16,

    /// Always show the visualizer, instead of only while music is playing.
    /// Override: `LUMABEAT_ALWAYS_ON`
    pub always_on: bool,

    /// Spectrum analyzer program to spawn.
    pub analyzer_program: String,

    /// Configuration file passed to the analyzer.
    pub analyzer_config: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = lumabeat_core::Config::default();
        Self {
            socket_path: core.socket_path,
            hostname: core.hostname,
            udp_port: core.udp_port,
            always_on: core.always_on,
            analyzer_program: core.analyzer_program,
            analyzer_config: core.analyzer_config,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LUMABEAT_SOCKET") {
            if !val.is_empty() {
                self.socket_path = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("LUMABEAT_HOSTNAME") {
            if !val.is_empty() {
                self.hostname = val;
            }
        }

        if let Ok(val) = std::env::var("LUMABEAT_UDP_PORT") {
            if let Ok(port) = val.parse() {
                self.udp_port = port;
            }
        }

        if let Ok(val) = std::env::var("LUMABEAT_ALWAYS_ON") {
            if let Ok(always_on) = val.parse() {
                self.always_on = always_on;
            }
        }
    }

    /// Converts to lumabeat-core's Config type.
    pub fn to_core_config(&self) -> lumabeat_core::Config {
        lumabeat_core::Config {
            socket_path: self.socket_path.clone(),
            hostname: self.hostname.clone(),
            udp_port: self.udp_port,
            always_on: self.always_on,
            analyzer_program: self.analyzer_program.clone(),
            analyzer_config: self.analyzer_config.clone(),
        }
    }
}
