//! Core configuration types.
//!
//! [`Config`] carries everything the daemon needs at startup: the control
//! socket path, the display device address, the always-on flag, and the
//! analyzer invocation. It is supplied once at process start and is not
//! reloadable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_ANALYZER_CONFIG, DEFAULT_ANALYZER_PROGRAM, DEFAULT_DISPLAY_HOSTNAME,
    DEFAULT_DISPLAY_UDP_PORT,
};

/// Name of the control socket file inside the runtime directory.
const SOCKET_FILE_NAME: &str = "lumabeat.sock";

/// Returns the default control socket path.
///
/// Prefers `$XDG_RUNTIME_DIR`, falling back to `/tmp` when the session has
/// no runtime directory (e.g. a system service).
#[must_use]
pub fn default_socket_path() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(SOCKET_FILE_NAME),
        _ => PathBuf::from("/tmp").join(SOCKET_FILE_NAME),
    }
}

/// Configuration for the Lumabeat daemon.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Path of the control socket.
    pub socket_path: PathBuf,

    /// Hostname of the display device.
    pub hostname: String,

    /// UDP port of the frame listener on the display device.
    pub udp_port: u16,

    /// Always show the visualizer, instead of only while music is playing.
    pub always_on: bool,

    /// Spectrum analyzer program to spawn.
    pub analyzer_program: String,

    /// Configuration file passed to the analyzer.
    pub analyzer_config: String,
}

impl Config {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.hostname.is_empty() {
            return Err("hostname must not be empty".to_string());
        }
        if self.udp_port == 0 {
            return Err("udp_port must be nonzero".to_string());
        }
        if self.analyzer_program.is_empty() {
            return Err("analyzer_program must not be empty".to_string());
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err("socket_path must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            hostname: DEFAULT_DISPLAY_HOSTNAME.to_string(),
            udp_port: DEFAULT_DISPLAY_UDP_PORT,
            always_on: false,
            analyzer_program: DEFAULT_ANALYZER_PROGRAM.to_string(),
            analyzer_config: DEFAULT_ANALYZER_CONFIG.to_string(),
        }
    }
}
