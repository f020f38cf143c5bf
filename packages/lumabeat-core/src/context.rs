//! Display device addressing.
//!
//! This module provides [`DisplayContext`], which bundles the display
//! device's hostname and UDP port and derives the concrete endpoints the
//! services talk to: the UDP target for frame datagrams and the HTTP URL
//! for text messages.

use crate::protocol_constants::{DEFAULT_DISPLAY_HOSTNAME, DEFAULT_DISPLAY_UDP_PORT};

/// Addressing for the display device, fixed at process start.
#[derive(Debug, Clone)]
pub struct DisplayContext {
    hostname: String,
    udp_port: u16,
}

impl DisplayContext {
    /// Creates a `DisplayContext` for the given hostname and UDP port.
    pub fn new(hostname: impl Into<String>, udp_port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            udp_port,
        }
    }

    /// Returns the display device's hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the UDP target for frame datagrams (e.g. `ledmatrix:1337`).
    #[must_use]
    pub fn frame_target(&self) -> String {
        format!("{}:{}", self.hostname, self.udp_port)
    }

    /// Returns the HTTP endpoint for text messages (default port 80).
    #[must_use]
    pub fn message_url(&self) -> String {
        format!("http://{}/message", self.hostname)
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_HOSTNAME, DEFAULT_DISPLAY_UDP_PORT)
    }
}
