//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by external interfaces (the LED-matrix firmware,
//! the analyzer's output format, MPRIS) and changing them would break
//! interoperability with the physical display.

// ─────────────────────────────────────────────────────────────────────────────
// Display Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Display width in pixels, fixed by the LED-matrix firmware.
///
/// The analyzer is configured to emit exactly this many columns per line.
pub const DISPLAY_WIDTH: usize = 64;

/// Display height in pixels (rows), fixed by the LED-matrix firmware.
pub const DISPLAY_HEIGHT: usize = 8;

/// Size of one packed frame datagram (8 pixels per byte).
pub const FRAME_BYTES: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;

// ─────────────────────────────────────────────────────────────────────────────
// Display Device Endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Default hostname of the display device.
pub const DEFAULT_DISPLAY_HOSTNAME: &str = "ledmatrix";

/// Default UDP port of the frame listener on the display device.
pub const DEFAULT_DISPLAY_UDP_PORT: u16 = 1337;

/// Timeout for message posts to the display's HTTP endpoint (seconds).
pub const MESSAGE_TIMEOUT_SECS: u64 = 10;

/// How long the display shows a track-change message (milliseconds).
pub const TRACK_MESSAGE_SHOW_TIME_MS: u64 = 7500;

/// Default show time for client-initiated messages (milliseconds).
pub const DEFAULT_MESSAGE_SHOW_TIME_MS: u64 = 5000;

// ─────────────────────────────────────────────────────────────────────────────
// Analyzer Subprocess
// ─────────────────────────────────────────────────────────────────────────────

/// Default spectrum analyzer program.
pub const DEFAULT_ANALYZER_PROGRAM: &str = "cava";

/// Default configuration file passed to the analyzer via `-p`.
pub const DEFAULT_ANALYZER_CONFIG: &str = "cava.config";

// ─────────────────────────────────────────────────────────────────────────────
// Media Player Bus Subscription
// ─────────────────────────────────────────────────────────────────────────────

/// Well-known bus name of the watched media player.
pub const MPRIS_BUS_NAME: &str = "org.mpris.MediaPlayer2.spotify";

/// Object path all MPRIS players expose.
pub const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Interface whose property changes carry playback status and metadata.
pub const MPRIS_PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

// ─────────────────────────────────────────────────────────────────────────────
// Channel Capacities
// ─────────────────────────────────────────────────────────────────────────────

/// Capacity of the watcher's typed event channel.
///
/// Capacity 1 gives rendezvous-like delivery: the watcher blocks until the
/// coordinator has taken the previous event.
pub const PLAYBACK_EVENT_CHANNEL_CAPACITY: usize = 1;
