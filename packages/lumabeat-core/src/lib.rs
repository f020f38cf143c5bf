//! Lumabeat Core - LED-matrix spectrum visualizer daemon.
//!
//! This crate drives an LED-matrix display's spectrum-visualizer mode from
//! media-player state. It owns the shared on/off state of the visualizer,
//! manages an external spectrum-analyzer subprocess whose output becomes
//! packed UDP frames for the display, watches MPRIS playback signals on the
//! session bus, pushes track information to the display's HTTP message
//! endpoint, and serves a line-oriented control protocol on a local Unix
//! socket.
//!
//! # Architecture
//!
//! - [`frame`]: pure codec for the display's packed bitmap wire format
//! - [`services::visualizer`]: analyzer subprocess lifecycle + UDP frames
//! - [`player`]: session-bus playback watcher emitting de-duplicated events
//! - [`notify`]: HTTP text messages on the display
//! - [`services::coordinator`]: the shared state machine tying it together
//! - [`control`]: the Unix-socket command server
//! - [`bootstrap`]: composition root wiring all of the above
//!
//! # Abstraction Traits
//!
//! Two seams decouple the coordinator from the outside world so it can be
//! tested without a display or a subprocess:
//!
//! - [`VisualizerDriver`](services::visualizer::VisualizerDriver)
//! - [`MessageSink`](notify::MessageSink)

#![warn(clippy::all)]

pub mod bootstrap;
pub mod command;
pub mod context;
pub mod control;
pub mod error;
pub mod events;
pub mod frame;
pub mod notify;
pub mod player;
pub mod protocol_constants;
pub mod services;
pub mod state;

// Re-export commonly used types at the crate root
pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use command::{Command, CommandParseError};
pub use context::DisplayContext;
pub use control::{ControlError, ControlServer};
pub use error::{LumabeatError, LumabeatResult};
pub use events::{PlaybackEvent, PlaybackStatus};
pub use notify::{DeviceNotifier, MessageSink, NotifyError};
pub use player::{PlayerWatcher, WatcherError};
pub use services::{StateCoordinator, Visualizer, VisualizerDriver, VisualizerError};
pub use state::{default_socket_path, Config};
