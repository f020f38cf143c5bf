//! Centralized error types for the Lumabeat core library.
//!
//! Each module defines its own `thiserror` enum close to the code that
//! produces it; this module ties them together into [`LumabeatError`] for
//! callers that cross module boundaries (the coordinator, the control
//! server, bootstrap). Protocol-visible errors keep their module error's
//! display text: it is written verbatim as the control-protocol response
//! line.

use thiserror::Error;

use crate::command::CommandParseError;
use crate::control::ControlError;
use crate::notify::NotifyError;
use crate::player::WatcherError;
use crate::services::visualizer::VisualizerError;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum LumabeatError {
    /// A control-protocol line failed to parse.
    #[error(transparent)]
    Command(#[from] CommandParseError),

    /// Posting a message to the display failed.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Managing the visualizer subprocess failed.
    #[error(transparent)]
    Visualizer(#[from] VisualizerError),

    /// The media-player bus subscription failed.
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    /// The control socket could not be set up or served.
    #[error(transparent)]
    Control(#[from] ControlError),

    /// The supplied configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Convenient Result alias for application-wide operations.
pub type LumabeatResult<T> = Result<T, LumabeatError>;
