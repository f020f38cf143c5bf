//! Application services layer.
//!
//! Orchestration between the control/watcher inputs and the display
//! infrastructure (frame codec, UDP connection, HTTP notifier).

pub mod coordinator;
pub mod visualizer;

pub use coordinator::StateCoordinator;
pub use visualizer::{Visualizer, VisualizerDriver, VisualizerError};
