//! Playback state coordination.
//!
//! The coordinator owns the daemon's shared mutable state (`enabled`,
//! `is_playing`, plus the fixed `always_on` flag) and is the only component
//! allowed to start or stop the visualizer. Every transition recomputes
//!
//! ```text
//! should_run = enabled && (always_on || is_playing)
//! ```
//!
//! and drives the visualizer to match.
//!
//! # Locking
//!
//! One `tokio::sync::Mutex` guards the two mutable flags and the
//! start/stop decision, and is deliberately held across message posts:
//! a post therefore blocks subsequent transitions until it completes. That
//! serialization is an accepted tradeoff at this scale - posts are
//! infrequent and short.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::command::Command;
use crate::error::LumabeatResult;
use crate::events::PlaybackEvent;
use crate::notify::MessageSink;
use crate::protocol_constants::TRACK_MESSAGE_SHOW_TIME_MS;
use crate::services::visualizer::VisualizerDriver;

/// The two flags that change at runtime.
struct PlaybackFlags {
    enabled: bool,
    is_playing: bool,
}

/// Coordinates playback state, the visualizer, and display messages.
pub struct StateCoordinator {
    always_on: bool,
    visualizer: Arc<dyn VisualizerDriver>,
    notifier: Arc<dyn MessageSink>,
    flags: Mutex<PlaybackFlags>,
}

impl StateCoordinator {
    /// Creates a coordinator. The visualizer starts enabled; `always_on` is
    /// fixed for the daemon's lifetime.
    pub fn new(
        visualizer: Arc<dyn VisualizerDriver>,
        notifier: Arc<dyn MessageSink>,
        always_on: bool,
    ) -> Self {
        Self {
            always_on,
            visualizer,
            notifier,
            flags: Mutex::new(PlaybackFlags {
                enabled: true,
                is_playing: false,
            }),
        }
    }

    /// Allows the visualizer to run (it still needs playback or always-on).
    pub async fn enable(&self) {
        let mut flags = self.flags.lock().await;
        flags.enabled = true;
        self.reconcile(&flags).await;
    }

    /// Forces the visualizer off regardless of playback state.
    pub async fn disable(&self) {
        let mut flags = self.flags.lock().await;
        flags.enabled = false;
        self.reconcile(&flags).await;
    }

    /// Re-applies the current state to the visualizer.
    ///
    /// Called once at startup so an always-on daemon lights the display
    /// immediately.
    pub async fn sync(&self) {
        let flags = self.flags.lock().await;
        self.reconcile(&flags).await;
    }

    /// Applies one playback event from the watcher.
    ///
    /// A status change updates `is_playing` and reconciles; track text is
    /// shown on the display only while playing. Post failures are logged,
    /// never propagated - a missed track message must not affect state.
    pub async fn handle_event(&self, event: PlaybackEvent) {
        let mut flags = self.flags.lock().await;
        if let Some(status) = event.status {
            flags.is_playing = status.is_playing();
            self.reconcile(&flags).await;
        }
        if let Some(text) = &event.text {
            if flags.is_playing {
                let show_time = Duration::from_millis(TRACK_MESSAGE_SHOW_TIME_MS);
                if let Err(e) = self.notifier.post_message(text, show_time).await {
                    log::error!("[coordinator] track message: {e}");
                }
            }
        }
    }

    /// Executes one control command.
    ///
    /// Enable/disable always succeed; message posts return their transport
    /// error to the caller so the control server can report it.
    pub async fn execute(&self, command: Command) -> LumabeatResult<()> {
        match command {
            Command::Enable => {
                self.enable().await;
                Ok(())
            }
            Command::Disable => {
                self.disable().await;
                Ok(())
            }
            Command::Message { show_time, text } => {
                Ok(self.notifier.post_message(&text, show_time).await?)
            }
        }
    }

    /// Starts or stops the visualizer when the derived value and its actual
    /// state disagree; issues no redundant calls otherwise. Driver errors
    /// are logged - they must not take down command handling.
    async fn reconcile(&self, flags: &PlaybackFlags) {
        let should_run = flags.enabled && (self.always_on || flags.is_playing);
        if should_run && !self.visualizer.is_on() {
            log::info!("[coordinator] starting visualizer");
            if let Err(e) = self.visualizer.start().await {
                log::error!("[coordinator] start visualizer: {e}");
            }
        } else if !should_run && self.visualizer.is_on() {
            log::info!("[coordinator] stopping visualizer");
            if let Err(e) = self.visualizer.stop().await {
                log::error!("[coordinator] stop visualizer: {e}");
            }
        }
    }
}
