//! Visualizer subprocess lifecycle and frame transmission.
//!
//! Responsibilities:
//! - Spawn and kill the external spectrum analyzer
//! - Read its stdout line by line and convert each line into one frame
//! - Send frames over an already-established UDP connection to the display
//! - Blank the display when the visualizer stops

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::process::{Child, ChildStdout, Command};

use crate::context::DisplayContext;
use crate::frame;

/// Errors that can occur while managing the visualizer.
#[derive(Debug, Error)]
pub enum VisualizerError {
    /// Could not dial the display's UDP frame listener.
    #[error("dial display: {0}")]
    Connect(#[source] std::io::Error),

    /// The analyzer subprocess failed to spawn.
    #[error("spawn analyzer: {0}")]
    Spawn(#[source] std::io::Error),

    /// The spawned analyzer exposed no stdout pipe.
    #[error("analyzer stdout unavailable")]
    MissingStdout,

    /// Killing the analyzer failed.
    #[error("kill analyzer: {0}")]
    Kill(#[source] std::io::Error),
}

/// Trait seam for driving the visualizer, so the coordinator can be tested
/// against a mock.
#[async_trait]
pub trait VisualizerDriver: Send + Sync {
    /// Starts the analyzer and frame transmission. No-op when already on.
    async fn start(&self) -> Result<(), VisualizerError>;

    /// Kills the analyzer and blanks the display. No-op when already off.
    async fn stop(&self) -> Result<(), VisualizerError>;

    /// Whether an analyzer handle is currently held.
    fn is_on(&self) -> bool;
}

/// The analyzer slot. The generation counter ties each reader task to the
/// process it was spawned for, so a reader that outlives a stop/start cycle
/// cannot clear the newer handle.
#[derive(Default)]
struct AnalyzerSlot {
    child: Option<Child>,
    generation: u64,
}

/// Manages the analyzer subprocess and the display's frame connection.
pub struct Visualizer {
    socket: Arc<UdpSocket>,
    program: String,
    config_arg: String,
    slot: Arc<Mutex<AnalyzerSlot>>,
}

impl Visualizer {
    /// Dials the display's UDP frame listener.
    ///
    /// # Errors
    ///
    /// Returns [`VisualizerError::Connect`] if the dial fails; this is a
    /// fatal bootstrap error for the daemon.
    pub async fn connect(
        context: &DisplayContext,
        program: &str,
        config_arg: &str,
    ) -> Result<Self, VisualizerError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(VisualizerError::Connect)?;
        socket
            .connect(context.frame_target())
            .await
            .map_err(VisualizerError::Connect)?;

        Ok(Self {
            socket: Arc::new(socket),
            program: program.to_string(),
            config_arg: config_arg.to_string(),
            slot: Arc::new(Mutex::new(AnalyzerSlot::default())),
        })
    }
}

#[async_trait]
impl VisualizerDriver for Visualizer {
    async fn start(&self) -> Result<(), VisualizerError> {
        let mut slot = self.slot.lock();
        if slot.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .arg("-p")
            .arg(&self.config_arg)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(VisualizerError::Spawn)?;
        let stdout = child.stdout.take().ok_or(VisualizerError::MissingStdout)?;

        slot.generation += 1;
        let generation = slot.generation;
        slot.child = Some(child);
        drop(slot);

        tokio::spawn(read_frames(
            stdout,
            Arc::clone(&self.socket),
            Arc::clone(&self.slot),
            generation,
        ));
        Ok(())
    }

    async fn stop(&self) -> Result<(), VisualizerError> {
        let child = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.child.take()
        };
        let Some(mut child) = child else {
            return Ok(());
        };

        let killed = child.kill().await.map_err(VisualizerError::Kill);

        // Clear the display; the off transition stands even if the kill
        // failed.
        if let Err(e) = self.socket.send(&frame::blank()).await {
            log::warn!("[visualizer] blank frame: {e}");
        }
        killed
    }

    fn is_on(&self) -> bool {
        self.slot.lock().child.is_some()
    }
}

/// Reads analyzer output until EOF or a read error, one frame per line.
///
/// Malformed lines are dropped; only read errors terminate the loop. On
/// exit the reader reaps the analyzer and clears the handle (unless a stop
/// or a newer start already took the slot), so `is_on` reflects an analyzer
/// that died on its own.
async fn read_frames(
    stdout: ChildStdout,
    socket: Arc<UdpSocket>,
    slot: Arc<Mutex<AnalyzerSlot>>,
    generation: u64,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let heights = match frame::parse_columns(&line) {
                    Ok(heights) => heights,
                    Err(e) => {
                        log::warn!("[visualizer] dropping analyzer line: {e}");
                        continue;
                    }
                };
                let packed = frame::pack(&frame::render_bars(&heights));
                if let Err(e) = socket.send(&packed).await {
                    log::debug!("[visualizer] frame send: {e}");
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("[visualizer] analyzer read: {e}");
                break;
            }
        }
    }

    let child = {
        let mut guard = slot.lock();
        if guard.generation == generation {
            guard.child.take()
        } else {
            None
        }
    };
    if let Some(mut child) = child {
        match child.wait().await {
            Ok(status) if !status.success() => {
                log::error!("[visualizer] analyzer exited with {status}");
            }
            Err(e) => log::error!("[visualizer] analyzer wait: {e}"),
            Ok(_) => {}
        }
    }
}
