//! Application bootstrap and dependency wiring.
//!
//! The composition root: the single place where the display connection,
//! notifier, coordinator, and player watcher are instantiated and wired
//! together. Any failure here aborts startup - a daemon that cannot reach
//! the display or the session bus has nothing to do.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::context::DisplayContext;
use crate::error::{LumabeatError, LumabeatResult};
use crate::notify::{DeviceNotifier, MessageSink};
use crate::player::PlayerWatcher;
use crate::protocol_constants::{MESSAGE_TIMEOUT_SECS, MPRIS_BUS_NAME};
use crate::services::visualizer::VisualizerDriver;
use crate::services::{StateCoordinator, Visualizer};
use crate::state::Config;

/// Container for all bootstrapped services.
pub struct BootstrappedServices {
    /// Owns the shared playback state and drives the visualizer.
    pub coordinator: Arc<StateCoordinator>,
    /// Concrete visualizer handle, kept for shutdown.
    pub visualizer: Arc<Visualizer>,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    watcher: PlayerWatcher,
    http_client: Client,
}

impl std::fmt::Debug for BootstrappedServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrappedServices").finish_non_exhaustive()
    }
}

impl BootstrappedServices {
    /// Returns the shared HTTP client.
    #[must_use]
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Applies the initial state and starts the playback event pump.
    pub async fn start_background_tasks(&mut self) {
        // Reconcile once so an always-on daemon lights the display
        // immediately, before any player signal arrives.
        self.coordinator.sync().await;

        let Some(mut events) = self.watcher.take_events() else {
            return;
        };
        let coordinator = Arc::clone(&self.coordinator);
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        coordinator.handle_event(event).await;
                    }
                }
            }
            log::info!("[bootstrap] event pump stopped");
        });
    }

    /// Initiates graceful shutdown: stops the background loops and blanks
    /// the display.
    pub async fn shutdown(&self) {
        log::info!("[bootstrap] beginning graceful shutdown...");
        self.cancel_token.cancel();
        self.watcher.close();
        if let Err(e) = self.visualizer.stop().await {
            log::error!("[bootstrap] stop visualizer: {e}");
        }
        log::info!("[bootstrap] shutdown complete");
    }
}

/// Creates the shared HTTP client for display messages.
///
/// A single client enables connection pooling; it is created once during
/// bootstrap and injected into the notifier.
fn create_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(MESSAGE_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}

/// Bootstraps all services with their dependencies.
///
/// Wiring order follows the dependency graph: display context, HTTP
/// client, visualizer (UDP dial), notifier, coordinator, player watcher
/// (session-bus subscription).
///
/// # Errors
///
/// Returns an error when the configuration is invalid, the display's UDP
/// target cannot be dialed, or the session-bus subscription fails.
pub async fn bootstrap_services(config: &Config) -> LumabeatResult<BootstrappedServices> {
    config
        .validate()
        .map_err(LumabeatError::Configuration)?;

    let context = DisplayContext::new(&config.hostname, config.udp_port);
    let cancel_token = CancellationToken::new();
    let http_client = create_http_client();

    let visualizer = Arc::new(
        Visualizer::connect(&context, &config.analyzer_program, &config.analyzer_config).await?,
    );
    let notifier = Arc::new(DeviceNotifier::new(http_client.clone(), &context));

    let coordinator = Arc::new(StateCoordinator::new(
        Arc::clone(&visualizer) as Arc<dyn VisualizerDriver>,
        notifier as Arc<dyn MessageSink>,
        config.always_on,
    ));

    let watcher = PlayerWatcher::connect(MPRIS_BUS_NAME, &cancel_token).await?;

    Ok(BootstrappedServices {
        coordinator,
        visualizer,
        cancel_token,
        watcher,
        http_client,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_is_buildable() {
        let client = create_http_client();
        assert!(client.get("http://example.com").build().is_ok());
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_configuration() {
        let config = Config {
            hostname: String::new(),
            ..Config::default()
        };
        let err = bootstrap_services(&config).await.unwrap_err();
        assert!(matches!(err, LumabeatError::Configuration(_)));
    }
}
