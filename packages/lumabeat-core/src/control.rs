//! Control server on a local Unix socket.
//!
//! Clients connect and send newline-terminated commands; the server answers
//! every command with exactly one line: `ok` on success, the error's display
//! text otherwise. A command error never closes the connection - only EOF
//! or a transport failure does.
//!
//! The transport is local and trusted; there is no authentication.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::error::LumabeatResult;
use crate::services::StateCoordinator;

/// Errors from the control socket itself. All are fatal: a daemon that
/// cannot serve commands is useless.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Could not create the socket's parent directory.
    #[error("ensure socket directory: {0}")]
    SocketDir(#[source] std::io::Error),

    /// Could not remove a stale socket file.
    #[error("unlink stale socket: {0}")]
    Unlink(#[source] std::io::Error),

    /// Could not bind the listener.
    #[error("bind control socket: {0}")]
    Bind(#[source] std::io::Error),

    /// The accept loop failed.
    #[error("accept control connection: {0}")]
    Accept(#[source] std::io::Error),
}

/// Tracks the active control connections.
///
/// Connections unregister themselves through an RAII guard, so a serving
/// task that ends for any reason always leaves the registry clean.
#[derive(Default)]
pub struct ClientRegistry {
    connections: DashMap<u64, ()>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    /// Registers a new connection and returns its cleanup guard.
    fn register(self: &Arc<Self>) -> ClientGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, ());
        log::info!(
            "[control] client {} connected (total: {})",
            id,
            self.connections.len()
        );
        ClientGuard {
            id,
            registry: Arc::clone(self),
        }
    }

    /// Returns the number of connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }
}

/// RAII guard that unregisters a connection when dropped.
struct ClientGuard {
    id: u64,
    registry: Arc<ClientRegistry>,
}

impl ClientGuard {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.registry.connections.remove(&self.id);
        log::info!(
            "[control] client {} disconnected (remaining: {})",
            self.id,
            self.registry.connections.len()
        );
    }
}

/// Line-oriented command server bound to a local Unix socket.
pub struct ControlServer {
    listener: UnixListener,
    socket_path: PathBuf,
    coordinator: Arc<StateCoordinator>,
    clients: Arc<ClientRegistry>,
    cancel: CancellationToken,
}

impl ControlServer {
    /// Binds the control socket, clearing any stale socket file first.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] if the parent directory cannot be
    /// created, a stale socket cannot be unlinked, or the bind fails -
    /// all fatal bootstrap errors.
    pub fn bind(
        socket_path: &Path,
        coordinator: Arc<StateCoordinator>,
        cancel: CancellationToken,
    ) -> Result<Self, ControlError> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(ControlError::SocketDir)?;
        }
        match std::fs::remove_file(socket_path) {
            Ok(()) => log::info!("[control] removed stale socket {}", socket_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ControlError::Unlink(e)),
        }

        let listener = UnixListener::bind(socket_path).map_err(ControlError::Bind)?;
        log::info!("[control] listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            coordinator,
            clients: Arc::new(ClientRegistry::default()),
            cancel,
        })
    }

    /// Returns the registry of connected clients.
    #[must_use]
    pub fn clients(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.clients)
    }

    /// Returns the socket path this server is bound to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until cancelled, serving each on its own task.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Accept`] if the listener fails.
    pub async fn run(self) -> Result<(), ControlError> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    log::info!("[control] accept loop stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, _addr) = accepted.map_err(ControlError::Accept)?;
                    let guard = self.clients.register();
                    let coordinator = Arc::clone(&self.coordinator);
                    tokio::spawn(serve_client(stream, coordinator, guard));
                }
            }
        }
    }
}

/// Per-connection loop: read a line, execute, answer with one line.
async fn serve_client(stream: UnixStream, coordinator: Arc<StateCoordinator>, guard: ClientGuard) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("[control] client {} read: {e}", guard.id());
                break;
            }
        };

        let response = match execute_line(&coordinator, &line).await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                log::error!("[control] command {:?}: {e}", line.trim());
                e.to_string()
            }
        };
        if let Err(e) = writer.write_all(format!("{response}\n").as_bytes()).await {
            log::error!("[control] client {} write: {e}", guard.id());
            break;
        }
    }
    // `guard` drops here and unregisters the connection.
}

/// Parses and executes one command line.
async fn execute_line(coordinator: &StateCoordinator, line: &str) -> LumabeatResult<()> {
    let command: Command = line.parse()?;
    coordinator.execute(command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;

    use crate::notify::{MessageSink, NotifyError};
    use crate::services::visualizer::{VisualizerDriver, VisualizerError};

    #[derive(Default)]
    struct MockDriver {
        on: AtomicBool,
    }

    #[async_trait]
    impl VisualizerDriver for MockDriver {
        async fn start(&self) -> Result<(), VisualizerError> {
            self.on.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), VisualizerError> {
            self.on.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_on(&self) -> bool {
            self.on.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        posts: SyncMutex<Vec<(String, Duration)>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn post_message(&self, text: &str, show_time: Duration) -> Result<(), NotifyError> {
            self.posts.lock().push((text.to_string(), show_time));
            Ok(())
        }
    }

    struct Fixture {
        socket_path: PathBuf,
        sink: Arc<RecordingSink>,
        cancel: CancellationToken,
        _dir: tempfile::TempDir,
    }

    fn start_server() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("control.sock");
        let sink = Arc::new(RecordingSink::default());
        let coordinator = Arc::new(StateCoordinator::new(
            Arc::new(MockDriver::default()) as Arc<dyn VisualizerDriver>,
            Arc::clone(&sink) as Arc<dyn MessageSink>,
            false,
        ));
        let cancel = CancellationToken::new();
        let server = ControlServer::bind(&socket_path, coordinator, cancel.clone()).unwrap();
        tokio::spawn(server.run());
        Fixture {
            socket_path,
            sink,
            cancel,
            _dir: dir,
        }
    }

    async fn connect(fixture: &Fixture) -> BufReader<UnixStream> {
        BufReader::new(UnixStream::connect(&fixture.socket_path).await.unwrap())
    }

    async fn roundtrip(client: &mut BufReader<UnixStream>, line: &str) -> String {
        client
            .get_mut()
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        client.read_line(&mut response).await.unwrap();
        response.trim_end().to_string()
    }

    #[tokio::test]
    async fn enable_then_disable_yields_two_oks() {
        let fixture = start_server();
        let mut client = connect(&fixture).await;
        assert_eq!(roundtrip(&mut client, "enable").await, "ok");
        assert_eq!(roundtrip(&mut client, "disable").await, "ok");
        fixture.cancel.cancel();
    }

    #[tokio::test]
    async fn message_command_posts_and_acknowledges() {
        let fixture = start_server();
        let mut client = connect(&fixture).await;
        assert_eq!(roundtrip(&mut client, "message 5000 hello world").await, "ok");
        let posts = fixture.sink.posts.lock().clone();
        assert_eq!(
            posts,
            vec![("hello world".to_string(), Duration::from_millis(5000))]
        );
    }

    #[tokio::test]
    async fn unknown_command_reports_error_and_keeps_the_connection() {
        let fixture = start_server();
        let mut client = connect(&fixture).await;
        let response = roundtrip(&mut client, "bogus").await;
        assert!(response.contains("unknown command"), "got {response:?}");
        // Connection is still usable afterwards.
        assert_eq!(roundtrip(&mut client, "enable").await, "ok");
    }

    #[tokio::test]
    async fn non_numeric_show_time_reports_error() {
        let fixture = start_server();
        let mut client = connect(&fixture).await;
        let response = roundtrip(&mut client, "message soon hello").await;
        assert!(response.contains("invalid show time"), "got {response:?}");
    }

    #[tokio::test]
    async fn concurrent_clients_get_independent_responses() {
        let fixture = start_server();
        let mut first = connect(&fixture).await;
        let mut second = connect(&fixture).await;

        assert_eq!(roundtrip(&mut first, "enable").await, "ok");
        let response = roundtrip(&mut second, "bogus").await;
        assert!(response.contains("unknown command"));
        assert_eq!(roundtrip(&mut first, "disable").await, "ok");
        assert_eq!(roundtrip(&mut second, "enable").await, "ok");
    }

    #[tokio::test]
    async fn stale_socket_file_is_replaced_on_bind() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("control.sock");
        std::fs::write(&socket_path, b"stale").unwrap();

        let coordinator = Arc::new(StateCoordinator::new(
            Arc::new(MockDriver::default()) as Arc<dyn VisualizerDriver>,
            Arc::new(RecordingSink::default()) as Arc<dyn MessageSink>,
            false,
        ));
        let server =
            ControlServer::bind(&socket_path, coordinator, CancellationToken::new()).unwrap();
        assert_eq!(server.socket_path(), socket_path);
    }

    #[tokio::test]
    async fn disconnect_unregisters_the_client() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("control.sock");
        let coordinator = Arc::new(StateCoordinator::new(
            Arc::new(MockDriver::default()) as Arc<dyn VisualizerDriver>,
            Arc::new(RecordingSink::default()) as Arc<dyn MessageSink>,
            false,
        ));
        let cancel = CancellationToken::new();
        let server = ControlServer::bind(&socket_path, coordinator, cancel.clone()).unwrap();
        let clients = server.clients();
        tokio::spawn(server.run());

        let mut client = BufReader::new(UnixStream::connect(&socket_path).await.unwrap());
        client
            .get_mut()
            .write_all(b"enable\n")
            .await
            .unwrap();
        let mut response = String::new();
        client.read_line(&mut response).await.unwrap();
        assert_eq!(clients.client_count(), 1);

        drop(client);
        for _ in 0..200 {
            if clients.client_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("client never unregistered");
    }
}
