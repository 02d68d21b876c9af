use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use udplog_core::{ControlCommand, DaemonConfig, Lifecycle, LifecycleState, LogLevel};

use crate::error::{io_err, DaemonError};
use crate::receiver::{receive_loop, ReceiverContext, Shared};
use crate::store::LogStore;

/// Point-in-time view of the daemon for the operator surface.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonStats {
    pub state: LifecycleState,
    pub local_addr: SocketAddr,
    pub store_path: PathBuf,
    pub last_peer: Option<SocketAddr>,
    pub frames_stored: u64,
    pub bytes_stored: u64,
    pub idle_polls: u64,
    pub truncated_frames: u64,
}

/// A running log daemon: listening endpoint, receive task, and store.
///
/// Dropping a running daemon signals the receive task to stop but cannot
/// wait for it; call [`Daemon::shutdown`] for an orderly stop.
pub struct Daemon {
    local_addr: SocketAddr,
    endpoint: Mutex<Option<Arc<UdpSocket>>>,
    store: Arc<LogStore>,
    shared: Arc<Shared>,
    lifecycle: Lifecycle,
    shutdown_tx: broadcast::Sender<()>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Daemon {
    /// Open the store, bind the endpoint, and spawn the receive task.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(config: DaemonConfig) -> Result<Self, DaemonError> {
        let store = Arc::new(LogStore::open(&config.store_path).await?);

        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|source| DaemonError::Bind {
                addr: config.bind,
                source,
            })?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| io_err("daemon socket", e))?;
        let socket = Arc::new(socket);

        let shared = Arc::new(Shared::default());
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let lifecycle = Lifecycle::new();

        let receiver = {
            let ctx = ReceiverContext {
                socket: socket.clone(),
                store: store.clone(),
                shared: shared.clone(),
                poll_interval: config.poll_interval(),
                max_datagram: config.max_datagram,
            };
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(receive_loop(ctx, shutdown_rx))
        };
        let _ = lifecycle.mark_running();

        tracing::info!(
            addr = %local_addr,
            store = %store.path().display(),
            poll_ms = config.poll_interval().as_millis() as u64,
            "log daemon listening",
        );

        Ok(Self {
            local_addr,
            endpoint: Mutex::new(Some(socket)),
            store,
            shared,
            lifecycle,
            shutdown_tx,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn last_peer(&self) -> Option<SocketAddr> {
        self.shared.last_peer()
    }

    /// Send `Set Log Level=<n>` to the most recently observed producer.
    ///
    /// Returns the endpoint the command was sent to.
    pub async fn set_level(&self, level: LogLevel) -> Result<SocketAddr, DaemonError> {
        let socket = self.endpoint()?;
        let peer = self.shared.last_peer().ok_or(DaemonError::NoPeer)?;

        let frame = ControlCommand::SetLevel(level).encode();
        socket
            .send_to(frame.as_bytes(), peer)
            .await
            .map_err(|e| io_err(format!("udp://{peer}"), e))?;

        tracing::info!(peer = %peer, level = %level, "sent log level change");
        Ok(peer)
    }

    /// Every line currently in the store, read under the store lock.
    pub async fn dump(&self) -> Result<Vec<String>, DaemonError> {
        self.store.read_lines().await
    }

    pub fn stats(&self) -> DaemonStats {
        DaemonStats {
            state: self.lifecycle.state(),
            local_addr: self.local_addr,
            store_path: self.store.path().to_path_buf(),
            last_peer: self.shared.last_peer(),
            frames_stored: self.shared.frames_stored.load(Ordering::Relaxed),
            bytes_stored: self.shared.bytes_stored.load(Ordering::Relaxed),
            idle_polls: self.shared.idle_polls.load(Ordering::Relaxed),
            truncated_frames: self.shared.truncated_frames.load(Ordering::Relaxed),
        }
    }

    /// Stop the receive task, wait for it to exit, then release the endpoint.
    ///
    /// Calling this again after the daemon stopped (or while another call is
    /// stopping it) does nothing.
    pub async fn shutdown(&self) -> Result<(), DaemonError> {
        if !self.lifecycle.begin_stop() {
            tracing::debug!(state = %self.lifecycle.state(), "shutdown already handled");
            return Ok(());
        }
        tracing::info!("shutting down log daemon");

        let _ = self.shutdown_tx.send(());
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let joined = match handle {
            Some(handle) => handle.await,
            None => Ok(()),
        };

        self.endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.lifecycle.finish_stop();

        joined.map_err(|err| DaemonError::TaskJoin {
            task: "daemon receiver",
            reason: err.to_string(),
        })
    }

    fn endpoint(&self) -> Result<Arc<UdpSocket>, DaemonError> {
        let state = self.lifecycle.state();
        if state != LifecycleState::Running {
            return Err(DaemonError::NotRunning { state });
        }
        self.endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DaemonError::NotRunning { state })
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Install the process-wide tracing subscriber (`RUST_LOG`, default `info`).
///
/// Diagnostics go to stderr so they never mix with menu or dump output.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
