use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use udplog_core::{ClientConfig, Lifecycle, LifecycleState, LogLevel, LogRecord};

use crate::error::ClientError;
use crate::filter::FilterState;
use crate::receiver::{control_loop, ControlContext};
use crate::sender::send_record;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) frames_sent: AtomicU64,
    pub(crate) frames_dropped: AtomicU64,
    pub(crate) commands_applied: AtomicU64,
    pub(crate) frames_ignored: AtomicU64,
    pub(crate) idle_polls: AtomicU64,
}

/// Snapshot of producer-side counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStats {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub commands_applied: u64,
    pub frames_ignored: u64,
    pub idle_polls: u64,
}

/// Producer handle: one UDP endpoint used both to send records to the
/// daemon and to receive its control frames.
///
/// Sharing the endpoint is what lets the daemon reach this producer: it
/// replies to the source address of the last datagram it received.
pub struct Logger {
    program: String,
    daemon: SocketAddr,
    local_addr: SocketAddr,
    max_frame: usize,
    filter: Arc<FilterState>,
    counters: Arc<Counters>,
    endpoint: RwLock<Option<Arc<UdpSocket>>>,
    lifecycle: Lifecycle,
    shutdown_tx: broadcast::Sender<()>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Logger {
    /// Bind the producer endpoint and spawn the control receiver.
    ///
    /// Must be called from within a tokio runtime. The endpoint is held twice:
    /// a std handle for sending, so [`Logger::log`] works from any thread
    /// without waiting on the runtime, and a tokio handle for the control
    /// receiver.
    pub async fn start(config: ClientConfig) -> Result<Self, ClientError> {
        let bind = config.bind_addr();
        let socket = UdpSocket::bind(bind)
            .map_err(|source| ClientError::Bind { addr: bind, source })?;
        socket.set_nonblocking(true).map_err(ClientError::Socket)?;
        let local_addr = socket.local_addr().map_err(ClientError::Socket)?;
        let sender = Arc::new(socket.try_clone().map_err(ClientError::Socket)?);
        let control =
            Arc::new(tokio::net::UdpSocket::from_std(socket).map_err(ClientError::Socket)?);

        let filter = Arc::new(FilterState::new(config.initial_level));
        let counters = Arc::new(Counters::default());
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let lifecycle = Lifecycle::new();

        let receiver = tokio::spawn(control_loop(
            ControlContext {
                socket: control,
                filter: filter.clone(),
                counters: counters.clone(),
                poll_interval: config.poll_interval(),
            },
            shutdown_tx.subscribe(),
        ));
        let _ = lifecycle.mark_running();

        tracing::debug!(
            local = %local_addr,
            daemon = %config.daemon,
            level = %config.initial_level,
            "producer logger started",
        );

        Ok(Self {
            program: config.program,
            daemon: config.daemon,
            local_addr,
            max_frame: config.max_frame,
            filter,
            counters,
            endpoint: RwLock::new(Some(sender)),
            lifecycle,
            shutdown_tx,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn daemon_addr(&self) -> SocketAddr {
        self.daemon
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current filter threshold.
    pub fn level(&self) -> LogLevel {
        self.filter.threshold()
    }

    /// Whether a record at `level` would currently be sent.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.filter.allows(level)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            frames_sent: self.counters.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.counters.frames_dropped.load(Ordering::Relaxed),
            commands_applied: self.counters.commands_applied.load(Ordering::Relaxed),
            frames_ignored: self.counters.frames_ignored.load(Ordering::Relaxed),
            idle_polls: self.counters.idle_polls.load(Ordering::Relaxed),
        }
    }

    /// Emit one record if `level` passes the filter.
    ///
    /// A filtered call returns `false` before touching the record fields.
    /// Otherwise the encoded record goes out as a single datagram with no
    /// confirmation; the return value says whether the socket accepted it.
    pub fn log(
        &self,
        level: LogLevel,
        program: &str,
        function: &str,
        line: u32,
        message: &str,
    ) -> bool {
        if !self.filter.allows(level) {
            return false;
        }
        let Some(socket) = self.socket() else {
            return false;
        };
        let record = LogRecord::new(level, program, function, line, message);
        send_record(&socket, self.daemon, self.max_frame, &record, &self.counters)
    }

    /// [`Logger::log`] with this logger's configured program name.
    pub fn log_here(&self, level: LogLevel, function: &str, line: u32, message: &str) -> bool {
        self.log(level, &self.program, function, line, message)
    }

    /// Stop the control receiver, wait for it, then release the send handle.
    /// The receiver's handle closes when its task exits.
    ///
    /// Later calls are no-ops, and [`Logger::log`] returns `false` once the
    /// endpoint is gone.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        if !self.lifecycle.begin_stop() {
            return Ok(());
        }

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
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.lifecycle.finish_stop();
        tracing::debug!(local = %self.local_addr, "producer logger stopped");

        joined.map_err(|err| ClientError::TaskJoin {
            task: "control receiver",
            reason: err.to_string(),
        })
    }

    fn socket(&self) -> Option<Arc<UdpSocket>> {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
