//! Daemon receive loop: datagrams in, store lines out.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use udplog_core::codec::store_frame;

use crate::store::LogStore;

/// State the receive loop shares with the control surface.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    last_peer: Mutex<Option<SocketAddr>>,
    pub(crate) frames_stored: AtomicU64,
    pub(crate) bytes_stored: AtomicU64,
    pub(crate) idle_polls: AtomicU64,
    pub(crate) truncated_frames: AtomicU64,
}

impl Shared {
    /// Most recent datagram sender. This is "the client" for control
    /// commands; with several producers it is whichever spoke last.
    pub(crate) fn last_peer(&self) -> Option<SocketAddr> {
        *self.last_peer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observe_peer(&self, peer: SocketAddr) {
        *self.last_peer.lock().unwrap_or_else(PoisonError::into_inner) = Some(peer);
    }

    fn record_idle(&self) {
        self.idle_polls.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) struct ReceiverContext {
    pub(crate) socket: Arc<UdpSocket>,
    pub(crate) store: Arc<LogStore>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) poll_interval: Duration,
    pub(crate) max_datagram: usize,
}

/// Receive until a shutdown signal arrives.
///
/// Each iteration waits at most one poll interval for a datagram. An empty
/// wait or a zero-length datagram counts as one idle poll; the shutdown
/// signal is observed at every wait, so exit latency never exceeds the
/// poll interval.
pub(crate) async fn receive_loop(ctx: ReceiverContext, mut shutdown_rx: broadcast::Receiver<()>) {
    let limit = ctx.max_datagram.max(1);
    // One spare byte tells a frame of exactly `limit` bytes from a longer one.
    let mut buf = vec![0u8; limit + 1];

    loop {
        buf.fill(0);
        let received = tokio::select! {
            _ = shutdown_rx.recv() => break,
            received = tokio::time::timeout(ctx.poll_interval, ctx.socket.recv_from(&mut buf)) => received,
        };

        match received {
            Err(_elapsed) => {
                ctx.shared.record_idle();
                tracing::trace!("receive timed out; polling again");
            }
            Ok(Ok((0, peer))) => {
                ctx.shared.record_idle();
                ctx.shared.observe_peer(peer);
            }
            Ok(Ok((len, peer))) => {
                ctx.shared.observe_peer(peer);
                let len = if len > limit {
                    ctx.shared.truncated_frames.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        peer = %peer,
                        limit,
                        "datagram exceeds the receive limit; storing truncated frame",
                    );
                    limit
                } else {
                    len
                };
                persist(&ctx, &buf[..len], peer).await;
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "receive failed; backing off");
                ctx.shared.record_idle();
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(ctx.poll_interval) => {}
                }
            }
        }
    }

    tracing::debug!("daemon receive loop exited");
}

async fn persist(ctx: &ReceiverContext, datagram: &[u8], peer: SocketAddr) {
    let Some(frame) = store_frame(datagram) else {
        ctx.shared.record_idle();
        return;
    };
    match ctx.store.append(&frame).await {
        Ok(()) => {
            ctx.shared.frames_stored.fetch_add(1, Ordering::Relaxed);
            ctx.shared
                .bytes_stored
                .fetch_add(frame.len() as u64, Ordering::Relaxed);
            tracing::debug!(peer = %peer, bytes = frame.len(), "stored log frame");
        }
        Err(err) => {
            tracing::error!(peer = %peer, error = %err, "failed to append frame to log store");
        }
    }
}
