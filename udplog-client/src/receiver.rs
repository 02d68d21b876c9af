//! Control receive loop: `Set Log Level=<n>` frames update the filter.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use udplog_core::ControlCommand;

use crate::filter::FilterState;
use crate::logger::Counters;

/// Largest control frame accepted; longer datagrams are cut and then fail to decode.
pub(crate) const CONTROL_BUFFER_LEN: usize = 1024;

pub(crate) struct ControlContext {
    pub(crate) socket: Arc<UdpSocket>,
    pub(crate) filter: Arc<FilterState>,
    pub(crate) counters: Arc<Counters>,
    pub(crate) poll_interval: Duration,
}

pub(crate) async fn control_loop(ctx: ControlContext, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut buf = [0u8; CONTROL_BUFFER_LEN];

    loop {
        buf.fill(0);
        let received = tokio::select! {
            _ = shutdown_rx.recv() => break,
            received = tokio::time::timeout(ctx.poll_interval, ctx.socket.recv_from(&mut buf)) => received,
        };

        match received {
            Err(_elapsed) => {
                ctx.counters.idle_polls.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Ok((len, peer))) => match ControlCommand::decode(&buf[..len]) {
                Some(ControlCommand::SetLevel(level)) => {
                    let previous = ctx.filter.apply(level);
                    ctx.counters.commands_applied.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        peer = %peer,
                        from = %previous,
                        to = %level,
                        "log level updated by daemon",
                    );
                }
                None => {
                    ctx.counters.frames_ignored.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(peer = %peer, bytes = len, "ignoring unrecognized control frame");
                }
            },
            Ok(Err(err)) => {
                // ICMP errors from earlier sends surface here on some platforms.
                ctx.counters.idle_polls.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %err, "control receive failed; backing off");
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(ctx.poll_interval) => {}
                }
            }
        }
    }

    tracing::debug!("control receive loop exited");
}
