//! Fire-and-forget record emission.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::Ordering;

use udplog_core::LogRecord;

use crate::logger::Counters;

/// Encode `record` and hand it to the transport as one datagram.
///
/// `socket` is a non-blocking std handle on the producer endpoint, so a send
/// never waits on runtime readiness and works from any thread. Never blocks
/// and never retries: a full kernel buffer or any other send error drops the
/// record. Returns whether the datagram was accepted by the socket.
pub(crate) fn send_record(
    socket: &UdpSocket,
    daemon: SocketAddr,
    max_frame: usize,
    record: &LogRecord,
    counters: &Counters,
) -> bool {
    let frame = record.encode_bounded(max_frame);
    match socket.send_to(frame.as_bytes(), daemon) {
        Ok(_) => {
            counters.frames_sent.fetch_add(1, Ordering::Relaxed);
            true
        }
        Err(err) if err.kind() == ErrorKind::WouldBlock => {
            counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(daemon = %daemon, "socket buffer full; log record dropped");
            false
        }
        Err(err) => {
            counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(daemon = %daemon, error = %err, "log record send failed");
            false
        }
    }
}
