use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout, Instant};

use udplog_core::{DaemonConfig, LifecycleState, LogLevel};
use udplog_daemon::{Daemon, DaemonError};

const POLL: Duration = Duration::from_millis(100);

fn test_config(dir: &TempDir) -> DaemonConfig {
    DaemonConfig {
        bind: "127.0.0.1:0".parse().expect("addr"),
        store_path: dir.path().join("log"),
        poll_interval_ms: POLL.as_millis() as u64,
        ..DaemonConfig::default()
    }
}

async fn producer() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.expect("bind producer")
}

async fn wait_for_lines(daemon: &Daemon, count: usize) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let lines = daemon.dump().await.expect("dump");
        if lines.len() >= count || Instant::now() >= deadline {
            return lines;
        }
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn stores_received_frames_verbatim() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");
    let sock = producer().await;

    sock.send_to(b"Fri Aug 14 09:03:07 2020 ERROR svc:run:42 boom\n", daemon.local_addr())
        .await
        .expect("send");

    let lines = wait_for_lines(&daemon, 1).await;
    assert_eq!(lines, vec!["Fri Aug 14 09:03:07 2020 ERROR svc:run:42 boom"]);
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn arbitrary_bytes_are_not_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");
    let sock = producer().await;

    sock.send_to(b"not a log record at all", daemon.local_addr())
        .await
        .expect("send");
    sock.send_to(b"c-style frame\n\0", daemon.local_addr())
        .await
        .expect("send");

    let lines = wait_for_lines(&daemon, 2).await;
    assert_eq!(lines, vec!["not a log record at all", "c-style frame"]);
    assert_eq!(daemon.stats().frames_stored, 2);
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn oversized_datagram_is_truncated_to_one_line() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.max_datagram = 64;
    let daemon = Daemon::start(config).await.expect("start");
    let sock = producer().await;

    let payload = format!("{}\n", "y".repeat(500));
    sock.send_to(payload.as_bytes(), daemon.local_addr())
        .await
        .expect("send");

    let lines = wait_for_lines(&daemon, 1).await;
    assert_eq!(lines, vec!["y".repeat(64)]);
    assert_eq!(daemon.stats().truncated_frames, 1);
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn frame_of_exactly_max_size_is_not_truncated() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.max_datagram = 64;
    let daemon = Daemon::start(config).await.expect("start");
    let sock = producer().await;

    let payload = format!("{}\n", "x".repeat(63));
    assert_eq!(payload.len(), 64);
    sock.send_to(payload.as_bytes(), daemon.local_addr())
        .await
        .expect("send");

    let lines = wait_for_lines(&daemon, 1).await;
    assert_eq!(lines, vec!["x".repeat(63)]);
    let stats = daemon.stats();
    assert_eq!(stats.truncated_frames, 0);
    assert_eq!(stats.bytes_stored, 64);
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn zero_length_datagram_updates_peer_without_writing() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    // Long enough that no receive times out during the test.
    config.poll_interval_ms = 10_000;
    let daemon = Daemon::start(config).await.expect("start");
    let sock = producer().await;

    sock.send_to(b"", daemon.local_addr()).await.expect("send");

    let deadline = Instant::now() + Duration::from_secs(2);
    while daemon.last_peer().is_none() && Instant::now() < deadline {
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(daemon.last_peer(), Some(sock.local_addr().expect("addr")));

    let stats = daemon.stats();
    assert_eq!(stats.idle_polls, 1);
    assert_eq!(stats.frames_stored, 0);
    assert!(daemon.dump().await.expect("dump").is_empty());

    // The empty datagram still makes the sender reachable for control frames.
    daemon.set_level(LogLevel::Critical).await.expect("set level");
    let mut buf = [0u8; 64];
    let (len, _) = timeout(Duration::from_secs(2), sock.recv_from(&mut buf))
        .await
        .expect("control frame in time")
        .expect("recv");
    assert_eq!(&buf[..len], b"Set Log Level=3");

    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_produce_whole_lines() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Arc::new(Daemon::start(test_config(&dir)).await.expect("start"));
    let target = daemon.local_addr();

    let mut handles = Vec::new();
    for sender in 0..6 {
        handles.push(tokio::spawn(async move {
            let sock = producer().await;
            for n in 0..20 {
                let frame = format!("sender-{sender} seq-{n} payload-{}\n", "z".repeat(100));
                sock.send_to(frame.as_bytes(), target).await.expect("send");
                sleep(Duration::from_millis(2)).await;
            }
        }));
    }
    for handle in handles {
        handle.await.expect("join sender");
    }

    // Loopback UDP may still drop under pressure; every line that arrived
    // must be exactly one complete frame.
    let lines = wait_for_lines(&daemon, 6 * 20).await;
    assert!(!lines.is_empty());
    for line in &lines {
        let parts: Vec<&str> = line.split(' ').collect();
        assert_eq!(parts.len(), 3, "interleaved line: {line}");
        assert!(parts[0].starts_with("sender-"));
        assert!(parts[1].starts_with("seq-"));
        assert_eq!(parts[2], format!("payload-{}", "z".repeat(100)));
    }
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn quiet_endpoint_counts_idle_polls_without_writing() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");

    sleep(POLL * 5 + POLL / 2).await;

    let stats = daemon.stats();
    assert!(
        stats.idle_polls >= 3 && stats.idle_polls <= 6,
        "expected about five idle polls, got {}",
        stats.idle_polls
    );
    assert_eq!(stats.frames_stored, 0);
    assert!(daemon.dump().await.expect("dump").is_empty());
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn set_level_targets_most_recent_peer() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");

    let first = producer().await;
    let second = producer().await;
    first.send_to(b"first\n", daemon.local_addr()).await.expect("send");
    wait_for_lines(&daemon, 1).await;
    second.send_to(b"second\n", daemon.local_addr()).await.expect("send");
    wait_for_lines(&daemon, 2).await;

    let target = daemon.set_level(LogLevel::Error).await.expect("set level");
    assert_eq!(target, second.local_addr().expect("addr"));

    let mut buf = [0u8; 64];
    let (len, from) = timeout(Duration::from_secs(2), second.recv_from(&mut buf))
        .await
        .expect("control frame in time")
        .expect("recv");
    assert_eq!(&buf[..len], b"Set Log Level=2");
    assert_eq!(from.port(), daemon.local_addr().port());

    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn set_level_without_peer_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");

    let err = daemon
        .set_level(LogLevel::Warning)
        .await
        .expect_err("no producer yet");
    assert!(matches!(err, DaemonError::NoPeer));
    daemon.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn shutdown_is_idempotent_and_releases_endpoint() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");
    let addr: SocketAddr = daemon.local_addr();
    assert_eq!(daemon.state(), LifecycleState::Running);

    let started = Instant::now();
    daemon.shutdown().await.expect("first shutdown");
    assert!(started.elapsed() <= POLL * 2, "shutdown exceeded poll bound");
    assert_eq!(daemon.state(), LifecycleState::Stopped);

    daemon.shutdown().await.expect("second shutdown is a no-op");
    assert_eq!(daemon.state(), LifecycleState::Stopped);

    let err = daemon
        .set_level(LogLevel::Debug)
        .await
        .expect_err("stopped daemon cannot send");
    assert!(matches!(
        err,
        DaemonError::NotRunning {
            state: LifecycleState::Stopped
        }
    ));

    // The port is free again once the endpoint has been released.
    UdpSocket::bind(addr).await.expect("rebind released endpoint");
}

#[tokio::test]
async fn dump_still_works_after_shutdown() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(test_config(&dir)).await.expect("start");
    let sock = producer().await;
    sock.send_to(b"kept\n", daemon.local_addr()).await.expect("send");
    wait_for_lines(&daemon, 1).await;

    daemon.shutdown().await.expect("shutdown");
    assert_eq!(daemon.dump().await.expect("dump"), vec!["kept"]);
}

#[tokio::test]
async fn bind_conflict_is_fatal_error() {
    let dir = TempDir::new().expect("tempdir");
    let occupied = std::net::UdpSocket::bind("127.0.0.1:0").expect("occupy port");
    let mut config = test_config(&dir);
    config.bind = occupied.local_addr().expect("addr");

    let err = Daemon::start(config).await.err().expect("bind must fail");
    assert!(matches!(err, DaemonError::Bind { .. }));
}
