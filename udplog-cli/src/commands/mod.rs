pub mod daemon;
pub mod dump;
pub mod emit;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

/// Run `future` on a fresh multi-thread runtime.
///
/// The runtime is shut down with a timeout so a blocked stdin read cannot
/// keep the process alive after the work is done.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(Duration::from_millis(200));
    Ok(output)
}

/// Ctrl-C as a cancellation signal; the listener never does any shutdown
/// work itself.
pub(crate) fn interrupt_signal() -> broadcast::Receiver<()> {
    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received ctrl-c");
                let _ = tx.send(());
            }
            Err(err) => {
                tracing::warn!(error = %err, "ctrl-c handler unavailable");
                // Keep the sender alive so receivers never see a closed channel.
                std::future::pending::<()>().await;
            }
        }
    });
    rx
}
