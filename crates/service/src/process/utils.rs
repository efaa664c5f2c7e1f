use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const REQUEST_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Spawns a task that listens for SIGINT and SIGTERM and sends a shutdown signal via a watch.
///
/// Returns the join handle, the sender (for programmatic shutdown), and the receiver.
/// Falls back to waiting on ctrl-c alone when the signal handlers cannot be installed.
pub fn graceful_shutdown_blocker() -> (JoinHandle<()>, watch::Sender<()>, watch::Receiver<()>) {
    let (tx, rx) = tokio::sync::watch::channel(());
    let signal_tx = tx.clone();

    let handlers = signal(SignalKind::interrupt())
        .and_then(|sigint| Ok((sigint, signal(SignalKind::terminate())?)));

    let handle = tokio::spawn(async move {
        match handlers {
            Ok((mut sigint, mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        tracing::debug!("gracefully exiting immediately on SIGINT");
                    }
                    _ = sigterm.recv() => {
                        tracing::debug!("SIGTERM received, draining requests for {:?}", REQUEST_GRACE_PERIOD);
                        tokio::time::sleep(REQUEST_GRACE_PERIOD).await;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("failed to install signal handlers: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }

        // the api server stops accepting once this fires
        let _ = signal_tx.send(());
    });

    (handle, tx, rx)
}

/// Registers a panic hook that logs panics using the `tracing` crate
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info() {
    let build = common::prelude::build_info();

    tracing::info!(
        build_profile = ?build.build_profile,
        features = ?build.build_features,
        version = ?build.version,
        "cafe service starting up"
    );
}
