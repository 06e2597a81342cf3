//! Ctrl+C / SIGTERM handling.
//!
//! The first signal cancels a [`CancellationToken`]: a running ExifTool
//! child is killed at once and the folder loop stops. A second
//! signal exits immediately with status 130.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

async fn next_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for Ctrl+C");
    }
}

/// Spawn the signal listener and return the token it cancels.
pub(crate) fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let received = Arc::new(AtomicU32::new(0));

    let handler_token = token.clone();
    tokio::spawn(async move {
        loop {
            next_signal().await;
            if received.fetch_add(1, Ordering::SeqCst) == 0 {
                tracing::warn!("Interrupted; stopping now (press Ctrl+C again to force exit)");
                handler_token.cancel();
            } else {
                tracing::warn!("Force exit requested");
                std::process::exit(130);
            }
        }
    });

    token
}
