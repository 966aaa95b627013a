//! Process signal handling.

use tokio::sync::mpsc;

use super::shutdown::Shutdown;

/// Watch process signals until a termination signal arrives.
///
/// SIGINT (ctrl-c) and SIGTERM trigger the shutdown broadcast; SIGHUP
/// requests a routing table rebuild.
pub async fn watch(shutdown: Shutdown, reload: mpsc::Sender<()>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                return;
            }
        };
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGHUP handler");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = terminate.recv() => break,
                _ = hangup.recv() => {
                    tracing::info!("SIGHUP received, requesting routing table rebuild");
                    let _ = reload.try_send(());
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = reload; // rebuilds are interval-only without unix signals
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}
