//! Graceful shutdown for the daemon.
//!
//! A SIGINT/SIGTERM, or a call to [`ShutdownController::shutdown`], is
//! broadcast to every subscriber. The HTTP server holds one subscription as
//! its graceful-shutdown future and drains in-flight requests before exit.

use std::future::Future;

use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ShutdownController {
    notify: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    pub fn shutdown(&self) {
        // no receivers left means nobody is waiting
        let _ = self.notify.send(());
    }

    /// Resolves once shutdown has been triggered.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.notify.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Block until the process is asked to stop, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let name = termination_signal().await;
        info!(signal = name, "stop requested, draining HTTP API");
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only SIGINT stops the daemon");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed");
    }
    "ctrl-c"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signalled_resolves_after_shutdown() {
        let controller = ShutdownController::new();
        let first = controller.signalled();
        let second = controller.clone().signalled();
        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), async {
            first.await;
            second.await;
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn signalled_waits_without_trigger() {
        let controller = ShutdownController::new();
        let pending = tokio::time::timeout(Duration::from_millis(50), controller.signalled()).await;
        assert!(pending.is_err());
    }
}
