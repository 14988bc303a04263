// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Interrupt handling.
//!
//! The listener only cancels the session token. Restoration happens on the
//! main task, so later signals are logged and otherwise ignored.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut terminate = Terminate::install();
        loop {
            let signal = tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "failed to listen for Ctrl-C");
                        return;
                    }
                    "interrupt"
                }
                _ = terminate.recv() => "terminate",
            };
            on_signal(signal, &cancel);
        }
    })
}

fn on_signal(signal: &str, cancel: &CancellationToken) {
    if cancel.is_cancelled() {
        info!(signal, "signal received while shutting down, ignoring");
    } else {
        info!(signal, "signal received, cancelling session");
        cancel.cancel();
    }
}

/// SIGTERM stream; never fires where it is unavailable.
struct Terminate {
    #[cfg(unix)]
    stream: Option<tokio::signal::unix::Signal>,
}

impl Terminate {
    fn install() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let stream = match signal(SignalKind::terminate()) {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    None
                }
            };
            Self { stream }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        if let Some(stream) = self.stream.as_mut() {
            stream.recv().await;
            return;
        }
        std::future::pending::<()>().await
    }
}
