//! Shutdown on interrupt or termination signals.

use tokio_util::sync::CancellationToken;

use crate::watcher::WatchError;

/// Cancellation token that fires when the process is asked to stop.
///
/// Signal handlers are installed by [`ShutdownSignal::arm`] itself, before
/// any watching starts, so a signal arriving early is not lost.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Listen for SIGINT and SIGTERM (Ctrl+C on non-unix platforms).
    ///
    /// Must be called inside a tokio runtime.
    pub fn arm() -> Result<Self, WatchError> {
        let token = CancellationToken::new();
        let mut listener = SignalListener::register()?;

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                name = listener.recv() => {
                    crate::log_event!("signal", "received", "{name}");
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        });

        Ok(Self { token })
    }

    /// A signal that only fires through [`ShutdownSignal::trigger`].
    pub fn manual() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request shutdown without an OS signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Block until shutdown has been requested.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }
}

#[cfg(unix)]
struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn register() -> Result<Self, WatchError> {
        use tokio::signal::unix::{SignalKind, signal};

        let to_error = |e: std::io::Error| WatchError::Signal {
            reason: e.to_string(),
        };

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(to_error)?,
            terminate: signal(SignalKind::terminate()).map_err(to_error)?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn register() -> Result<Self, WatchError> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::error!("[signal] failed to listen for ctrl-c: {e}");
                std::future::pending().await
            }
        }
    }
}
