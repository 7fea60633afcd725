//! Error types for the watch engine.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the watch engine.
///
/// Apart from `InitFailed`, none of these stop the engine. They are handed
/// to the caller-supplied [`ErrorHandler`] and watching continues.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Cannot stop watching {path}: {reason}")]
    UnwatchFailed { path: PathBuf, reason: String },

    #[error("Failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },

    #[error("Cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("The watcher is already running")]
    AlreadyRunning,

    #[error("The watcher was already started")]
    AlreadyStarted,

    #[error("Cannot listen for shutdown signals: {reason}")]
    Signal { reason: String },

    #[error("Background task '{task}' failed: {reason}")]
    TaskFailed { task: &'static str, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

/// Sink for every non-fatal error the engine runs into.
pub type ErrorHandler = Arc<dyn Fn(WatchError) + Send + Sync>;
