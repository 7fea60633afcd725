//! Watch directory trees and run an action after changes settle.
//!
//! A [`WatchEngine`] keeps one watch per directory under the configured
//! roots, follows directories as they are created and removed, and emits a
//! trigger once no file with a configured extension has changed for three
//! seconds. A [`Runner`] turns triggers into calls of a closure or runs of
//! an external command until the process is told to stop.

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod runner;
pub mod watcher;

pub use config::Settings;
pub use lifecycle::ShutdownSignal;
pub use runner::{Action, CommandAction, RunError, Runner, SHUTDOWN_GRACE};
pub use watcher::{
    DEBOUNCE_PERIOD, ErrorHandler, ExtensionSet, TriggerSource, WatchEngine, WatchError,
};
