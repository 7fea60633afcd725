//! Debounced recursive directory watching.
//!
//! # Architecture
//!
//! ```text
//! WatchEngine
//!   - notify::RecommendedWatcher (one non-recursive watch per directory)
//!   - WatchSet (directories currently registered)
//!   - ExtensionSet (which paths count as changes)
//!   - DebounceTimer (3 s quiet period)
//!         |
//!    TriggerSource  ---->  Runner (action / command)
//! ```

mod debouncer;
mod engine;
mod error;
mod extensions;
mod walk;
mod watch_set;

pub use debouncer::{DEBOUNCE_PERIOD, DebounceTimer};
pub use engine::{TriggerSource, WatchEngine};
pub use error::{ErrorHandler, WatchError};
pub use extensions::{ExtensionSet, PathClass, extension_of};
pub use walk::walk_dirs;
pub use watch_set::WatchSet;
