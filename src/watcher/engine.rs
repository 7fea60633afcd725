//! Debounced recursive watch engine.
//!
//! The engine registers every directory under the configured roots with the
//! notification backend, then runs an event loop that:
//! 1. Receives raw events from notify
//! 2. Re-arms the debounce timer for paths with a configured extension
//! 3. Grows or shrinks the watch set when directories appear or vanish
//! 4. Emits a trigger whenever the debounce timer runs out

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::debouncer::{DEBOUNCE_PERIOD, DebounceTimer};
use super::error::{ErrorHandler, WatchError};
use super::extensions::{ExtensionSet, PathClass};
use super::walk::walk_dirs;
use super::watch_set::WatchSet;

/// Raw events buffered between the notify thread and the event loop.
const EVENT_BUFFER: usize = 100;

/// The notify watcher plus the receiving end of its callback channel.
struct Backend {
    watcher: notify::RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<Event>>,
}

/// Watches directory trees and turns bursts of relevant changes into
/// single triggers.
///
/// Single use: `start` hands the notification backend to the event loop,
/// and a second `start` fails with [`WatchError::AlreadyStarted`].
pub struct WatchEngine {
    roots: Vec<PathBuf>,
    extensions: ExtensionSet,
    errors: ErrorHandler,
    backend: Mutex<Option<Backend>>,
}

impl WatchEngine {
    /// Create an engine, panicking if the OS notification backend is
    /// unavailable. There is no degraded mode without it.
    pub fn new<I, S, F>(extensions: I, on_error: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(WatchError) + Send + Sync + 'static,
    {
        match Self::try_new(extensions, on_error) {
            Ok(engine) => engine,
            Err(e) => panic!("cannot initialize the file watcher: {e}"),
        }
    }

    /// Fallible variant of [`WatchEngine::new`].
    pub fn try_new<I, S, F>(extensions: I, on_error: F) -> Result<Self, WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(WatchError) + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(Self {
            roots: Vec::new(),
            extensions: ExtensionSet::new(extensions),
            errors: Arc::new(on_error),
            backend: Mutex::new(Some(Backend {
                watcher,
                events: rx,
            })),
        })
    }

    /// Set the root directories to watch. Touches nothing on disk.
    pub fn watch<I, P>(&mut self, roots: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    /// Pass an error to the caller-supplied handler.
    pub fn report(&self, err: WatchError) {
        (self.errors)(err)
    }

    /// Register every directory under the roots and spawn the event loop.
    ///
    /// Must be called inside a tokio runtime. Enumeration and registration
    /// failures are reported and skipped. The first trigger is due
    /// immediately so the action runs once at start-up. The loop runs until
    /// `shutdown` is cancelled, which also releases every OS watch.
    pub fn start(&self, shutdown: CancellationToken) -> Result<TriggerSource, WatchError> {
        let Backend { watcher, events } =
            self.backend.lock().take().ok_or(WatchError::AlreadyStarted)?;

        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let mut event_loop = EventLoop::new(
            WatchSet::new(watcher),
            self.extensions.clone(),
            self.errors.clone(),
            events,
            trigger_tx,
            DebounceTimer::armed(DEBOUNCE_PERIOD),
        );

        for root in &self.roots {
            event_loop.add_tree(root);
        }

        crate::log_event!(
            "watcher",
            "monitoring",
            "{} directories under {} roots for {}",
            event_loop.watch_set.len(),
            self.roots.len(),
            self.extensions.to_sorted_vec().join(" ")
        );

        let task = tokio::spawn(event_loop.run(shutdown));

        Ok(TriggerSource {
            triggers: trigger_rx,
            task,
        })
    }
}

/// Receiving side of a started engine.
///
/// Yields one value per debounce firing and closes once the event loop has
/// stopped.
pub struct TriggerSource {
    triggers: mpsc::Receiver<Instant>,
    task: JoinHandle<()>,
}

impl TriggerSource {
    /// Wait for the next trigger. `None` once the engine has shut down.
    pub async fn recv(&mut self) -> Option<Instant> {
        self.triggers.recv().await
    }

    /// Split into the trigger receiver and the event loop task handle.
    pub fn into_parts(self) -> (mpsc::Receiver<Instant>, JoinHandle<()>) {
        (self.triggers, self.task)
    }
}

/// What an event means for the directory at one of its paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirChange {
    /// Created, or renamed into place.
    Entered,
    /// Removed, or renamed away.
    Left,
    /// Renamed without a known direction; the filesystem decides.
    Moved,
    Touched,
}

impl DirChange {
    /// `index` is the path's position in the event. A paired rename lists
    /// the old name first and the new name second.
    fn of(kind: &EventKind, index: usize) -> Self {
        match kind {
            EventKind::Create(_) => Self::Entered,
            EventKind::Remove(_) => Self::Left,
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::To => Self::Entered,
                RenameMode::From => Self::Left,
                RenameMode::Both if index == 0 => Self::Left,
                RenameMode::Both => Self::Entered,
                _ => Self::Moved,
            },
            _ => Self::Touched,
        }
    }
}

/// Background loop classifying raw events. Sole owner of the watch set.
struct EventLoop {
    watch_set: WatchSet,
    extensions: ExtensionSet,
    errors: ErrorHandler,
    events: mpsc::Receiver<notify::Result<Event>>,
    triggers: mpsc::Sender<Instant>,
    timer: DebounceTimer,
}

impl EventLoop {
    fn new(
        watch_set: WatchSet,
        extensions: ExtensionSet,
        errors: ErrorHandler,
        events: mpsc::Receiver<notify::Result<Event>>,
        triggers: mpsc::Sender<Instant>,
        timer: DebounceTimer,
    ) -> Self {
        Self {
            watch_set,
            extensions,
            errors,
            events,
            triggers,
            timer,
        }
    }

    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = self.timer.expired() => {
                    if self.timer.take_ready() {
                        self.fire();
                    }
                }

                res = self.events.recv() => match res {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => self.report(WatchError::EventError {
                        details: e.to_string(),
                    }),
                    None => break,
                },
            }
        }

        crate::log_event!(
            "watcher",
            "stopped",
            "releasing {} directories",
            self.watch_set.len()
        );
    }

    fn report(&self, err: WatchError) {
        (self.errors)(err)
    }

    /// Hand a trigger to the consumer unless one is still unconsumed.
    fn fire(&self) {
        match self.triggers.try_send(Instant::now()) {
            Ok(()) => crate::debug_event!("watcher", "trigger"),
            Err(TrySendError::Full(_)) => {
                crate::debug_event!("watcher", "trigger", "previous one still pending")
            }
            Err(TrySendError::Closed(_)) => {
                crate::debug_event!("watcher", "trigger", "no consumer left")
            }
        }
    }

    async fn handle_event(&mut self, event: Event) {
        // Reads are not changes.
        if event.kind.is_access() {
            return;
        }

        for (index, path) in event.paths.iter().enumerate() {
            match self.extensions.classify(path) {
                PathClass::Qualifying => {
                    crate::debug_event!("watcher", "changed", "{:?} {}", event.kind, path.display());
                    self.timer.reset();
                }
                PathClass::Foreign => {}
                PathClass::Extensionless => {
                    let change = DirChange::of(&event.kind, index);
                    self.handle_extensionless(path, change).await
                }
            }
        }
    }

    /// Paths without an extension may be directories entering or leaving
    /// the watched trees.
    async fn handle_extensionless(&mut self, path: &Path, change: DirChange) {
        if change == DirChange::Left {
            let errors = &self.errors;
            let dropped = self.watch_set.remove_tree(path, |e| errors(e));
            if dropped > 0 {
                crate::log_event!(
                    "watcher",
                    "unwatched",
                    "{dropped} directories under {}",
                    path.display()
                );
                return;
            }
        }

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e)
                if e.kind() == io::ErrorKind::NotFound
                    && matches!(change, DirChange::Left | DirChange::Moved) =>
            {
                // Already gone, or renamed away in an undirected rename.
                if change == DirChange::Moved {
                    let errors = &self.errors;
                    self.watch_set.remove_tree(path, |e| errors(e));
                }
                return;
            }
            Err(e) => {
                self.report(WatchError::Stat {
                    path: path.to_path_buf(),
                    source: e,
                });
                return;
            }
        };

        if !metadata.is_dir() {
            return;
        }

        match change {
            DirChange::Entered | DirChange::Moved => self.add_tree(path),
            DirChange::Left => self.remove_walked_tree(path),
            DirChange::Touched => {}
        }
    }

    /// Watch `root` and every directory below it.
    fn add_tree(&mut self, root: &Path) {
        let errors = &self.errors;
        let dirs = walk_dirs(root, |e| errors(e));

        let mut added = 0;
        for dir in dirs {
            match self.watch_set.add(&dir) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => self.report(e),
            }
        }

        if added > 0 {
            crate::debug_event!(
                "watcher",
                "added",
                "{added} directories under {}",
                root.display()
            );
        }
    }

    /// Drop watches for every directory still found on disk under `root`.
    fn remove_walked_tree(&mut self, root: &Path) {
        let errors = &self.errors;
        let dirs = walk_dirs(root, |e| errors(e));

        for dir in dirs {
            if let Err(e) = self.watch_set.remove(&dir) {
                self.report(e);
            }
        }
    }
}
