//! Runs an action, or an external command, every time the engine triggers.

use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::ShutdownSignal;
use crate::watcher::{WatchEngine, WatchError};

/// How long shutdown waits for an in-flight action before returning.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Something to do after the watched tree settles.
///
/// Runs on a blocking thread, one invocation at a time. Any closure
/// `FnMut() + Send` is an action.
pub trait Action: Send + 'static {
    fn run(&mut self);
}

impl<F> Action for F
where
    F: FnMut() + Send + 'static,
{
    fn run(&mut self) {
        (*self)()
    }
}

/// Failures of a spawned command. Logged only, never escalated.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{status}")]
    Exit { status: ExitStatus },
}

/// External command launched with argv semantics, no shell involved.
///
/// Stdout and stderr are inherited from this process; stdin is closed.
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
    command_line: String,
}

impl CommandAction {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let command_line = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            program,
            args,
            command_line,
        }
    }

    /// Program and arguments joined with single spaces. For display only.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Launch the command and wait for it to exit.
    pub fn execute(&self) -> Result<(), RunError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| RunError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RunError::Exit { status })
        }
    }
}

impl Action for CommandAction {
    fn run(&mut self) {
        crate::log_event!("start", "running command", "[{}]", self.command_line);
        match self.execute() {
            Ok(()) => tracing::info!("[ok]"),
            Err(e) => crate::log_event!("failed", "got error", "{e}"),
        }
    }
}

/// Records whether a run loop was ever started. Never resets.
#[derive(Debug, Default)]
struct RunGuard {
    running: Mutex<bool>,
}

impl RunGuard {
    /// Check-and-set. The lock is held only for this.
    fn try_begin(&self) -> bool {
        let mut running = self.running.lock();
        if *running {
            false
        } else {
            *running = true;
            true
        }
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }
}

/// Drives a [`WatchEngine`]: one run loop per instance, one action
/// invocation per trigger.
pub struct Runner {
    engine: WatchEngine,
    guard: RunGuard,
}

impl Runner {
    pub fn new(engine: WatchEngine) -> Self {
        Self {
            engine,
            guard: RunGuard::default(),
        }
    }

    pub fn engine(&self) -> &WatchEngine {
        &self.engine
    }

    /// Whether a run loop has been started on this runner.
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Run `action` on every trigger until SIGINT or SIGTERM.
    ///
    /// A second call on the same runner reports
    /// [`WatchError::AlreadyRunning`] and returns at once.
    pub async fn run_with_action<A: Action>(&self, action: A) -> Result<(), WatchError> {
        if !self.begin() {
            return Ok(());
        }

        let signal = ShutdownSignal::arm()?;
        self.drive(action, signal.token()).await
    }

    /// Run `program args...` on every trigger until SIGINT or SIGTERM.
    ///
    /// Launch failures and non-zero exits are logged and watching goes on.
    pub async fn run_with_command<I, S>(
        &self,
        program: impl Into<String>,
        args: I,
    ) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_action(CommandAction::new(program, args)).await
    }

    /// Like [`Runner::run_with_action`], but stops when `shutdown` is
    /// cancelled instead of on OS signals.
    pub async fn run_until<A: Action>(
        &self,
        action: A,
        shutdown: CancellationToken,
    ) -> Result<(), WatchError> {
        if !self.begin() {
            return Ok(());
        }

        self.drive(action, shutdown).await
    }

    fn begin(&self) -> bool {
        if self.guard.try_begin() {
            true
        } else {
            self.engine.report(WatchError::AlreadyRunning);
            false
        }
    }

    async fn drive<A: Action>(
        &self,
        mut action: A,
        shutdown: CancellationToken,
    ) -> Result<(), WatchError> {
        let (mut triggers, event_task) = self.engine.start(shutdown.clone())?.into_parts();

        let stop = shutdown.clone();
        let worker = tokio::task::spawn_blocking(move || {
            while triggers.blocking_recv().is_some() {
                // A trigger still buffered at shutdown is dropped.
                if stop.is_cancelled() {
                    break;
                }
                action.run();
            }
        });

        shutdown.cancelled().await;
        crate::log_event!("runner", "shutting down");

        if let Err(e) = event_task.await {
            self.engine.report(WatchError::TaskFailed {
                task: "event loop",
                reason: e.to_string(),
            });
        }

        // An action still in flight gets a short grace period, then is left
        // to finish on its own thread.
        match tokio::time::timeout(SHUTDOWN_GRACE, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.engine.report(WatchError::TaskFailed {
                task: "action",
                reason: e.to_string(),
            }),
            Err(_) => crate::log_event!(
                "runner",
                "not waiting",
                "action still running after {SHUTDOWN_GRACE:?}"
            ),
        }

        Ok(())
    }
}
