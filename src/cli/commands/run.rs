//! Run command - watch directories and re-run a command on change.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::config::{CONFIG_DIR, CONFIG_FILE, Settings};
use crate::runner::Runner;
use crate::watcher::WatchEngine;

/// Apply CLI flags on top of file and environment settings.
///
/// Each flag group replaces the configured value only when given.
pub fn apply_overrides(
    settings: &mut Settings,
    dirs: Vec<PathBuf>,
    exts: Vec<String>,
    command: Vec<String>,
) {
    if !dirs.is_empty() {
        settings.watch.roots = dirs;
    }
    if !exts.is_empty() {
        settings.watch.extensions = exts;
    }

    let mut command = command.into_iter();
    if let Some(program) = command.next() {
        settings.command.program = Some(program);
        settings.command.args = command.collect();
    }
}

/// Run the watch loop until SIGINT or SIGTERM.
pub async fn run_watch(settings: &Settings) -> Result<()> {
    let Some(program) = settings.command.program.clone() else {
        bail!(
            "no command to run: pass one after `--` or set [command] program in {CONFIG_DIR}/{CONFIG_FILE}"
        );
    };

    let mut engine = WatchEngine::try_new(settings.watch.extensions.iter().cloned(), |e| {
        tracing::error!("[watcher] {e}")
    })
    .context("cannot initialize file watching")?;
    engine.watch(settings.watch.roots.iter().cloned());

    let runner = Runner::new(engine);
    if runner.engine().extensions().is_empty() {
        tracing::warn!("[run] no extensions configured, the command only runs once at start-up");
    }

    runner
        .run_with_command(program, settings.command.args.iter().cloned())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut settings = Settings::default();
        settings.watch.extensions = vec![".rs".to_string()];
        settings.command.program = Some("cargo".to_string());
        settings.command.args = vec!["build".to_string()];

        apply_overrides(&mut settings, vec![PathBuf::from("src")], vec![], vec![]);

        assert_eq!(settings.watch.roots, vec![PathBuf::from("src")]);
        assert_eq!(settings.watch.extensions, vec![".rs"]);
        assert_eq!(settings.command.program.as_deref(), Some("cargo"));
        assert_eq!(settings.command.args, vec!["build"]);
    }

    #[test]
    fn test_trailing_command_replaces_program_and_args() {
        let mut settings = Settings::default();
        settings.command.args = vec!["stale".to_string()];

        apply_overrides(
            &mut settings,
            vec![],
            vec![".go".to_string()],
            vec!["go".to_string(), "vet".to_string()],
        );

        assert_eq!(settings.watch.roots, vec![PathBuf::from(".")]);
        assert_eq!(settings.watch.extensions, vec![".go"]);
        assert_eq!(settings.command.program.as_deref(), Some("go"));
        assert_eq!(settings.command.args, vec!["vet"]);
    }

    #[tokio::test]
    async fn test_run_without_command_fails() {
        let err = run_watch(&Settings::default()).await.unwrap_err();
        assert!(err.to_string().contains("no command to run"));
    }
}
