//! `init` and `config` subcommands.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

use crate::config::{CONFIG_DIR, CONFIG_FILE, Settings};

/// Write the default settings file under `dir`.
///
/// An existing file is only replaced with `force`.
pub fn run_init(dir: &Path, force: bool) -> Result<PathBuf> {
    let target = dir.join(CONFIG_DIR).join(CONFIG_FILE);
    if target.exists() && !force {
        bail!(
            "{} already exists (pass --force to replace it)",
            target.display()
        );
    }

    let written = Settings::init_config_file(dir, force)
        .map_err(|e| anyhow!("cannot write {}: {e}", target.display()))?;

    println!("Wrote default settings to {}", written.display());
    println!("Set [watch] extensions and [command] program, then start `autocommand run`.");
    Ok(written)
}

/// Print the effective settings.
pub fn run_config(settings: &Settings, source: Option<&Path>) -> Result<()> {
    print!("{}", render_settings(settings, source)?);
    Ok(())
}

/// Settings as TOML, preceded by a comment naming the file they came from.
pub fn render_settings(settings: &Settings, source: Option<&Path>) -> Result<String> {
    let mut out = String::new();
    match source {
        Some(path) => writeln!(out, "# loaded from {}", path.display())?,
        None => writeln!(out, "# no {CONFIG_DIR}/{CONFIG_FILE} found, using defaults")?,
    }
    writeln!(out, "# AC_* environment variables are applied")?;
    out.push('\n');
    out.push_str(&toml::to_string_pretty(settings)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_then_refuses_without_force() {
        let temp = TempDir::new().unwrap();

        let written = run_init(temp.path(), false).unwrap();
        assert_eq!(written, temp.path().join(".autocommand/settings.toml"));
        assert!(written.exists());

        let err = run_init(temp.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");

        assert_eq!(run_init(temp.path(), true).unwrap(), written);
    }

    #[test]
    fn test_render_names_source() {
        let mut settings = Settings::default();
        settings.command.program = Some("make".to_string());

        let rendered = render_settings(&settings, Some(Path::new("/w/.autocommand/settings.toml")))
            .unwrap();
        assert!(rendered.starts_with("# loaded from /w/.autocommand/settings.toml\n"));
        assert!(rendered.contains(r#"program = "make""#));

        let defaults = render_settings(&Settings::default(), None).unwrap();
        assert!(defaults.contains("using defaults"));
        assert!(defaults.contains("[watch]"));
    }
}
