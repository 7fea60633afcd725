use std::process::Command;
use tempfile::TempDir;

fn autocommand(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_autocommand"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = autocommand(temp_path)
        .arg("init")
        .output()
        .expect("Failed to run init command");

    assert!(output.status.success());

    // Check that config file was created
    let config_path = temp_path.join(".autocommand/settings.toml");
    assert!(config_path.exists());

    // Verify config content
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[watch]"));
    assert!(content.contains("[logging]"));
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();

    assert!(autocommand(temp_dir.path()).arg("init").status().unwrap().success());

    let output = autocommand(temp_dir.path()).arg("init").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("already exists"));

    assert!(
        autocommand(temp_dir.path())
            .args(["init", "--force"])
            .status()
            .unwrap()
            .success()
    );
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    // Create a custom config
    let config_dir = temp_path.join(".autocommand");
    std::fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"
version = 2
[watch]
extensions = [".go"]
[command]
program = "go"
args = ["build"]
"#;

    std::fs::write(config_dir.join("settings.toml"), config_content).unwrap();

    // Run from a subdirectory to exercise workspace discovery
    let nested = temp_path.join("pkg/inner");
    std::fs::create_dir_all(&nested).unwrap();

    let output = autocommand(&nested)
        .arg("config")
        .output()
        .expect("Failed to run config command");

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains(r#"program = "go""#));
    assert!(stdout.contains(".go"));
}

#[test]
fn test_run_without_command_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = autocommand(temp_dir.path())
        .args(["run", "-e", ".go"])
        .output()
        .expect("Failed to run run command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no command to run"));
}
