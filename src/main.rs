use clap::Parser;

use autocommand::Settings;
use autocommand::cli::commands::{init, run};
use autocommand::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    autocommand::logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Init { force } => {
            let current_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
            exit_on_error(init::run_init(&current_dir, force).map(|_| ()));
        }

        Commands::Config => {
            let current_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
            let source = Settings::find_workspace_config(&current_dir);
            exit_on_error(init::run_config(&config, source.as_deref()));
        }

        Commands::Run {
            dirs,
            exts,
            command,
        } => {
            run::apply_overrides(&mut config, dirs, exts, command);
            let code = match run::run_watch(&config).await {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    1
                }
            };
            // Exit here: dropping the runtime would wait for a command that
            // is still running.
            std::process::exit(code);
        }
    }
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
