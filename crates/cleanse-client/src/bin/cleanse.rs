//! CLI entrypoint for the data-cleansing workflow client.

#[path = "cleanse/cli.rs"]
mod cli;
#[path = "cleanse/completions.rs"]
mod completions;
#[path = "cleanse/console.rs"]
mod console;
#[path = "cleanse/oneshot.rs"]
mod oneshot;
#[path = "cleanse/prompt.rs"]
mod prompt;
#[path = "cleanse/shell.rs"]
mod shell;
#[path = "cleanse/style.rs"]
mod style;

use clap::Parser;
use cleanse_client::config::ClientConfig;

use cli::{Cli, Command};

fn main() {
    if let Err(err) = run() {
        let message = format_error_with_tip(&err);
        eprintln!("{}", style::error(format!("Error: {message}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(Command::Completions { shell, out }) = &cli.command {
        return completions::run_completions(*shell, out.as_deref());
    }

    let mut config = ClientConfig::discover(cli.config.as_deref())?;
    if let Some(server) = cli.server.as_deref() {
        config = config.with_base_url(server)?;
    }
    init_tracing(&config, cli.verbose);

    match cli.command {
        None | Some(Command::Shell) => shell::run_shell(&config),
        Some(Command::Recommend { file, json }) => oneshot::run_recommend(&config, &file, json),
        Some(Command::Generate { file, select, code }) => {
            oneshot::run_generate(&config, &file, &select, code.as_deref())
        }
        Some(Command::Completions { .. }) => Ok(()),
    }
}

fn init_tracing(config: &ClientConfig, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config
            .log_level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn format_error_with_tip(err: &anyhow::Error) -> String {
    let message = err.to_string();
    let tip = if message.contains("invalid config") {
        Some("Tip: check cleanse.toml or pass --config <path>.")
    } else if message.contains("transport error") {
        Some("Tip: is the backend running? Point at it with --server <url>.")
    } else {
        None
    };
    match tip {
        Some(tip) => format!("{message}\n{tip}"),
        None => message,
    }
}
