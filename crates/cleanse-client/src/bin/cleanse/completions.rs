//! Completion scripts for the `cleanse` command line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;
use tracing::info;

use crate::cli::Cli;

/// Writes the `shell` completion script to `out`, or to stdout.
pub fn run_completions(shell: Shell, out: Option<&Path>) -> anyhow::Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    match out {
        None => clap_complete::generate(shell, &mut command, name, &mut std::io::stdout()),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|err| {
                    anyhow::anyhow!("failed to create {}: {err}", parent.display())
                })?;
            }
            let file = File::create(path)
                .map_err(|err| anyhow::anyhow!("failed to create {}: {err}", path.display()))?;
            let mut writer = BufWriter::new(file);
            clap_complete::generate(shell, &mut command, name, &mut writer);
            writer
                .flush()
                .map_err(|err| anyhow::anyhow!("failed to write {}: {err}", path.display()))?;
            info!("{shell} completions written to {}", path.display());
        }
    }
    Ok(())
}
