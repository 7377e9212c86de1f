//! Line input for the interactive session.

use std::io::{self, IsTerminal, Write};

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

fn use_dialoguer() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Reads one command line. `None` means end of input.
pub(crate) fn read_command(label: &str) -> anyhow::Result<Option<String>> {
    if use_dialoguer() {
        let theme = ColorfulTheme::default();
        let input = Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()?;
        return Ok(Some(input));
    }
    print!("{label}> ");
    io::stdout().flush()?;
    read_stdin_line()
}

/// Opens `current` for editing and returns the edited text. Line breaks are
/// never part of the result.
pub(crate) fn edit_text(label: &str, current: &str) -> anyhow::Result<String> {
    if use_dialoguer() {
        let theme = ColorfulTheme::default();
        let input = Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?;
        return Ok(input);
    }
    println!("{label} (currently: {current})");
    print!("new text [keep]: ");
    io::stdout().flush()?;
    match read_stdin_line()? {
        Some(line) if !line.is_empty() => Ok(line),
        _ => Ok(current.to_string()),
    }
}

pub(crate) fn prompt_yes_no(label: &str, default: bool) -> anyhow::Result<bool> {
    if use_dialoguer() {
        let theme = ColorfulTheme::default();
        let confirmed = Confirm::with_theme(&theme)
            .with_prompt(label)
            .default(default)
            .interact()?;
        return Ok(confirmed);
    }
    let default_text = if default { "Y/n" } else { "y/N" };
    print!("{label} [{default_text}]: ");
    io::stdout().flush()?;
    let Some(answer) = read_stdin_line()? else {
        return Ok(default);
    };
    match answer.to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => anyhow::bail!("Please answer yes or no."),
    }
}

fn read_stdin_line() -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
