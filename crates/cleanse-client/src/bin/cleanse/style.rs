//! Shared styling helpers for CLI output.

use std::io::IsTerminal;

use owo_colors::OwoColorize;

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

fn paint(text: &str, color: impl FnOnce(&str) -> String) -> String {
    if should_color() {
        color(text)
    } else {
        text.to_string()
    }
}

pub fn success(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), |text| text.green().to_string())
}

pub fn warning(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), |text| text.yellow().to_string())
}

pub fn error(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), |text| text.red().to_string())
}

pub fn accent(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), |text| text.cyan().to_string())
}

pub fn dim(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), |text| text.dimmed().to_string())
}
