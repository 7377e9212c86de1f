//! Client configuration loading (`cleanse.toml`).

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::ClientError;

pub const DEFAULT_CONFIG_FILE: &str = "cleanse.toml";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_RECOMMENDATIONS_PATH: &str = "/get-recommendations";
pub const DEFAULT_SELECTIONS_PATH: &str = "/process-selections";
pub const DEFAULT_SESSION_KEY: &str = cleanse_core::session::UPLOADED_FILE_KEY;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub session_key: SmolStr,
    pub log_level: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: SmolStr,
    pub recommendations_path: SmolStr,
    pub selections_path: SmolStr,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl BackendConfig {
    #[must_use]
    pub fn recommendations_url(&self) -> String {
        join_url(&self.base_url, &self.recommendations_path)
    }

    #[must_use]
    pub fn selections_url(&self) -> String {
        join_url(&self.base_url, &self.selections_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: SmolStr::new(DEFAULT_BASE_URL),
                recommendations_path: SmolStr::new(DEFAULT_RECOMMENDATIONS_PATH),
                selections_path: SmolStr::new(DEFAULT_SELECTIONS_PATH),
                connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
                request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            },
            session_key: SmolStr::new(DEFAULT_SESSION_KEY),
            log_level: SmolStr::new("info"),
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            ClientError::InvalidConfig(format!("{}: {err}", path.display()).into())
        })?;
        Self::parse(&text)
    }

    /// Loads `path` when given, else `./cleanse.toml` when present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ClientError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let raw: ClientToml = toml::from_str(text).map_err(|err| {
            ClientError::InvalidConfig(format!("{DEFAULT_CONFIG_FILE}: {err}").into())
        })?;
        raw.into_config()
    }

    /// Replaces the backend base URL (`--server`).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ClientError> {
        self.backend.base_url = validate_base_url(base_url)?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClientToml {
    backend: Option<BackendSection>,
    session: Option<SessionSection>,
    log: Option<LogSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackendSection {
    base_url: Option<String>,
    recommendations_path: Option<String>,
    selections_path: Option<String>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSection {
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: Option<String>,
}

impl ClientToml {
    fn into_config(self) -> Result<ClientConfig, ClientError> {
        let backend = self.backend.unwrap_or_default();
        let base_url = validate_base_url(backend.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let recommendations_path = validate_path(
            "backend.recommendations_path",
            backend
                .recommendations_path
                .as_deref()
                .unwrap_or(DEFAULT_RECOMMENDATIONS_PATH),
        )?;
        let selections_path = validate_path(
            "backend.selections_path",
            backend
                .selections_path
                .as_deref()
                .unwrap_or(DEFAULT_SELECTIONS_PATH),
        )?;
        let connect_timeout = parse_timeout(
            "backend.connect_timeout_ms",
            backend.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        )?;
        let request_timeout = parse_timeout(
            "backend.request_timeout_ms",
            backend.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )?;

        let session_key = self
            .session
            .and_then(|session| session.key)
            .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string());
        if session_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "session.key must not be empty".into(),
            ));
        }

        let log_level = self
            .log
            .and_then(|log| log.level)
            .unwrap_or_else(|| "info".to_string())
            .trim()
            .to_ascii_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ClientError::InvalidConfig(
                format!("invalid log.level '{log_level}'").into(),
            ));
        }

        Ok(ClientConfig {
            backend: BackendConfig {
                base_url,
                recommendations_path,
                selections_path,
                connect_timeout,
                request_timeout,
            },
            session_key: SmolStr::new(session_key.trim()),
            log_level: SmolStr::new(log_level),
        })
    }
}

fn validate_base_url(text: &str) -> Result<SmolStr, ClientError> {
    let trimmed = text.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(host) if !host.is_empty() => Ok(SmolStr::new(trimmed)),
        _ => Err(ClientError::InvalidConfig(
            format!("invalid backend.base_url '{text}' (expected http:// or https://)").into(),
        )),
    }
}

fn validate_path(field: &str, text: &str) -> Result<SmolStr, ClientError> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Err(ClientError::InvalidConfig(
            format!("{field} must start with '/' (got '{text}')").into(),
        ));
    }
    Ok(SmolStr::new(trimmed))
}

fn parse_timeout(field: &str, millis: u64) -> Result<Duration, ClientError> {
    if millis == 0 {
        return Err(ClientError::InvalidConfig(
            format!("{field} must be greater than zero").into(),
        ));
    }
    Ok(Duration::from_millis(millis))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ClientConfig::parse("").expect("parse");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(
            config.backend.recommendations_url(),
            "http://127.0.0.1:5000/get-recommendations"
        );
        assert_eq!(
            config.backend.selections_url(),
            "http://127.0.0.1:5000/process-selections"
        );
    }

    #[test]
    fn full_file_is_applied() {
        let config = ClientConfig::parse(
            r#"
[backend]
base_url = "https://cleanse.internal:8443/"
recommendations_path = "/api/recommend"
selections_path = "/api/generate"
connect_timeout_ms = 500
request_timeout_ms = 9000

[session]
key = "dataset"

[log]
level = "DEBUG"
"#,
        )
        .expect("parse");
        assert_eq!(
            config.backend.recommendations_url(),
            "https://cleanse.internal:8443/api/recommend"
        );
        assert_eq!(config.backend.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.backend.request_timeout, Duration::from_secs(9));
        assert_eq!(config.session_key, "dataset");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[backend]\nbase_url = \"ftp://host\"\n",
            "[backend]\nbase_url = \"http://\"\n",
            "[backend]\nselections_path = \"generate\"\n",
            "[backend]\nconnect_timeout_ms = 0\n",
            "[session]\nkey = \"  \"\n",
            "[log]\nlevel = \"loud\"\n",
            "[backend]\nretries = 3\n",
        ] {
            let err = ClientConfig::parse(text).expect_err(text);
            assert!(matches!(err, ClientError::InvalidConfig(_)), "{text}: {err}");
        }
    }

    #[test]
    fn server_override_is_validated() {
        let config = ClientConfig::default()
            .with_base_url("http://10.0.0.5:5000/")
            .expect("override");
        assert_eq!(config.backend.base_url, "http://10.0.0.5:5000");
        assert!(ClientConfig::default().with_base_url("10.0.0.5").is_err());
    }
}
