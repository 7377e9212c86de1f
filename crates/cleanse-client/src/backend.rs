//! Recommendation/code generation backend client.

#![allow(missing_docs)]

use cleanse_core::DatasetFile;
use smol_str::SmolStr;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::ClientError;
use crate::multipart::MultipartForm;

/// Longest error body kept in a [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Payload of a selections → code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub file: DatasetFile,
    pub selected_options: Vec<String>,
    /// Current code text; only sent when non-empty.
    pub generated_code: Option<String>,
}

impl GenerateRequest {
    pub fn to_form(&self) -> Result<MultipartForm, ClientError> {
        let options = serde_json::to_string(&self.selected_options)
            .map_err(|err| ClientError::Encoding(SmolStr::new(err.to_string())))?;
        let mut form = file_form(&self.file).text("selectedOptions", &options);
        if let Some(code) = self.generated_code.as_deref().filter(|code| !code.is_empty()) {
            form = form.text("generatedCode", code);
        }
        Ok(form)
    }
}

/// Form for the upload → recommendations request.
#[must_use]
pub fn file_form(file: &DatasetFile) -> MultipartForm {
    MultipartForm::new().file("file", &file.name, &file.mime, &file.bytes)
}

/// The two backend calls the workflow makes. Both return the raw response body.
pub trait Backend: Send + Sync {
    fn fetch_recommendations(&self, file: &DatasetFile) -> Result<String, ClientError>;
    fn process_selections(&self, request: &GenerateRequest) -> Result<String, ClientError>;
}

/// HTTP implementation over a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    agent: ureq::Agent,
    recommendations_url: String,
    selections_url: String,
}

impl HttpBackend {
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.request_timeout)
            .build();
        Self {
            agent,
            recommendations_url: config.recommendations_url(),
            selections_url: config.selections_url(),
        }
    }

    fn post_form(&self, url: &str, form: &MultipartForm) -> Result<String, ClientError> {
        let encoded = form.encode();
        debug!("POST {url} ({} bytes)", encoded.body.len());
        let result = self
            .agent
            .post(url)
            .set("Content-Type", &encoded.content_type())
            .set("Accept", "application/json")
            .send_bytes(&encoded.body);
        match result {
            Ok(response) => response.into_string().map_err(|err| {
                ClientError::Transport(format!("failed to read response from {url}: {err}").into())
            }),
            Err(ureq::Error::Status(status, response)) => {
                let mut body = response.into_string().unwrap_or_default();
                truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
                Err(ClientError::Status {
                    status,
                    body: SmolStr::new(body),
                })
            }
            Err(ureq::Error::Transport(err)) => {
                Err(ClientError::Transport(SmolStr::new(err.to_string())))
            }
        }
    }
}

impl Backend for HttpBackend {
    fn fetch_recommendations(&self, file: &DatasetFile) -> Result<String, ClientError> {
        self.post_form(&self.recommendations_url, &file_form(file))
    }

    fn process_selections(&self, request: &GenerateRequest) -> Result<String, ClientError> {
        let form = request.to_form()?;
        self.post_form(&self.selections_url, &form)
    }
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
