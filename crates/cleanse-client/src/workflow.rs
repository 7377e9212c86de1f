//! Upload → recommend and select → generate orchestration.
//!
//! Requests run on worker threads. Each worker reports exactly one completion
//! event over a channel, and the controller applies completions on its own
//! thread in arrival order (`process_events` / `wait_idle`). The loading flag
//! is set while a generate request is outstanding and cleared by its
//! completion, whether it succeeded, failed, or the worker died.

#![allow(missing_docs)]

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cleanse_core::{
    CommittedEdit, DatasetFile, EditTarget, ReviewError, ReviewState, SessionContext,
    SessionFileStore, StepId,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, GenerateRequest, HttpBackend};
use crate::clipboard::Clipboard;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::notice::{self, Notifier};

/// Identifier handed out for each request issued by the controller.
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Generate,
}

impl Phase {
    fn thread_name(self) -> &'static str {
        match self {
            Self::Upload => "cleanse-upload",
            Self::Generate => "cleanse-generate",
        }
    }
}

/// Completion of one backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEvent {
    pub request: RequestId,
    pub phase: Phase,
    pub result: Result<String, ClientError>,
}

/// A completion after the controller applied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub request: RequestId,
    pub phase: Phase,
    pub failure: Option<ClientError>,
}

/// What a submit action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request issued; its completion arrives as an event.
    Started(RequestId),
    /// Precondition failed; the user was alerted and nothing was sent.
    Aborted,
    /// A generate request is already outstanding.
    Busy,
}

/// Sends the completion event when dropped, so a worker that unwinds still
/// reports back.
struct CompletionGuard {
    tx: Sender<WorkflowEvent>,
    request: RequestId,
    phase: Phase,
    result: Option<Result<String, ClientError>>,
}

impl CompletionGuard {
    fn finish(mut self, result: Result<String, ClientError>) {
        self.result = Some(result);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or(Err(ClientError::WorkerLost));
        let event = WorkflowEvent {
            request: self.request,
            phase: self.phase,
            result,
        };
        if self.tx.send(event).is_err() {
            debug!("workflow controller gone; dropping completion {}", self.request);
        }
    }
}

/// Wires user actions to the review state and the backend.
pub struct WorkflowController {
    files: SessionFileStore,
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    review: ReviewState,
    raw_response: String,
    loading: bool,
    last_failure: Option<(Phase, ClientError)>,
    in_flight: usize,
    next_request: RequestId,
    events_tx: Sender<WorkflowEvent>,
    events_rx: Receiver<WorkflowEvent>,
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("files", &self.files)
            .field("review", &self.review)
            .field("loading", &self.loading)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl WorkflowController {
    #[must_use]
    pub fn new(
        files: SessionFileStore,
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            files,
            backend,
            notifier,
            review: ReviewState::new(),
            raw_response: String::new(),
            loading: false,
            last_failure: None,
            in_flight: 0,
            next_request: 1,
            events_tx,
            events_rx,
        }
    }

    /// Controller talking HTTP to the configured backend, with a fresh
    /// in-memory session.
    #[must_use]
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let files =
            SessionFileStore::with_key(SessionContext::in_memory(), config.session_key.clone());
        Self::new(files, Arc::new(HttpBackend::new(&config.backend)), notifier)
    }

    #[must_use]
    pub fn review(&self) -> &ReviewState {
        &self.review
    }

    /// Pretty-printed body of the last upload response.
    #[must_use]
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the most recent completion, if it failed.
    #[must_use]
    pub fn last_failure(&self) -> Option<&(Phase, ClientError)> {
        self.last_failure.as_ref()
    }

    /// Requests issued but not yet applied.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[must_use]
    pub fn session_file(&self) -> Option<DatasetFile> {
        self.files.retrieve()
    }

    /// Upload flow: stores the file in the session, then asks for
    /// recommendations.
    pub fn submit_upload(&mut self, file: Option<DatasetFile>) -> SubmitOutcome {
        let Some(file) = file else {
            self.notifier.alert(notice::NO_FILE_SELECTED);
            return SubmitOutcome::Aborted;
        };
        match self.files.store(&file) {
            Ok(()) => self.notifier.acknowledge(notice::FILE_STORED),
            Err(err) => warn!("could not keep '{}' in session: {err}", file.name),
        }

        let backend = Arc::clone(&self.backend);
        info!("requesting recommendations for '{}'", file.name);
        self.dispatch(Phase::Upload, move || backend.fetch_recommendations(&file))
    }

    /// Generate flow: sends the session file, the selections and the current
    /// code, and replaces the code with the response.
    pub fn submit_choices(&mut self) -> SubmitOutcome {
        if self.loading {
            debug!("generate request already outstanding");
            self.notifier.acknowledge(notice::GENERATING);
            return SubmitOutcome::Busy;
        }
        let Some(file) = self.files.retrieve() else {
            self.notifier.alert(notice::NO_FILE_IN_SESSION);
            return SubmitOutcome::Aborted;
        };
        self.commit_edit();

        let code = self.review.code().to_text();
        let request = GenerateRequest {
            file,
            selected_options: self.review.selected_descriptions(),
            generated_code: (!code.is_empty()).then_some(code),
        };
        info!(
            "requesting code for {} selected steps",
            request.selected_options.len()
        );
        let backend = Arc::clone(&self.backend);
        self.loading = true;
        self.dispatch(Phase::Generate, move || backend.process_selections(&request))
    }

    fn dispatch<F>(&mut self, phase: Phase, call: F) -> SubmitOutcome
    where
        F: FnOnce() -> Result<String, ClientError> + Send + 'static,
    {
        let request = self.next_request;
        self.next_request += 1;
        let guard = CompletionGuard {
            tx: self.events_tx.clone(),
            request,
            phase,
            result: None,
        };
        self.in_flight += 1;
        let spawned = thread::Builder::new()
            .name(phase.thread_name().to_string())
            .spawn(move || {
                let result = call();
                guard.finish(result);
            });
        if let Err(err) = spawned {
            // The closure (and its guard) was dropped, so the failure is
            // already queued as a completion.
            error!("failed to start {phase:?} request: {err}");
        }
        SubmitOutcome::Started(request)
    }

    /// Applies every completion that has already arrived, in arrival order.
    pub fn process_events(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            applied.push(self.apply(event));
        }
        applied
    }

    /// Blocks until no request is outstanding or `timeout` elapses. Returns
    /// whether the controller is idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.apply(event);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        self.in_flight == 0
    }

    fn apply(&mut self, event: WorkflowEvent) -> Applied {
        self.in_flight = self.in_flight.saturating_sub(1);
        if event.phase == Phase::Generate {
            self.loading = false;
        }
        let applied = Applied {
            request: event.request,
            phase: event.phase,
            failure: event.result.as_ref().err().cloned(),
        };
        let body = match event.result {
            Ok(body) => {
                self.last_failure = None;
                body
            }
            Err(err) => {
                match event.phase {
                    Phase::Upload => error!(
                        "Error fetching recommendations (request {}): {err}",
                        event.request
                    ),
                    Phase::Generate => error!(
                        "Error processing selections (request {}): {err}",
                        event.request
                    ),
                }
                self.last_failure = Some((event.phase, err));
                return applied;
            }
        };
        match event.phase {
            Phase::Upload => self.apply_recommendations(body),
            Phase::Generate => self.apply_code(&body),
        }
        applied
    }

    fn apply_recommendations(&mut self, body: String) {
        let value = parse_body(&body);
        self.raw_response = match &value {
            Value::Null => body,
            value => serde_json::to_string_pretty(value).unwrap_or(body),
        };
        self.review.apply_recommendations(&value);
        info!(
            "received {} recommendation categories ({} steps)",
            self.review.recommendations().len(),
            self.review.recommendations().step_count()
        );
    }

    fn apply_code(&mut self, body: &str) {
        let code = code_field(&parse_body(body));
        self.review.apply_code(&code);
        info!("received {} lines of code", self.review.code().len());
    }

    /// Seeds the code buffer, e.g. with code generated in an earlier session.
    pub fn load_code(&mut self, text: &str) {
        self.review.apply_code(text);
    }

    pub fn toggle_step(&mut self, id: StepId) -> Result<bool, ReviewError> {
        self.review.toggle_step(id)
    }

    /// Activation gesture over a recommendation field or code line.
    pub fn begin_edit(
        &mut self,
        target: EditTarget,
    ) -> Result<Option<CommittedEdit>, ReviewError> {
        self.review.begin_edit(target)
    }

    pub fn set_edit_buffer(&mut self, text: impl Into<String>) -> bool {
        self.review.set_edit_buffer(text)
    }

    /// Blur or confirm on the active field.
    pub fn commit_edit(&mut self) -> Option<CommittedEdit> {
        self.review.commit_edit()
    }

    /// Copies the assembled code out and acknowledges the outcome.
    pub fn copy_code(&mut self, clipboard: &mut dyn Clipboard) -> Result<(), ClientError> {
        self.commit_edit();
        let text = self.review.code().to_text();
        match clipboard.write_text(&text) {
            Ok(()) => {
                self.notifier.acknowledge(notice::CODE_COPIED);
                Ok(())
            }
            Err(err) => {
                self.notifier.acknowledge(&format!("Copy failed: {err}"));
                Err(err)
            }
        }
    }

    /// Ends the session: forgets the stored dataset.
    pub fn end_session(&mut self) -> Result<(), ClientError> {
        self.files.end_session().map_err(ClientError::from)
    }
}

fn parse_body(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!("response is not JSON ({err}); treating it as empty");
            Value::Null
        }
    }
}

/// The response's `code` field as text. Missing, null, false, zero and empty
/// values all mean "no code".
fn code_field(response: &Value) -> String {
    match response.get("code") {
        None | Some(Value::Null | Value::Bool(false)) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
        Some(other) => other.to_string(),
    }
}
