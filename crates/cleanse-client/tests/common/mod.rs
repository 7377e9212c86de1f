#![allow(dead_code)]

use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cleanse_client::notice::Notifier;
use tiny_http::{Header, Response, Server};

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// One decoded `multipart/form-data` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: String,
}

impl RecordedRequest {
    pub fn parts(&self) -> Vec<FormPart> {
        let boundary = self
            .content_type
            .split("boundary=")
            .nth(1)
            .expect("multipart boundary");
        let body = String::from_utf8(self.body.clone()).expect("utf-8 body");
        let delimiter = format!("--{boundary}");
        let mut parts = Vec::new();
        for segment in body.split(delimiter.as_str()).skip(1) {
            if segment.starts_with("--") {
                break;
            }
            let segment = segment.strip_prefix("\r\n").expect("part header line");
            let (head, data) = segment.split_once("\r\n\r\n").expect("part separator");
            let data = data.strip_suffix("\r\n").expect("part trailer");
            let mut name = None;
            let mut filename = None;
            let mut content_type = None;
            for line in head.split("\r\n") {
                if let Some(disposition) = line.strip_prefix("Content-Disposition: form-data") {
                    name = quoted_param(disposition, "name");
                    filename = quoted_param(disposition, "filename");
                } else if let Some(value) = line.strip_prefix("Content-Type: ") {
                    content_type = Some(value.to_string());
                }
            }
            parts.push(FormPart {
                name: name.expect("part name"),
                filename,
                content_type,
                data: data.to_string(),
            });
        }
        parts
    }

    pub fn part(&self, name: &str) -> Option<FormPart> {
        self.parts().into_iter().find(|part| part.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.parts().into_iter().map(|part| part.name).collect()
    }
}

fn quoted_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').find_map(|param| {
        param
            .trim()
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix("=\""))
            .and_then(|rest| rest.strip_suffix('"'))
            .map(str::to_string)
    })
}

pub type Handler = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Loopback HTTP server standing in for the recommendation service.
pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: Arc<Server>,
    handle: Option<thread::JoinHandle<()>>,
}

fn reserve_loopback_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

impl MockBackend {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let port = reserve_loopback_port();
        let server =
            Arc::new(Server::http(("127.0.0.1", port)).expect("start mock backend"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Box<Handler> = Box::new(handler);

        let worker_server = Arc::clone(&server);
        let worker_requests = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for mut request in worker_server.incoming_requests() {
                let content_type = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Content-Type"))
                    .map(|header| header.value.as_str().to_string())
                    .unwrap_or_default();
                let mut body = Vec::new();
                request
                    .as_reader()
                    .read_to_end(&mut body)
                    .expect("read request body");
                let recorded = RecordedRequest {
                    method: request.method().to_string(),
                    path: request.url().to_string(),
                    content_type,
                    body,
                };
                let (status, reply) = handler(&recorded);
                worker_requests
                    .lock()
                    .expect("request log")
                    .push(recorded);
                let response = Response::from_string(reply)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("content type header"),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            requests,
            server,
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Notifier that remembers every message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
    acknowledgments: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts").clone()
    }

    pub fn acknowledgments(&self) -> Vec<String> {
        self.acknowledgments.lock().expect("acknowledgments").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().expect("alerts").push(message.to_string());
    }

    fn acknowledge(&self, message: &str) {
        self.acknowledgments
            .lock()
            .expect("acknowledgments")
            .push(message.to_string());
    }
}

pub const WAIT: Duration = Duration::from_secs(10);
