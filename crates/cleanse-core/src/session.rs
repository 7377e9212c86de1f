//! Session-scoped slot for the last uploaded dataset.
//!
//! Session storage is text-only, so files are kept as `data:` URLs that carry
//! the mime type, the original file name and a base64 payload.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::ReviewError;

/// Default slot key for the uploaded dataset.
pub const UPLOADED_FILE_KEY: &str = "uploadedFile";
/// File name used when a stored URL carries none.
pub const FALLBACK_FILE_NAME: &str = "uploaded_file.csv";
/// Dataset extensions offered by the file picker.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

const OCTET_STREAM: &str = "application/octet-stream";

/// Raw dataset bytes with the name and type they were picked with.
#[derive(Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DatasetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl DatasetFile {
    /// Builds a file, guessing the mime type from the name's extension.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_for_name(&name).to_string();
        Self { name, mime, bytes }
    }

    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(FALLBACK_FILE_NAME);
        Ok(Self::new(name, bytes))
    }

    /// Encodes the file as a self-describing `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        let name = utf8_percent_encode(&self.name, NON_ALPHANUMERIC);
        format!(
            "data:{};name={name};base64,{}",
            self.mime,
            STANDARD.encode(&self.bytes)
        )
    }

    pub fn from_data_url(text: &str) -> Result<Self, ReviewError> {
        let rest = text
            .strip_prefix("data:")
            .ok_or_else(|| encoding_error("missing data: prefix"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| encoding_error("missing payload separator"))?;
        let header = header
            .strip_suffix(";base64")
            .ok_or_else(|| encoding_error("payload is not base64"))?;

        let mut params = header.split(';');
        let mime = match params.next().map(str::trim) {
            Some(mime) if !mime.is_empty() => mime.to_string(),
            _ => OCTET_STREAM.to_string(),
        };
        let mut name = None;
        for param in params {
            if let Some(value) = param.strip_prefix("name=") {
                let decoded = percent_decode_str(value)
                    .decode_utf8()
                    .map_err(|err| encoding_error(&format!("file name: {err}")))?;
                name = Some(decoded.into_owned());
            }
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|err| encoding_error(&format!("base64: {err}")))?;

        Ok(Self {
            name: name.unwrap_or_else(|| FALLBACK_FILE_NAME.to_string()),
            mime,
            bytes,
        })
    }
}

fn encoding_error(message: &str) -> ReviewError {
    ReviewError::SessionEncoding(SmolStr::new(message))
}

/// Mime type for a dataset file name.
#[must_use]
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        _ => OCTET_STREAM,
    }
}

/// Whether the picker should offer `name`.
#[must_use]
pub fn is_accepted_dataset(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Text key/value medium backing a session.
pub trait SessionStorage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, ReviewError>;
    fn set_item(&mut self, key: &str, value: String) -> Result<(), ReviewError>;
    fn remove_item(&mut self, key: &str) -> Result<(), ReviewError>;
    fn clear(&mut self) -> Result<(), ReviewError>;
}

/// Process-local storage; lives as long as the owning session.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ReviewError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), ReviewError> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), ReviewError> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ReviewError> {
        self.items.clear();
        Ok(())
    }
}

/// Storage that refuses every operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl SessionStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, ReviewError> {
        Err(ReviewError::SessionUnavailable)
    }

    fn set_item(&mut self, _key: &str, _value: String) -> Result<(), ReviewError> {
        Err(ReviewError::SessionUnavailable)
    }

    fn remove_item(&mut self, _key: &str) -> Result<(), ReviewError> {
        Err(ReviewError::SessionUnavailable)
    }

    fn clear(&mut self) -> Result<(), ReviewError> {
        Err(ReviewError::SessionUnavailable)
    }
}

/// Explicit session context handed to whoever needs session-scoped state.
pub struct SessionContext {
    storage: Box<dyn SessionStorage>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Starts a session on `storage`.
    #[must_use]
    pub fn init(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::init(MemoryStorage::default())
    }

    /// Drops everything the session stored.
    pub fn clear(&mut self) -> Result<(), ReviewError> {
        self.storage.clear()
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, ReviewError> {
        self.storage.get_item(key)
    }

    pub fn set_item(&mut self, key: &str, value: String) -> Result<(), ReviewError> {
        self.storage.set_item(key, value)
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), ReviewError> {
        self.storage.remove_item(key)
    }
}

/// One-slot store for the most recently uploaded dataset.
#[derive(Debug)]
pub struct SessionFileStore {
    context: SessionContext,
    key: SmolStr,
}

impl SessionFileStore {
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self::with_key(context, UPLOADED_FILE_KEY)
    }

    #[must_use]
    pub fn with_key(context: SessionContext, key: impl Into<SmolStr>) -> Self {
        Self {
            context,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persists `file`, replacing whatever the slot held.
    pub fn store(&mut self, file: &DatasetFile) -> Result<(), ReviewError> {
        self.context.set_item(&self.key, file.to_data_url())?;
        debug!(
            "stored '{}' ({} bytes) in session slot '{}'",
            file.name,
            file.bytes.len(),
            self.key
        );
        Ok(())
    }

    /// The stored dataset, or `None` when the slot is empty, the storage is
    /// unavailable, or the stored text does not decode.
    #[must_use]
    pub fn retrieve(&self) -> Option<DatasetFile> {
        let text = match self.context.get_item(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!("session slot '{}' unreadable: {err}", self.key);
                return None;
            }
        };
        match DatasetFile::from_data_url(&text) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!("session slot '{}' holds invalid data: {err}", self.key);
                None
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), ReviewError> {
        self.context.remove_item(&self.key)
    }

    /// Ends the session, dropping every stored item.
    pub fn end_session(&mut self) -> Result<(), ReviewError> {
        self.context.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = b"id,date\n1,2024-01-02\n".to_vec();
        bytes.extend_from_slice(&[0, 159, 255, 1, 128]);
        bytes
    }

    #[test]
    fn data_url_round_trips_bytes_and_name() {
        let file = DatasetFile::new("sales q1 (final).csv", sample_bytes());
        let url = file.to_data_url();
        assert!(url.starts_with("data:text/csv;name=sales%20q1%20%28final%29%2Ecsv;base64,"));

        let decoded = DatasetFile::from_data_url(&url).expect("decode");
        assert_eq!(decoded, file);
    }

    #[test]
    fn plain_data_url_uses_fallback_name() {
        let decoded =
            DatasetFile::from_data_url("data:text/csv;base64,YSxiCjEsMgo=").expect("decode");
        assert_eq!(decoded.name, FALLBACK_FILE_NAME);
        assert_eq!(decoded.mime, "text/csv");
        assert_eq!(decoded.bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn invalid_data_urls_are_rejected() {
        for text in [
            "text/csv;base64,AAAA",
            "data:text/csv;base64",
            "data:text/csv,a,b",
            "data:text/csv;base64,@@@",
        ] {
            assert!(
                matches!(
                    DatasetFile::from_data_url(text),
                    Err(ReviewError::SessionEncoding(_))
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_name("a.CSV"), "text/csv");
        assert_eq!(mime_for_name("a.xls"), "application/vnd.ms-excel");
        assert_eq!(
            mime_for_name("book.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(mime_for_name("notes.txt"), OCTET_STREAM);
        assert!(is_accepted_dataset("report.XLSX"));
        assert!(!is_accepted_dataset("report.json"));
        assert!(!is_accepted_dataset("csv"));
    }

    #[test]
    fn store_then_retrieve_returns_exact_file() {
        let mut store = SessionFileStore::new(SessionContext::in_memory());
        assert_eq!(store.retrieve(), None);

        let file = DatasetFile::new("data.xlsx", sample_bytes());
        store.store(&file).expect("store");
        assert_eq!(store.retrieve(), Some(file));

        let newer = DatasetFile::new("other.csv", b"x\n".to_vec());
        store.store(&newer).expect("store newer");
        assert_eq!(store.retrieve(), Some(newer));
    }

    #[test]
    fn sessions_are_isolated() {
        let mut first = SessionFileStore::new(SessionContext::in_memory());
        let second = SessionFileStore::new(SessionContext::in_memory());
        first
            .store(&DatasetFile::new("a.csv", b"a".to_vec()))
            .expect("store");
        assert!(first.retrieve().is_some());
        assert!(second.retrieve().is_none());
    }

    #[test]
    fn unavailable_storage_reads_as_absent() {
        let mut store = SessionFileStore::new(SessionContext::init(UnavailableStorage));
        let err = store
            .store(&DatasetFile::new("a.csv", b"a".to_vec()))
            .expect_err("storage disabled");
        assert_eq!(err, ReviewError::SessionUnavailable);
        assert_eq!(store.retrieve(), None);
    }

    #[test]
    fn corrupt_slot_reads_as_absent() {
        let mut context = SessionContext::in_memory();
        context
            .set_item(UPLOADED_FILE_KEY, "not a data url".to_string())
            .expect("seed");
        let store = SessionFileStore::new(context);
        assert_eq!(store.retrieve(), None);
    }

    #[test]
    fn end_session_clears_slot() {
        let mut store = SessionFileStore::with_key(SessionContext::in_memory(), "dataset");
        store
            .store(&DatasetFile::new("a.csv", b"a".to_vec()))
            .expect("store");
        store.end_session().expect("end");
        assert_eq!(store.retrieve(), None);
        assert_eq!(store.key(), "dataset");
    }
}
