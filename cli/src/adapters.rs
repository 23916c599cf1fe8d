//! Terminal implementations of the core platform seams.
//!
//! SYSTEM CONTEXT
//! ==============
//! `reqwest` carries requests, a JSON file stands in for browser storage so a
//! login survives between invocations, stderr replaces toasts and stdin
//! answers the session-expired prompt.

#[cfg(test)]
#[path = "adapters_test.rs"]
mod adapters_test;

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use visitdesk::net::Method;
use visitdesk::net::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use visitdesk::storage::{KeyValueStore, StorageError};
use visitdesk::{Navigator, Notifier};

// =============================================================================
// TRANSPORT
// =============================================================================

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout;
        let mut builder = self
            .client
            .request(http_method(request.method), &request.url)
            .query(&request.query)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned())))
            .collect();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?.to_vec();
        Ok(HttpResponse { status, headers, body })
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(error: reqwest::Error, timeout: std::time::Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_builder() {
        TransportError::Build(error.to_string())
    } else {
        TransportError::NoResponse(error.to_string())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Key-value storage persisted as one JSON object on disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StorageError::Unavailable(format!("{}: {e}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, items: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write(format!("{}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, raw).map_err(|e| StorageError::Write(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.get(key).and_then(Value::as_str).map(str::to_owned))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_owned(), Value::String(value.to_owned()));
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Messages go to stderr so stdout stays machine-readable.
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait(?Send)]
impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        eprintln!("ok: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    async fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return false;
        }
        eprint!("{title}: {message} [y/N] ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() {
            return false;
        }
        parse_answer(&line)
    }
}

pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Remembers where the core last sent the user. There is no page to show.
#[derive(Default)]
pub struct TerminalNavigator {
    location: RefCell<Option<String>>,
    title: RefCell<Option<String>>,
}

impl TerminalNavigator {
    pub fn location(&self) -> Option<String> {
        self.location.borrow().clone()
    }

    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(%path, "navigate");
        *self.location.borrow_mut() = Some(path.to_owned());
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = Some(title.to_owned());
    }
}
