use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::browser::driver::{
    Browser, BrowserLauncher, By, ElementHandle, Query, SessionOptions, StorageState,
};
use crate::error::{ReplayError, Result};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate { url: String },
    Refresh,
    CurrentUrl,
    Title,
    PageSource,
    FindElements { by: By, value: String },
    Click { element: ElementHandle },
    Clear { element: ElementHandle },
    Type { element: ElementHandle, text: String },
    ElementText { element: ElementHandle },
    IsDisplayed { element: ElementHandle },
    DeleteCookies,
    StorageState,
    Screenshot { path: String },
    Quit,
}

impl BrowserRequest {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Refresh => "refresh",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::Title => "title",
            BrowserRequest::PageSource => "page_source",
            BrowserRequest::FindElements { .. } => "find_elements",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Clear { .. } => "clear",
            BrowserRequest::Type { .. } => "type",
            BrowserRequest::ElementText { .. } => "element_text",
            BrowserRequest::IsDisplayed { .. } => "is_displayed",
            BrowserRequest::DeleteCookies => "delete_cookies",
            BrowserRequest::StorageState => "storage_state",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub elements: Option<Vec<String>>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub storage: Option<StorageState>,
}

/// A browser session backed by browser_server.js.
///
/// Each session is its own Node.js process owning one Chromium instance, so
/// nothing survives from one session to the next. Commands are sent as
/// NDJSON over stdin, responses read from stdout.
#[derive(Debug)]
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    /// Spawn `node <script> <options-json>` and wait for the ready signal.
    pub fn launch(node: &str, script: &Path, options: &SessionOptions) -> Result<Self> {
        let script_name = script.display().to_string();
        let options_json = serde_json::to_string(options)?;

        let mut child = Command::new(node)
            .arg(script)
            .arg(&options_json)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ReplayError::Spawn {
                script: script_name.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReplayError::session_io("Failed to capture stdin of browser_server.js"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReplayError::session_io("Failed to capture stdout of browser_server.js"))?;

        let mut session = BrowserSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let response = session.read_response()?;
        if !response.ok || response.ready != Some(true) {
            let message = response
                .error
                .unwrap_or_else(|| "Did not receive ready signal from browser_server.js".into());
            session.closed = true;
            session.reap();
            return Err(ReplayError::driver("launch", message));
        }

        info!("Browser session started ({}, headless={})", script_name, options.headless);
        Ok(session)
    }

    fn read_response(&mut self) -> Result<BrowserResponse> {
        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            ReplayError::session_io(format!("Failed to read from browser_server.js stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(ReplayError::session_io(
                "Empty response from browser_server.js (process may have died)",
            ));
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    /// Kill and wait for a process that never became ready.
    fn reap(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!("Could not kill browser_server.js: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("browser_server.js did not exit cleanly: {}", e);
        }
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse> {
        if self.closed {
            return Err(ReplayError::session_io("Browser session already closed"));
        }
        let json = serde_json::to_string(request)?;
        debug!("-> {}", request.name());

        writeln!(self.stdin, "{}", json).map_err(|e| {
            ReplayError::session_io(format!("Failed to write to browser_server.js stdin: {}", e))
        })?;
        self.stdin.flush().map_err(|e| {
            ReplayError::session_io(format!("Failed to flush browser_server.js stdin: {}", e))
        })?;

        self.read_response()
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest) -> Result<BrowserResponse> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(ReplayError::driver(
                request.name(),
                response.error.unwrap_or_else(|| "Unknown error".into()),
            ));
        }
        Ok(response)
    }

    fn missing(command: &str, field: &str) -> ReplayError {
        ReplayError::driver(command, format!("No {} in response", field))
    }
}

impl Browser for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.send_ok(&BrowserRequest::Navigate { url: url.to_string() })?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.send_ok(&BrowserRequest::Refresh)?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::CurrentUrl)?;
        response.url.ok_or_else(|| Self::missing("current_url", "url"))
    }

    fn title(&mut self) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::Title)?;
        Ok(response.title.unwrap_or_default())
    }

    fn page_source(&mut self) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::PageSource)?;
        response.html.ok_or_else(|| Self::missing("page_source", "html"))
    }

    fn find_elements(&mut self, query: &Query) -> Result<Vec<ElementHandle>> {
        let response = self.send_ok(&BrowserRequest::FindElements {
            by: query.by,
            value: query.value.clone(),
        })?;
        Ok(response
            .elements
            .unwrap_or_default()
            .into_iter()
            .map(ElementHandle)
            .collect())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.send_ok(&BrowserRequest::Click { element: element.clone() })?;
        Ok(())
    }

    fn clear(&mut self, element: &ElementHandle) -> Result<()> {
        self.send_ok(&BrowserRequest::Clear { element: element.clone() })?;
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()> {
        self.send_ok(&BrowserRequest::Type {
            element: element.clone(),
            text: text.to_string(),
        })?;
        Ok(())
    }

    fn element_text(&mut self, element: &ElementHandle) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::ElementText { element: element.clone() })?;
        Ok(response.text.unwrap_or_default())
    }

    fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool> {
        let response = self.send_ok(&BrowserRequest::IsDisplayed { element: element.clone() })?;
        Ok(response.visible.unwrap_or(false))
    }

    fn delete_all_cookies(&mut self) -> Result<()> {
        self.send_ok(&BrowserRequest::DeleteCookies)?;
        Ok(())
    }

    fn storage_state(&mut self) -> Result<StorageState> {
        let response = self.send_ok(&BrowserRequest::StorageState)?;
        response.storage.ok_or_else(|| Self::missing("storage_state", "storage"))
    }

    fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.send_ok(&BrowserRequest::Screenshot {
            path: path.display().to_string(),
        })?;
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // The process may already be gone
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            warn!("Could not send quit to browser_server.js: {}", e);
        }
        self.closed = true;
        if let Err(e) = self.child.wait() {
            warn!("browser_server.js did not exit cleanly: {}", e);
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!("Failed to close browser session: {}", e);
        }
    }
}

/// Launches [`BrowserSession`]s through Node.js + Playwright.
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    pub node: String,
    pub script: PathBuf,
}

impl PlaywrightLauncher {
    pub fn new(node: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            script: script.into(),
        }
    }
}

impl Default for PlaywrightLauncher {
    fn default() -> Self {
        Self::new("node", "node/browser_server.js")
    }
}

impl BrowserLauncher for PlaywrightLauncher {
    type Session = BrowserSession;

    fn launch(&self, options: &SessionOptions) -> Result<BrowserSession> {
        BrowserSession::launch(&self.node, &self.script, options)
    }
}
