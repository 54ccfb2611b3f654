use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Browser capability: what the runner needs from an automation backend
// ============================================================================

/// Launch options for a fresh session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    /// Incognito / private browsing context
    pub private_mode: bool,
    pub disable_extensions: bool,
    pub disable_cache: bool,
}

impl SessionOptions {
    /// Isolated options used for every test iteration.
    pub fn isolated(headless: bool) -> Self {
        Self {
            headless,
            private_mode: true,
            disable_extensions: true,
            disable_cache: true,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::isolated(true)
    }
}

/// Low-level lookup strategy understood by the backend.
///
/// [`SelectorKind`](crate::case::case_model::SelectorKind) resolves to one of
/// these; `placeholder` has no counterpart because it is rewritten to xpath.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum By {
    Id,
    Name,
    Xpath,
    Css,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
}

/// A concrete query: strategy plus its value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Query {
    pub by: By,
    pub value: String,
}

impl Query {
    pub fn new(by: By, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(By::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(By::Xpath, value)
    }
}

/// Opaque reference to an element found in the current page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

/// Storage visible to the current page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageState {
    pub cookies: usize,
    pub local_storage: usize,
    pub session_storage: usize,
}

impl StorageState {
    pub fn is_empty(&self) -> bool {
        self.cookies == 0 && self.local_storage == 0 && self.session_storage == 0
    }
}

/// One live browser session. All calls block until the backend answers.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> Result<()>;

    fn refresh(&mut self) -> Result<()>;

    fn current_url(&mut self) -> Result<String>;

    fn title(&mut self) -> Result<String>;

    /// Full rendered page content (HTML source).
    fn page_source(&mut self) -> Result<String>;

    /// Every element matching the query, in document order. Never waits.
    fn find_elements(&mut self, query: &Query) -> Result<Vec<ElementHandle>>;

    fn click(&mut self, element: &ElementHandle) -> Result<()>;

    fn clear(&mut self, element: &ElementHandle) -> Result<()>;

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()>;

    fn element_text(&mut self, element: &ElementHandle) -> Result<String>;

    fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool>;

    fn delete_all_cookies(&mut self) -> Result<()>;

    fn storage_state(&mut self) -> Result<StorageState>;

    /// Capture a full-page image to `path`.
    fn screenshot(&mut self, path: &Path) -> Result<()>;

    /// End the session. Calling it twice must be harmless.
    fn quit(&mut self) -> Result<()>;
}

/// Opens fresh browser sessions.
pub trait BrowserLauncher {
    type Session: Browser;

    fn launch(&self, options: &SessionOptions) -> Result<Self::Session>;
}
