//! Scripted in-memory browser for offline runner tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use replay_runner::browser::driver::{
    Browser, BrowserLauncher, By, ElementHandle, Query, SessionOptions, StorageState,
};
use replay_runner::browser::notification::{DEFAULT_CLOSE_SELECTOR, DEFAULT_MARKER_XPATH};
use replay_runner::error::{ReplayError, Result};

#[derive(Debug, Clone)]
pub enum ClickEffect {
    Navigate(String),
    Notify(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub by: By,
    pub value: String,
    pub text: String,
    pub visible: bool,
    pub on_click: Option<ClickEffect>,
}

impl FakeElement {
    pub fn new(by: By, value: &str) -> Self {
        Self {
            by,
            value: value.to_string(),
            text: String::new(),
            visible: true,
            on_click: None,
        }
    }

    pub fn id(value: &str) -> Self {
        Self::new(By::Id, value)
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = Some(effect);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub elements: Vec<FakeElement>,
    /// Shown right after the page loads
    pub notifications: Vec<String>,
    /// Where navigation to this page actually lands
    pub redirect: Option<String>,
}

impl FakePage {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn notify(mut self, text: &str) -> Self {
        self.notifications.push(text.to_string());
        self
    }

    pub fn redirect_to(mut self, url: &str) -> Self {
        self.redirect = Some(url.to_string());
        self
    }
}

/// State shared by a launcher and every session it opens.
#[derive(Debug, Default)]
pub struct World {
    pub pages: HashMap<String, FakePage>,
    /// Storage a fresh session reports before cookies are cleared
    pub initial_storage: StorageState,
    /// Commands that answer with a driver error
    pub failing: HashSet<&'static str>,
    pub fail_launch: bool,
    pub launches: usize,
    pub quits: usize,
    pub last_options: Option<SessionOptions>,
    /// Every interaction, in order
    pub events: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub world: Rc<RefCell<World>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.world.borrow_mut().pages.insert(url.to_string(), page);
        self
    }

    pub fn failing(self, command: &'static str) -> Self {
        self.world.borrow_mut().failing.insert(command);
        self
    }

    pub fn leaky(self, storage: StorageState) -> Self {
        self.world.borrow_mut().initial_storage = storage;
        self
    }

    pub fn fail_launch(self) -> Self {
        self.world.borrow_mut().fail_launch = true;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.world.borrow().events.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("type "))
            .collect()
    }

    pub fn launches(&self) -> usize {
        self.world.borrow().launches
    }

    pub fn quits(&self) -> usize {
        self.world.borrow().quits
    }
}

impl BrowserLauncher for FakeLauncher {
    type Session = FakeBrowser;

    fn launch(&self, options: &SessionOptions) -> Result<FakeBrowser> {
        let mut world = self.world.borrow_mut();
        if world.fail_launch {
            return Err(ReplayError::driver("launch", "browser binary missing"));
        }
        world.launches += 1;
        world.last_options = Some(*options);
        world.events.push("launch".into());
        let storage = world.initial_storage;
        drop(world);

        Ok(FakeBrowser {
            world: Rc::clone(&self.world),
            current: "about:blank".into(),
            active_notifications: Vec::new(),
            storage,
            closed: false,
        })
    }
}

pub struct FakeBrowser {
    world: Rc<RefCell<World>>,
    current: String,
    active_notifications: Vec<String>,
    storage: StorageState,
    closed: bool,
}

impl FakeBrowser {
    fn check(&self, command: &'static str) -> Result<()> {
        if self.closed {
            return Err(ReplayError::session_io("session closed"));
        }
        if self.world.borrow().failing.contains(command) {
            return Err(ReplayError::driver(command, "scripted failure"));
        }
        Ok(())
    }

    fn log(&self, event: String) {
        self.world.borrow_mut().events.push(event);
    }

    fn current_page(&self) -> FakePage {
        self.world
            .borrow()
            .pages
            .get(&self.current)
            .cloned()
            .unwrap_or_default()
    }

    fn go(&mut self, url: &str) {
        let page = self.world.borrow().pages.get(url).cloned();
        match page {
            Some(page) => {
                self.current = page.redirect.clone().unwrap_or_else(|| url.to_string());
                let landed = self.current_page();
                self.active_notifications = if page.redirect.is_some() {
                    landed.notifications
                } else {
                    page.notifications
                };
            }
            None => {
                self.current = url.to_string();
                self.active_notifications.clear();
            }
        }
    }

    fn element(&self, handle: &ElementHandle) -> Result<FakeElement> {
        let idx: usize = handle
            .0
            .strip_prefix('p')
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| ReplayError::driver("lookup", format!("bad handle {}", handle.0)))?;
        self.current_page()
            .elements
            .get(idx)
            .cloned()
            .ok_or_else(|| ReplayError::driver("lookup", format!("stale handle {}", handle.0)))
    }
}

impl Browser for FakeBrowser {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.check("navigate")?;
        self.log(format!("navigate {}", url));
        self.go(url);
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.check("refresh")?;
        self.log("refresh".into());
        Ok(())
    }

    fn current_url(&mut self) -> Result<String> {
        self.check("current_url")?;
        Ok(self.current.clone())
    }

    fn title(&mut self) -> Result<String> {
        self.check("title")?;
        Ok(String::new())
    }

    fn page_source(&mut self) -> Result<String> {
        self.check("page_source")?;
        Ok(self.current_page().html)
    }

    fn find_elements(&mut self, query: &Query) -> Result<Vec<ElementHandle>> {
        self.check("find_elements")?;
        if query.by == By::Xpath && query.value == DEFAULT_MARKER_XPATH {
            return Ok((0..self.active_notifications.len())
                .map(|i| ElementHandle(format!("n{}", i)))
                .collect());
        }
        if query.by == By::Css && query.value == DEFAULT_CLOSE_SELECTOR {
            return Ok(if self.active_notifications.is_empty() {
                Vec::new()
            } else {
                vec![ElementHandle("close".into())]
            });
        }
        self.log(format!("find {:?}={}", query.by, query.value));
        Ok(self
            .current_page()
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.by == query.by && e.value == query.value)
            .map(|(i, _)| ElementHandle(format!("p{}", i)))
            .collect())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.check("click")?;
        if element.0 == "close" {
            self.log("dismiss".into());
            self.active_notifications.clear();
            return Ok(());
        }
        let target = self.element(element)?;
        self.log(format!("click {}", target.value));
        match target.on_click {
            Some(ClickEffect::Navigate(url)) => self.go(&url),
            Some(ClickEffect::Notify(texts)) => self.active_notifications = texts,
            None => {}
        }
        Ok(())
    }

    fn clear(&mut self, element: &ElementHandle) -> Result<()> {
        self.check("clear")?;
        let target = self.element(element)?;
        self.log(format!("clear {}", target.value));
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()> {
        self.check("send_keys")?;
        let target = self.element(element)?;
        self.log(format!("type {}={}", target.value, text));
        Ok(())
    }

    fn element_text(&mut self, element: &ElementHandle) -> Result<String> {
        self.check("element_text")?;
        if let Some(i) = element.0.strip_prefix('n').and_then(|i| i.parse::<usize>().ok()) {
            return Ok(self.active_notifications.get(i).cloned().unwrap_or_default());
        }
        Ok(self.element(element)?.text)
    }

    fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool> {
        self.check("is_displayed")?;
        Ok(self.element(element)?.visible)
    }

    fn delete_all_cookies(&mut self) -> Result<()> {
        self.check("delete_cookies")?;
        self.log("delete_cookies".into());
        self.storage.cookies = 0;
        Ok(())
    }

    fn storage_state(&mut self) -> Result<StorageState> {
        self.check("storage_state")?;
        Ok(self.storage)
    }

    fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.check("screenshot")?;
        std::fs::write(path, b"png")?;
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut world = self.world.borrow_mut();
        world.quits += 1;
        world.events.push("quit".into());
        Ok(())
    }
}
