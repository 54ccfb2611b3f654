use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::driver::{Browser, Query};
use crate::run::run_model::StepStatus;
use crate::run::timing::{Timing, pause_ms, poll_until};

/// Toast bodies, ARIA alerts and inline form validation errors.
pub const DEFAULT_MARKER_XPATH: &str = "//*[contains(@class, 'Vue-Toastification__toast-body') \
     or @role='alert' or contains(@class, 'el-form-item__error')]";

pub const DEFAULT_CLOSE_SELECTOR: &str = ".Vue-Toastification__close-button";

/// Which elements count as feedback and how to close them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    #[serde(default = "default_marker_xpath")]
    pub marker_xpath: String,

    #[serde(default = "default_close_selector")]
    pub close_selector: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            marker_xpath: default_marker_xpath(),
            close_selector: default_close_selector(),
        }
    }
}

fn default_marker_xpath() -> String { DEFAULT_MARKER_XPATH.to_string() }
fn default_close_selector() -> String { DEFAULT_CLOSE_SELECTOR.to_string() }

/// Collect and dismiss transient feedback shown after an action.
///
/// Polls until at least one marker element exists or the notification window
/// elapses. Returns the trimmed, non-empty texts; an empty list is the normal
/// outcome when the page shows nothing. Driver failures while polling or
/// dismissing are logged and dropped here, never propagated.
pub fn capture_notifications<B: Browser + ?Sized>(
    browser: &mut B,
    config: &NotificationConfig,
    timing: &Timing,
) -> Vec<String> {
    let markers = Query::xpath(config.marker_xpath.as_str());

    let found = poll_until(
        Duration::from_millis(timing.notification_timeout_ms),
        Duration::from_millis(timing.notification_poll_ms),
        || {
            let elements = browser.find_elements(&markers)?;
            Ok((!elements.is_empty()).then_some(elements))
        },
    );

    let elements = match found {
        Ok(Some(elements)) => elements,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Notification polling failed: {}", e);
            return Vec::new();
        }
    };

    let mut texts = Vec::new();
    for element in &elements {
        match browser.element_text(element) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    texts.push(trimmed.to_string());
                }
            }
            Err(e) => warn!("Could not read notification text: {}", e),
        }
    }
    debug!("Captured {} notifications", texts.len());

    pause_ms(timing.dismiss_delay_ms);
    dismiss(browser, config);

    texts
}

/// Click every close button currently on the page, ignoring failures.
fn dismiss<B: Browser + ?Sized>(browser: &mut B, config: &NotificationConfig) {
    let close = Query::css(config.close_selector.as_str());
    let buttons = match browser.find_elements(&close) {
        Ok(buttons) => buttons,
        Err(e) => {
            warn!("Could not look up notification close buttons: {}", e);
            return;
        }
    };
    for button in &buttons {
        if let Err(e) = browser.click(button) {
            warn!("Error clicking notification close button: {}", e);
        }
    }
}

/// Let captured notifications override an action's own status.
///
/// Any entry containing "success" (case-insensitive) makes the step a
/// success; any other non-empty list makes it a failure; no notifications
/// keep `status` as is.
pub fn classify(status: StepStatus, notifications: &[String]) -> StepStatus {
    if notifications.is_empty() {
        status
    } else if notifications
        .iter()
        .any(|n| n.to_lowercase().contains("success"))
    {
        StepStatus::Success
    } else {
        StepStatus::Failed
    }
}
