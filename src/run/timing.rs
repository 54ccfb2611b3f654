use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Every fixed pause and polling window used while running steps.
///
/// Serialized in milliseconds so it can sit in the YAML config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timing {
    /// Length of one unit of a step's `wait`
    #[serde(default = "default_wait_unit_ms")]
    pub wait_unit_ms: u64,
    /// Pause after navigation so the page can load
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,
    #[serde(default = "default_post_click_ms")]
    pub post_click_ms: u64,
    #[serde(default = "default_notification_timeout_ms")]
    pub notification_timeout_ms: u64,
    #[serde(default = "default_poll_ms")]
    pub notification_poll_ms: u64,
    /// Pause between the notification texts being read and the close buttons being clicked
    #[serde(default = "default_dismiss_delay_ms")]
    pub dismiss_delay_ms: u64,
    /// Pause after opening a dropdown before its options are read
    #[serde(default = "default_dropdown_settle_ms")]
    pub dropdown_settle_ms: u64,
    #[serde(default = "default_dropdown_timeout_ms")]
    pub dropdown_timeout_ms: u64,
    #[serde(default = "default_poll_ms")]
    pub dropdown_poll_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wait_unit_ms: default_wait_unit_ms(),
            navigation_settle_ms: default_navigation_settle_ms(),
            post_click_ms: default_post_click_ms(),
            notification_timeout_ms: default_notification_timeout_ms(),
            notification_poll_ms: default_poll_ms(),
            dismiss_delay_ms: default_dismiss_delay_ms(),
            dropdown_settle_ms: default_dropdown_settle_ms(),
            dropdown_timeout_ms: default_dropdown_timeout_ms(),
            dropdown_poll_ms: default_poll_ms(),
        }
    }
}

fn default_wait_unit_ms() -> u64 { 1000 }
fn default_navigation_settle_ms() -> u64 { 1000 }
fn default_post_click_ms() -> u64 { 500 }
fn default_notification_timeout_ms() -> u64 { 3000 }
fn default_dismiss_delay_ms() -> u64 { 1000 }
fn default_dropdown_settle_ms() -> u64 { 1000 }
fn default_dropdown_timeout_ms() -> u64 { 3000 }
fn default_poll_ms() -> u64 { 250 }

impl Timing {
    /// No pauses and single-shot polls. For offline tests.
    pub fn instant() -> Self {
        Self {
            wait_unit_ms: 0,
            navigation_settle_ms: 0,
            post_click_ms: 0,
            notification_timeout_ms: 0,
            notification_poll_ms: 0,
            dismiss_delay_ms: 0,
            dropdown_settle_ms: 0,
            dropdown_timeout_ms: 0,
            dropdown_poll_ms: 0,
        }
    }

    /// Duration of a step's post-action `wait`.
    pub fn step_wait(&self, units: u64) -> Duration {
        Duration::from_millis(self.wait_unit_ms.saturating_mul(units))
    }
}

/// Sleep for `ms` milliseconds. Zero returns immediately.
pub fn pause_ms(ms: u64) {
    pause(Duration::from_millis(ms));
}

pub fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// Call `probe` until it yields `Some` or `timeout` elapses.
///
/// `probe` always runs at least once, so a zero timeout is a single check.
/// Errors from `probe` end the poll immediately.
pub fn poll_until<T>(
    timeout: Duration,
    interval: Duration,
    mut probe: impl FnMut() -> Result<Option<T>>,
) -> Result<Option<T>> {
    let deadline = Instant::now() + timeout;
    let interval = if interval.is_zero() {
        Duration::from_millis(10)
    } else {
        interval
    };

    loop {
        if let Some(found) = probe()? {
            return Ok(Some(found));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        pause(interval.min(deadline - now));
    }
}
