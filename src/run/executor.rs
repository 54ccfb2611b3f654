use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, trace};

use crate::browser::driver::{Browser, ElementHandle, Query};
use crate::browser::locator::find_element;
use crate::browser::notification::{capture_notifications, classify};
use crate::case::case_model::{ActionKind, SelectorKind, Step, StepAction};
use crate::data::dataset::DataRow;
use crate::data::placeholder::substitute;
use crate::error::{ReplayError, Result};
use crate::run::run_model::{StepRecord, StepStatus};
use crate::run::runner::RunOptions;
use crate::run::timing::{pause, pause_ms, poll_until};

/// How far the current step got. Any phase may fail out to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Pending,
    Located,
    Acted,
    Classified,
    Done,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepPhase::Pending => "pending",
            StepPhase::Located => "located",
            StepPhase::Acted => "acted",
            StepPhase::Classified => "classified",
            StepPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where a step sits in the run, and the row it substitutes from.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub case_name: &'a str,
    pub iteration: usize,
    pub step_index: usize,
    pub row: Option<&'a DataRow>,
    pub correlation: Option<&'a str>,
}

/// Executes single steps against a live browser and records the outcome.
pub struct StepExecutor<'a> {
    options: &'a RunOptions,
    phase: StepPhase,
}

impl<'a> StepExecutor<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            options,
            phase: StepPhase::Pending,
        }
    }

    /// Phase reached by the last executed step.
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Run one step, then pause for its `wait`.
    ///
    /// Soft outcomes (no access, dropdown option missing, failure
    /// notifications) come back as the record's status. An `Err` means the
    /// iteration cannot continue.
    pub fn execute<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        step: &Step,
        ctx: &StepContext<'_>,
    ) -> Result<StepRecord> {
        self.phase = StepPhase::Pending;
        let kind = step.kind();
        debug!(
            "[{} #{}] step {}: {}",
            ctx.case_name, ctx.iteration, ctx.step_index, kind
        );

        let mut record = StepRecord::for_step(ctx.case_name, ctx.iteration, ctx.step_index, kind);
        record.index = step.index;
        record.wait_time = step.wait;
        record.correlation = ctx.correlation.map(str::to_string);
        if let Some((selector_type, selector_value)) = step.action.selector() {
            record.selector_type = Some(selector_type);
            record.selector_value = selector_value.to_string();
        }

        let status = match &step.action {
            StepAction::Visit { url } => self.visit(browser, url, ctx.row, &mut record)?,
            StepAction::Click {
                selector_type,
                selector_value,
            } => self.click(browser, *selector_type, selector_value, step.index)?,
            StepAction::Input {
                selector_type,
                selector_value,
                text,
            } => self.input(browser, *selector_type, selector_value, step.index, text, ctx.row, &mut record)?,
            StepAction::Assert { text } => self.assert_text(browser, text, ctx.row, &mut record)?,
            StepAction::SelectDropdown {
                selector_type,
                selector_value,
                text,
            } => self.select_dropdown(
                browser,
                *selector_type,
                selector_value,
                step.index,
                text,
                ctx.row,
                &mut record,
            )?,
        };

        record.screenshot = self.screenshot(browser, ctx, kind)?;

        record.status = if kind.consults_notifications() {
            let notifications =
                capture_notifications(browser, &self.options.notifications, &self.options.timing);
            let status = classify(status, &notifications);
            record.notifications = notifications;
            status
        } else {
            status
        };
        self.phase = StepPhase::Classified;
        trace!("step {} status: {}", ctx.step_index, record.status);

        pause(self.options.timing.step_wait(step.wait));
        self.phase = StepPhase::Done;
        Ok(record)
    }

    fn visit<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        url: &str,
        row: Option<&DataRow>,
        record: &mut StepRecord,
    ) -> Result<StepStatus> {
        // Drop whatever the previous page left behind before navigating
        browser.refresh()?;
        let expected = substitute(url, row);
        browser.navigate(&expected)?;
        self.phase = StepPhase::Acted;
        pause_ms(self.options.timing.navigation_settle_ms);

        let actual = browser.current_url()?;
        let status = if urls_match(&expected, &actual) {
            StepStatus::Success
        } else {
            StepStatus::NoAccess
        };
        record.url = expected;
        record.actual_url = actual;
        Ok(status)
    }

    fn click<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        kind: SelectorKind,
        value: &str,
        index: usize,
    ) -> Result<StepStatus> {
        let element = find_element(browser, kind, value, index)?;
        self.phase = StepPhase::Located;
        browser.click(&element)?;
        self.phase = StepPhase::Acted;
        pause_ms(self.options.timing.post_click_ms);
        Ok(StepStatus::Clicked)
    }

    #[allow(clippy::too_many_arguments)]
    fn input<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        kind: SelectorKind,
        value: &str,
        index: usize,
        text: &str,
        row: Option<&DataRow>,
        record: &mut StepRecord,
    ) -> Result<StepStatus> {
        let element = find_element(browser, kind, value, index)?;
        self.phase = StepPhase::Located;
        browser.clear(&element)?;
        let resolved = substitute(text, row);
        browser.send_keys(&element, &resolved)?;
        self.phase = StepPhase::Acted;
        record.text = resolved.clone();
        Ok(StepStatus::Input(resolved))
    }

    fn assert_text<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        text: &str,
        row: Option<&DataRow>,
        record: &mut StepRecord,
    ) -> Result<StepStatus> {
        let expected = substitute(text, row);
        let source = browser.page_source()?;
        self.phase = StepPhase::Acted;
        if !source.contains(&expected) {
            return Err(ReplayError::AssertionFailed { expected });
        }
        record.text = expected.clone();
        Ok(StepStatus::Asserted(expected))
    }

    #[allow(clippy::too_many_arguments)]
    fn select_dropdown<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        kind: SelectorKind,
        value: &str,
        index: usize,
        text: &str,
        row: Option<&DataRow>,
        record: &mut StepRecord,
    ) -> Result<StepStatus> {
        let trigger = find_element(browser, kind, value, index)?;
        self.phase = StepPhase::Located;
        browser.click(&trigger)?;
        pause_ms(self.options.timing.dropdown_settle_ms);

        let expected = substitute(text, row).trim().to_string();
        record.text = expected.clone();

        let items = Query::css(self.options.dropdown_item_selector.as_str());
        let timing = &self.options.timing;
        let matched = poll_until(
            Duration::from_millis(timing.dropdown_timeout_ms),
            Duration::from_millis(timing.dropdown_poll_ms),
            || find_visible_option(browser, &items, &expected),
        )?;

        let status = match matched {
            Some((item, label)) => {
                browser.click(&item)?;
                StepStatus::Selected(label)
            }
            None => StepStatus::OptionNotFound(expected),
        };
        self.phase = StepPhase::Acted;
        Ok(status)
    }

    fn screenshot<B: Browser + ?Sized>(
        &self,
        browser: &mut B,
        ctx: &StepContext<'_>,
        kind: ActionKind,
    ) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.options.screenshot_dir else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "step_{}_{}_{}_{}_{}.png",
            self.options.run_id,
            file_stem(ctx.case_name),
            ctx.iteration,
            ctx.step_index,
            kind
        ));
        browser.screenshot(&path)?;
        Ok(Some(path))
    }
}

/// First visible option whose trimmed label equals `expected` exactly.
fn find_visible_option<B: Browser + ?Sized>(
    browser: &mut B,
    items: &Query,
    expected: &str,
) -> Result<Option<(ElementHandle, String)>> {
    for item in browser.find_elements(items)? {
        if !browser.is_displayed(&item)? {
            continue;
        }
        let label = browser.element_text(&item)?.trim().to_string();
        if label == expected {
            return Ok(Some((item, label)));
        }
    }
    Ok(None)
}

/// Compare URLs ignoring a single trailing slash on either side.
pub fn urls_match(expected: &str, actual: &str) -> bool {
    let strip = |u: &str| u.strip_suffix('/').unwrap_or(u).to_string();
    strip(expected) == strip(actual)
}

/// Lowercased name with anything outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase()
}
