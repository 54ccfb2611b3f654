use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::browser::driver::{Browser, BrowserLauncher, SessionOptions};
use crate::browser::notification::NotificationConfig;
use crate::case::case_model::TestCase;
use crate::data::dataset::{DataRow, Dataset};
use crate::error::{ReplayError, Result};
use crate::run::executor::{StepContext, StepExecutor};
use crate::run::run_model::{RunLog, StepRecord};
use crate::run::timing::Timing;
use crate::trace::logger::TraceLogger;

pub const DEFAULT_DROPDOWN_ITEM_SELECTOR: &str = "li.el-dropdown-menu__item";

/// Everything that shapes a run besides the cases and the dataset.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Passes per case when no dataset is supplied (at least 1)
    pub repeat: usize,
    pub headless: bool,
    pub timing: Timing,
    pub notifications: NotificationConfig,
    /// CSS selector matching the options of an open dropdown
    pub dropdown_item_selector: String,
    /// Capture one screenshot per step into this directory
    pub screenshot_dir: Option<PathBuf>,
    /// Dataset column copied into each record as its correlation value
    pub group_by: Option<String>,
    /// Fail an iteration whose fresh session already holds storage
    pub verify_isolation: bool,
    /// Distinguishes artifacts of this run from earlier ones
    pub run_id: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            repeat: 1,
            headless: false,
            timing: Timing::default(),
            notifications: NotificationConfig::default(),
            dropdown_item_selector: DEFAULT_DROPDOWN_ITEM_SELECTOR.to_string(),
            screenshot_dir: None,
            group_by: None,
            verify_isolation: false,
            run_id: new_run_id(),
        }
    }
}

/// Millisecond timestamp used as a run id.
pub fn new_run_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}

/// Substitution context of each iteration, in execution order.
///
/// With a dataset: one entry per row and `repeat` is ignored. Without: `repeat`
/// entries (minimum one) with no row.
pub fn plan_iterations(repeat: usize, dataset: Option<&Dataset>) -> Vec<Option<&DataRow>> {
    match dataset {
        Some(dataset) => dataset.rows.iter().map(Some).collect(),
        None => vec![None; repeat.max(1)],
    }
}

/// Owns a browser session for exactly one iteration.
///
/// The session is closed when the guard is released or dropped, on every
/// exit path. Close failures are logged and discarded here and nowhere else.
pub struct SessionGuard<S: Browser> {
    session: Option<S>,
}

impl<S: Browser> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn browser(&mut self) -> Result<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| ReplayError::session_io("Browser session already released"))
    }

    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.quit() {
                warn!("Failed to close browser session: {}", e);
            }
        }
    }
}

impl<S: Browser> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs test cases: one fresh isolated session per iteration, steps in order.
pub struct TestCaseRunner<'a, L: BrowserLauncher> {
    launcher: &'a L,
    options: &'a RunOptions,
    tracer: Option<&'a TraceLogger>,
}

impl<'a, L: BrowserLauncher> TestCaseRunner<'a, L> {
    pub fn new(launcher: &'a L, options: &'a RunOptions) -> Self {
        Self {
            launcher,
            options,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Run several cases in order and concatenate their logs.
    pub fn run_cases(&self, cases: &[&TestCase], dataset: Option<&Dataset>) -> RunLog {
        let mut log = RunLog::new();
        for (case_run, case) in cases.iter().enumerate() {
            log.append(self.run_case(case, dataset).with_case_run(case_run));
        }
        log
    }

    /// Run every iteration of one case.
    ///
    /// A failing iteration contributes its records up to the failure plus one
    /// terminal error record; later iterations still run.
    pub fn run_case(&self, case: &TestCase, dataset: Option<&Dataset>) -> RunLog {
        let plan = plan_iterations(self.options.repeat, dataset);
        info!(
            "Running '{}': {} iteration(s) of {} step(s)",
            case.name,
            plan.len(),
            case.steps.len()
        );

        let mut log = RunLog::new();
        for (iteration, row) in plan.into_iter().enumerate() {
            log.append(self.run_iteration(case, iteration, row));
        }
        log
    }

    /// One pass over the case's steps in a fresh session.
    pub fn run_iteration(&self, case: &TestCase, iteration: usize, row: Option<&DataRow>) -> RunLog {
        let correlation = self.correlation(row);
        let mut log = RunLog::new();

        let mut guard = match self.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("[{} #{}] session setup failed: {}", case.name, iteration, e);
                let record = StepRecord::terminal_error(
                    &case.name,
                    iteration,
                    None,
                    format!("Browser session setup failed: {}", e),
                )
                .with_correlation(correlation);
                self.emit(&record);
                log.push(record);
                return log;
            }
        };

        let mut executor = StepExecutor::new(self.options);
        for (step_index, step) in case.steps.iter().enumerate() {
            let ctx = StepContext {
                case_name: &case.name,
                iteration,
                step_index,
                row,
                correlation: correlation.as_deref(),
            };

            let outcome = guard
                .browser()
                .and_then(|browser| executor.execute(browser, step, &ctx));

            match outcome {
                Ok(record) => {
                    self.emit(&record);
                    log.push(record);
                }
                Err(e) => {
                    warn!(
                        "[{} #{}] step {} ({}) failed: {}",
                        case.name,
                        iteration,
                        step_index,
                        step.kind(),
                        e
                    );
                    let record = StepRecord::terminal_error(
                        &case.name,
                        iteration,
                        Some(step_index),
                        format!(
                            "Step {} ({}) failed after phase '{}': {}",
                            step_index,
                            step.kind(),
                            executor.phase(),
                            e
                        ),
                    )
                    .with_correlation(correlation.clone());
                    self.emit(&record);
                    log.push(record);
                    break;
                }
            }
        }

        guard.release();
        log
    }

    /// Launch an isolated session, probe it, then clear cookies.
    fn acquire(&self) -> Result<SessionGuard<L::Session>> {
        let options = SessionOptions::isolated(self.options.headless);
        let mut guard = SessionGuard::new(self.launcher.launch(&options)?);
        let browser = guard.browser()?;

        if self.options.verify_isolation {
            let storage = browser.storage_state()?;
            if !storage.is_empty() {
                return Err(ReplayError::SessionNotIsolated(format!(
                    "{} cookies, {} local-storage and {} session-storage entries",
                    storage.cookies, storage.local_storage, storage.session_storage
                )));
            }
        }

        browser.delete_all_cookies()?;
        browser.refresh()?;
        Ok(guard)
    }

    fn correlation(&self, row: Option<&DataRow>) -> Option<String> {
        let column = self.options.group_by.as_deref()?;
        row?.get(column).map(str::to_string)
    }

    fn emit(&self, record: &StepRecord) {
        if let Some(tracer) = self.tracer {
            tracer.log_record(record);
        }
    }
}
