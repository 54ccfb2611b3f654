use tracing::{info, warn};

use crate::browser::driver::BrowserLauncher;
use crate::case::case_model::TestCase;
use crate::case::draft::CaseDraft;
use crate::case::store::TestCaseStore;
use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::run::run_model::RunLog;
use crate::run::runner::{RunOptions, TestCaseRunner};
use crate::trace::logger::TraceLogger;

/// State of one runner invocation, passed explicitly instead of living in
/// globals: the browser launcher, the case store, the draft being edited
/// (with its editing cursor), run options and the optional trace sink.
///
/// Browser handles themselves are scoped tighter than the session: each
/// iteration opens and closes its own through a
/// [`SessionGuard`](crate::run::runner::SessionGuard).
pub struct RunnerSession<L: BrowserLauncher> {
    launcher: L,
    store: TestCaseStore,
    draft: Option<CaseDraft>,
    options: RunOptions,
    tracer: TraceLogger,
}

impl<L: BrowserLauncher> RunnerSession<L> {
    pub fn new(launcher: L, store: TestCaseStore, options: RunOptions) -> Self {
        Self {
            launcher,
            store,
            draft: None,
            options,
            tracer: TraceLogger::disabled(),
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn store(&self) -> &TestCaseStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TestCaseStore {
        &mut self.store
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RunOptions {
        &mut self.options
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Start editing a case: the stored one if it exists, otherwise an empty draft.
    pub fn open_draft(&mut self, name: &str) -> Result<&mut CaseDraft> {
        let draft = if self.store.contains(name) {
            CaseDraft::load(&self.store, name)?
        } else {
            CaseDraft::new(name)
        };
        Ok(self.draft.insert(draft))
    }

    pub fn draft(&self) -> Option<&CaseDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut CaseDraft> {
        self.draft.as_mut()
    }

    /// Persist and close the open draft. Returns `false` if none was open.
    pub fn commit_draft(&mut self) -> Result<bool> {
        match self.draft.take() {
            Some(draft) => {
                draft.commit(&mut self.store)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn discard_draft(&mut self) {
        self.draft = None;
    }

    /// Run the named cases in order.
    ///
    /// All names are resolved before anything runs, so an unknown name fails
    /// the whole call without opening a browser.
    pub fn run(&self, names: &[String], dataset: Option<&Dataset>) -> Result<RunLog> {
        let cases: Vec<&TestCase> = names
            .iter()
            .map(|name| self.store.get(name))
            .collect::<Result<_>>()?;

        if let Some(dataset) = dataset {
            for case in &cases {
                let unknown = dataset.unknown_fields(case);
                if !unknown.is_empty() {
                    warn!(
                        "'{}' uses fields missing from the dataset, they resolve to \"\": {}",
                        case.name,
                        unknown.join(", ")
                    );
                }
            }
        }

        info!("Running {} test case(s)", cases.len());
        let runner = TestCaseRunner::new(&self.launcher, &self.options).with_tracer(&self.tracer);
        Ok(runner.run_cases(&cases, dataset))
    }
}
