use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::browser::driver::BrowserLauncher;
use crate::case::case_model::Step;
use crate::case::store::TestCaseStore;
use crate::cli::config::{AppConfig, Direction, RunArgs, StepCommand, build_run_options};
use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::report::console::format_console_report;
use crate::report::csv_export::{DEFAULT_CORRELATION_HEADER, export_csv};
use crate::report::report_model::RunSummary;
use crate::report::xlsx_export::export_xlsx;
use crate::run::run_model::RunLog;
use crate::run::runner::RunOptions;
use crate::run::runner_session::RunnerSession;
use crate::trace::logger::TraceLogger;

// ============================================================================
// test case management
// ============================================================================

pub fn cmd_list(store_path: &Path) -> Result<()> {
    let store = TestCaseStore::open(store_path)?;
    if store.cases().is_empty() {
        eprintln!("No test cases in {}", store_path.display());
    }
    for case in store.cases() {
        println!("{} ({} steps)", case.name, case.steps.len());
    }
    Ok(())
}

pub fn cmd_show(store_path: &Path, name: &str) -> Result<()> {
    let store = TestCaseStore::open(store_path)?;
    let steps = store.steps(name)?;
    print!("{}", serde_yaml::to_string(steps)?);
    Ok(())
}

pub fn cmd_create(store_path: &Path, name: &str, steps_path: &str) -> Result<()> {
    let steps = load_steps(steps_path)?;
    let mut store = TestCaseStore::open(store_path)?;
    let count = steps.len();
    store.create(name, steps)?;
    println!("Test case '{}' saved ({} steps)", name, count);
    Ok(())
}

pub fn cmd_update(store_path: &Path, name: &str, steps_path: &str) -> Result<()> {
    let steps = load_steps(steps_path)?;
    let mut store = TestCaseStore::open(store_path)?;
    let count = steps.len();
    store.update(name, steps)?;
    println!("Test case '{}' updated ({} steps)", name, count);
    Ok(())
}

pub fn cmd_delete(store_path: &Path, name: &str) -> Result<()> {
    let mut store = TestCaseStore::open(store_path)?;
    store.delete(name)?;
    println!("Deleted '{}'", name);
    Ok(())
}

/// Apply one draft edit to a stored case and save it back.
///
/// The edit goes through the session's draft, so a case that does not exist
/// yet is started empty.
pub fn cmd_step<L: BrowserLauncher>(
    launcher: L,
    store_path: &Path,
    command: &StepCommand,
) -> Result<()> {
    let store = TestCaseStore::open(store_path)?;
    let mut session = RunnerSession::new(launcher, store, RunOptions::default());

    let case = match command {
        StepCommand::Add { case, .. }
        | StepCommand::Edit { case, .. }
        | StepCommand::Remove { case, .. }
        | StepCommand::Move { case, .. } => case,
    };
    let draft = session.open_draft(case)?;

    match command {
        StepCommand::Add { step, at, .. } => {
            let step = parse_step(step)?;
            match at {
                Some(at) => draft.insert(*at, step)?,
                None => draft.push(step),
            }
        }
        StepCommand::Edit { index, step, .. } => {
            draft.begin_edit(*index)?;
            draft.save_edit(parse_step(step)?)?;
        }
        StepCommand::Remove { index, .. } => {
            draft.remove(*index)?;
        }
        StepCommand::Move {
            index, direction, ..
        } => match direction {
            Direction::Up => draft.move_up(*index)?,
            Direction::Down => draft.move_down(*index)?,
        },
    }
    let count = draft.steps.len();

    session.commit_draft()?;
    println!("Test case '{}' now has {} steps", case, count);
    Ok(())
}

// ============================================================================
// run subcommand
// ============================================================================

/// Run the selected cases, print the console report and write exports.
///
/// Returns whether every iteration passed.
pub fn cmd_run<L: BrowserLauncher>(
    launcher: L,
    store_path: &Path,
    config: &AppConfig,
    args: &RunArgs,
) -> Result<bool> {
    let store = TestCaseStore::open(store_path)?;
    let options = build_run_options(config, args);
    let dataset = match &args.data {
        Some(path) => Some(Dataset::load(path)?),
        None => None,
    };

    let correlation_header = options
        .group_by
        .clone()
        .unwrap_or_else(|| DEFAULT_CORRELATION_HEADER.to_string());

    let mut session = RunnerSession::new(launcher, store, options);
    if let Some(path) = &args.trace {
        session = session.with_tracer(TraceLogger::new(path));
    }

    let start = Instant::now();
    let log = session.run(&args.cases, dataset.as_ref())?;
    let duration = start.elapsed().as_millis();

    let summary = RunSummary::from_log(&args.cases.join(", "), &log).with_duration(duration);
    print!("{}", format_console_report(&summary, &log));

    write_exports(&log, &correlation_header, args)?;

    if args.cleanup_screenshots {
        remove_screenshots(&log);
    }

    Ok(summary.all_passed())
}

fn write_exports(log: &RunLog, correlation_header: &str, args: &RunArgs) -> Result<()> {
    if log.is_empty() {
        return Ok(());
    }
    if let Some(path) = &args.csv {
        export_csv(log, correlation_header, Path::new(path))?;
        info!("Wrote {}", path);
    }
    if let Some(path) = &args.xlsx {
        export_xlsx(log, correlation_header, Path::new(path))?;
        info!("Wrote {}", path);
    }
    if let Some(path) = &args.json {
        std::fs::write(path, serde_json::to_string_pretty(log)?)?;
        info!("Wrote {}", path);
    }
    Ok(())
}

/// Delete every screenshot referenced by the log. Returns how many were removed.
pub fn remove_screenshots(log: &RunLog) -> usize {
    let mut removed = 0;
    for path in log.screenshot_paths() {
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    }
    removed
}

// ============================================================================
// Helpers
// ============================================================================

/// Load an ordered step list from YAML (`.yaml`/`.yml`) or JSON.
pub fn load_steps(path: &str) -> Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = Path::new(path)
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml");
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

pub fn parse_step(json: &str) -> Result<Step> {
    Ok(serde_json::from_str(json)?)
}
