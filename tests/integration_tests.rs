//! Integration tests that launch a real BrowserSession (browser_server.js + Playwright).
//!
//! These tests require Node.js + Playwright installed. They are marked `#[ignore]`
//! so they don't run during `cargo test`. Run them with:
//!
//! ```bash
//! cargo test -- --ignored          # only integration tests
//! cargo test -- --include-ignored  # all tests (offline + integration)
//! ```

use replay_runner::browser::driver::{Browser, BrowserLauncher, SessionOptions};
use replay_runner::browser::locator::find_element;
use replay_runner::browser::session::PlaywrightLauncher;
use replay_runner::case::case_model::{SelectorKind, Step, TestCase};
use replay_runner::data::dataset::{DataRow, Dataset};
use replay_runner::run::run_model::StepStatus;
use replay_runner::run::runner::TestCaseRunner;

mod common;
use crate::common::utils::{instant_options, page};

fn launcher() -> PlaywrightLauncher {
    PlaywrightLauncher::default()
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
#[ignore]
fn test_session_launch_and_quit() {
    let mut session = launcher().launch(&SessionOptions::default()).unwrap();
    session.quit().unwrap();
    session.quit().unwrap();
}

#[test]
#[ignore]
fn test_navigate_current_url() {
    let mut session = launcher().launch(&SessionOptions::default()).unwrap();
    let url = page("login.html");
    session.navigate(&url).unwrap();
    let current = session.current_url().unwrap();
    assert!(current.contains("login.html"), "got: {}", current);
    assert_eq!(session.title().unwrap(), "Sign in");
}

#[test]
#[ignore]
fn test_placeholder_locator() {
    let mut session = launcher().launch(&SessionOptions::default()).unwrap();
    session.navigate(&page("login.html")).unwrap();
    let email = find_element(&mut session, SelectorKind::Placeholder, "Email", 0).unwrap();
    session.send_keys(&email, "alice@example.com").unwrap();
    assert!(find_element(&mut session, SelectorKind::Placeholder, "Email", 1).is_err());
}

#[test]
#[ignore]
fn test_fresh_session_has_no_storage() {
    let mut session = launcher().launch(&SessionOptions::default()).unwrap();
    session.navigate(&page("login.html")).unwrap();
    assert!(session.storage_state().unwrap().is_empty());
}

// ============================================================================
// Full runs
// ============================================================================

fn login_case() -> TestCase {
    TestCase::new(
        "login",
        vec![
            Step::visit(page("login.html")),
            Step::input(SelectorKind::Id, "email", "{{LoginEmail}}"),
            Step::input(SelectorKind::Placeholder, "Password", "{{Password}}"),
            Step::click(SelectorKind::Id, "submit").with_wait(1),
            Step::assert_text("Welcome {{LoginEmail}}"),
            Step::select_dropdown("role", "Viewer"),
            Step::assert_text("Role: Viewer"),
        ],
    )
}

#[test]
#[ignore]
fn test_data_driven_login() {
    let dataset = Dataset {
        columns: vec!["LoginEmail".into(), "Password".into()],
        rows: vec![DataRow::from_pairs([
            ("LoginEmail", "alice@example.com"),
            ("Password", "secret"),
        ])],
    };
    let mut options = instant_options();
    options.timing.navigation_settle_ms = 200;
    options.timing.notification_timeout_ms = 300;

    let launcher = launcher();
    let log = TestCaseRunner::new(&launcher, &options).run_case(&login_case(), Some(&dataset));

    assert!(log.error_records().next().is_none(), "{:?}", log);
    assert_eq!(log.len(), 7);
    assert_eq!(log.records()[0].status, StepStatus::Success);
    assert_eq!(log.records()[5].status, StepStatus::Selected("Viewer".into()));
}

#[test]
#[ignore]
fn test_missing_password_shows_failure_toast() {
    let dataset = Dataset {
        columns: vec!["LoginEmail".into()],
        rows: vec![DataRow::from_pairs([("LoginEmail", "bob@example.com")])],
    };
    let mut options = instant_options();
    options.timing.notification_timeout_ms = 500;

    let launcher = launcher();
    let log = TestCaseRunner::new(&launcher, &options).run_case(&login_case(), Some(&dataset));

    let click = &log.records()[3];
    assert_eq!(click.status, StepStatus::Failed);
    assert_eq!(click.notifications, vec!["Email and password are required"]);
    assert!(log.records()[4].is_terminal_error());
}
