use clap::Parser;
use replay_runner::case::case_model::{SelectorKind, Step};
use replay_runner::case::store::TestCaseStore;
use replay_runner::cli::commands::{
    cmd_create, cmd_delete, cmd_run, cmd_step, cmd_update, load_steps, parse_step,
};
use replay_runner::cli::config::{
    AppConfig, Cli, Commands, Direction, RunArgs, StepCommand, build_run_options, load_config,
    resolve_store_path,
};
use replay_runner::error::ReplayError;
use replay_runner::run::timing::Timing;

mod common;
use crate::common::fake_browser::{FakeElement, FakeLauncher, FakePage};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_run_minimal() {
    let cli = Cli::parse_from(["replay-runner", "run", "--case", "login"]);
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.cases, vec!["login"]);
            assert_eq!(args.repeat, None);
            assert!(args.data.is_none());
            assert!(!args.headless);
            assert!(!args.cleanup_screenshots);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn cli_parse_run_all_args() {
    let cli = Cli::parse_from([
        "replay-runner",
        "run",
        "--case",
        "login",
        "--case",
        "logout",
        "--repeat",
        "3",
        "--data",
        "users.csv",
        "--headless",
        "--group-by",
        "LoginEmail",
        "--screenshots",
        "shots",
        "--csv",
        "logs.csv",
        "--xlsx",
        "logs.xlsx",
        "--json",
        "logs.json",
        "--trace",
        "trace.jsonl",
        "--cleanup-screenshots",
        "--verify-isolation",
    ]);
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.cases, vec!["login", "logout"]);
            assert_eq!(args.repeat, Some(3));
            assert_eq!(args.data.as_deref(), Some("users.csv"));
            assert!(args.headless);
            assert_eq!(args.group_by.as_deref(), Some("LoginEmail"));
            assert_eq!(args.screenshots.as_deref(), Some("shots"));
            assert_eq!(args.csv.as_deref(), Some("logs.csv"));
            assert_eq!(args.xlsx.as_deref(), Some("logs.xlsx"));
            assert_eq!(args.json.as_deref(), Some("logs.json"));
            assert_eq!(args.trace.as_deref(), Some("trace.jsonl"));
            assert!(args.cleanup_screenshots);
            assert!(args.verify_isolation);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn cli_run_requires_a_case() {
    assert!(Cli::try_parse_from(["replay-runner", "run"]).is_err());
}

#[test]
fn cli_parse_step_move() {
    let cli = Cli::parse_from([
        "replay-runner",
        "step",
        "move",
        "--case",
        "login",
        "--index",
        "2",
        "--direction",
        "up",
    ]);
    match cli.command {
        Commands::Step {
            command:
                StepCommand::Move {
                    case,
                    index,
                    direction,
                },
        } => {
            assert_eq!(case, "login");
            assert_eq!(index, 2);
            assert_eq!(direction, Direction::Up);
        }
        _ => panic!("Expected step move"),
    }
}

#[test]
fn cli_global_flags() {
    let cli = Cli::parse_from([
        "replay-runner",
        "-vv",
        "list",
        "--store",
        "cases.json",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.store.as_deref(), Some("cases.json"));
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    assert!(matches!(cli.command, Commands::List));
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.store.path, "test_cases.json");
    assert_eq!(config.driver.node, "node");
    assert_eq!(config.driver.script, "node/browser_server.js");
    assert_eq!(config.timing, Timing::default());
    assert_eq!(config.timing.post_click_ms, 500);
    assert_eq!(config.dropdown.item_selector, "li.el-dropdown-menu__item");
    assert_eq!(config.run.repeat, 1);
}

#[test]
fn config_load_missing_file_returns_defaults() {
    let config = load_config(Some("/nonexistent/replay-runner.yaml"));
    assert_eq!(config.store.path, "test_cases.json");
}

#[test]
fn config_partial_yaml_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay-runner.yaml");
    std::fs::write(
        &path,
        "store:\n  path: suites/cases.json\ntiming:\n  wait_unit_ms: 10\nrun:\n  repeat: 4\n  group_by: LoginEmail\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.store.path, "suites/cases.json");
    assert_eq!(config.timing.wait_unit_ms, 10);
    assert_eq!(config.timing.navigation_settle_ms, 1000);
    assert_eq!(config.run.repeat, 4);
    assert_eq!(config.run.group_by.as_deref(), Some("LoginEmail"));
    assert_eq!(config.driver.node, "node");
}

#[test]
fn config_malformed_yaml_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "run: [unclosed").unwrap();
    let config = load_config(path.to_str());
    assert_eq!(config.run.repeat, 1);
}

#[test]
fn run_options_cli_overrides_config() {
    let mut config = AppConfig::default();
    config.run.repeat = 4;
    config.run.group_by = Some("Team".into());
    config.run.screenshot_dir = Some("cfg-shots".into());

    let args = RunArgs {
        cases: vec!["login".into()],
        repeat: Some(2),
        group_by: Some("LoginEmail".into()),
        ..RunArgs::default()
    };
    let options = build_run_options(&config, &args);
    assert_eq!(options.repeat, 2);
    assert_eq!(options.group_by.as_deref(), Some("LoginEmail"));
    assert_eq!(options.screenshot_dir.unwrap().to_str(), Some("cfg-shots"));

    let options = build_run_options(&config, &RunArgs::default());
    assert_eq!(options.repeat, 4);
    assert_eq!(options.group_by.as_deref(), Some("Team"));
}

#[test]
fn run_options_repeat_is_at_least_one() {
    let args = RunArgs {
        repeat: Some(0),
        ..RunArgs::default()
    };
    assert_eq!(build_run_options(&AppConfig::default(), &args).repeat, 1);
}

#[test]
fn store_path_resolution() {
    let config = AppConfig::default();
    assert_eq!(
        resolve_store_path(Some("x.json"), &config).to_str(),
        Some("x.json")
    );
    assert_eq!(
        resolve_store_path(None, &config).to_str(),
        Some("test_cases.json")
    );
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn load_steps_reads_yaml_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("steps.yaml");
    std::fs::write(
        &yaml,
        "- action: visit\n  url: https://x/login\n- action: click\n  selector_type: id\n  selector_value: go\n  wait: 2\n",
    )
    .unwrap();
    let json = dir.path().join("steps.json");
    std::fs::write(&json, r#"[{"action":"assert","text":"Welcome"}]"#).unwrap();

    let steps = load_steps(yaml.to_str().unwrap()).unwrap();
    assert_eq!(steps[0], Step::visit("https://x/login"));
    assert_eq!(steps[1], Step::click(SelectorKind::Id, "go").with_wait(2));

    let steps = load_steps(json.to_str().unwrap()).unwrap();
    assert_eq!(steps, vec![Step::assert_text("Welcome")]);
}

#[test]
fn parse_step_rejects_garbage() {
    assert!(matches!(parse_step("{").unwrap_err(), ReplayError::Json(_)));
}

#[test]
fn case_commands_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cases.json");
    let steps = dir.path().join("steps.json");
    std::fs::write(&steps, r#"[{"action":"visit","url":"https://x"}]"#).unwrap();
    let steps = steps.to_str().unwrap();

    cmd_create(&store_path, "smoke", steps).unwrap();
    assert!(matches!(
        cmd_create(&store_path, "smoke", steps).unwrap_err(),
        ReplayError::DuplicateCase(_)
    ));
    cmd_update(&store_path, "smoke", steps).unwrap();

    cmd_step(
        FakeLauncher::new(),
        &store_path,
        &StepCommand::Add {
            case: "smoke".into(),
            step: r#"{"action":"assert","text":"Home"}"#.into(),
            at: Some(0),
        },
    )
    .unwrap();
    cmd_step(
        FakeLauncher::new(),
        &store_path,
        &StepCommand::Move {
            case: "smoke".into(),
            index: 0,
            direction: Direction::Down,
        },
    )
    .unwrap();

    let store = TestCaseStore::open(&store_path).unwrap();
    assert_eq!(
        store.steps("smoke").unwrap(),
        &[Step::visit("https://x"), Step::assert_text("Home")]
    );

    cmd_step(
        FakeLauncher::new(),
        &store_path,
        &StepCommand::Edit {
            case: "smoke".into(),
            index: 1,
            step: r#"{"action":"assert","text":"Dashboard"}"#.into(),
        },
    )
    .unwrap();
    cmd_step(
        FakeLauncher::new(),
        &store_path,
        &StepCommand::Remove {
            case: "smoke".into(),
            index: 0,
        },
    )
    .unwrap();
    let store = TestCaseStore::open(&store_path).unwrap();
    assert_eq!(store.steps("smoke").unwrap(), &[Step::assert_text("Dashboard")]);

    cmd_delete(&store_path, "smoke").unwrap();
    assert!(TestCaseStore::open(&store_path).unwrap().names().is_empty());
}

#[test]
fn step_add_on_unknown_case_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cases.json");
    let launcher = FakeLauncher::new();
    cmd_step(
        launcher.clone(),
        &store_path,
        &StepCommand::Add {
            case: "fresh".into(),
            step: r#"{"action":"visit","url":"https://x"}"#.into(),
            at: None,
        },
    )
    .unwrap();
    assert!(TestCaseStore::open(&store_path).unwrap().contains("fresh"));
    assert_eq!(launcher.launches(), 0);
}

#[test]
fn step_remove_out_of_range_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cases.json");
    let mut store = TestCaseStore::open(&store_path).unwrap();
    store.create("smoke", vec![Step::visit("https://x")]).unwrap();

    let result = cmd_step(
        FakeLauncher::new(),
        &store_path,
        &StepCommand::Remove {
            case: "smoke".into(),
            index: 5,
        },
    );
    assert!(result.is_err());
    assert_eq!(
        TestCaseStore::open(&store_path).unwrap().steps("smoke").unwrap(),
        &[Step::visit("https://x")]
    );
}

#[test]
fn cmd_run_writes_exports_and_cleans_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cases.json");
    let mut store = TestCaseStore::open(&store_path).unwrap();
    store
        .create(
            "login",
            vec![
                Step::visit("https://x/login"),
                Step::input(SelectorKind::Id, "email", "{{LoginEmail}}"),
            ],
        )
        .unwrap();

    let data = dir.path().join("users.csv");
    std::fs::write(&data, "LoginEmail\nalice@example.com\nbob@example.com\n").unwrap();

    let launcher = FakeLauncher::new().page(
        "https://x/login",
        FakePage::new("<html/>").element(FakeElement::id("email")),
    );
    let mut config = AppConfig::default();
    config.timing = Timing::instant();

    let path = |name: &str| dir.path().join(name).to_str().unwrap().to_string();
    let args = RunArgs {
        cases: vec!["login".into()],
        data: Some(path("users.csv")),
        group_by: Some("LoginEmail".into()),
        screenshots: Some(path("shots")),
        csv: Some(path("logs.csv")),
        xlsx: Some(path("logs.xlsx")),
        json: Some(path("logs.json")),
        cleanup_screenshots: true,
        ..RunArgs::default()
    };

    let passed = cmd_run(launcher.clone(), &store_path, &config, &args).unwrap();
    assert!(passed);
    assert_eq!(launcher.launches(), 2);

    let csv = std::fs::read_to_string(dir.path().join("logs.csv")).unwrap();
    assert!(csv.trim_start_matches('\u{feff}').starts_with("LoginEmail,case"));
    assert_eq!(csv.lines().count(), 1 + 4);
    assert!(dir.path().join("logs.xlsx").exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("logs.json")).unwrap())
            .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 4);

    let remaining = std::fs::read_dir(dir.path().join("shots")).unwrap().count();
    assert_eq!(remaining, 0);
}

#[test]
fn cmd_run_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cases.json");
    let mut store = TestCaseStore::open(&store_path).unwrap();
    store
        .create("broken", vec![Step::click(SelectorKind::Id, "missing")])
        .unwrap();

    let mut config = AppConfig::default();
    config.timing = Timing::instant();
    let args = RunArgs {
        cases: vec!["broken".into()],
        ..RunArgs::default()
    };

    let passed = cmd_run(FakeLauncher::new(), &store_path, &config, &args).unwrap();
    assert!(!passed);
}

#[test]
fn cmd_run_unknown_case_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = RunArgs {
        cases: vec!["ghost".into()],
        ..RunArgs::default()
    };
    let err = cmd_run(
        FakeLauncher::new(),
        &dir.path().join("cases.json"),
        &AppConfig::default(),
        &args,
    )
    .unwrap_err();
    assert!(matches!(err, ReplayError::CaseNotFound(_)));
}
