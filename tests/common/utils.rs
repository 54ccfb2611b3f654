use replay_runner::run::runner::RunOptions;
use replay_runner::run::timing::Timing;

pub fn page(name: &str) -> String {
    let base = std::env::current_dir().unwrap();
    let path = base.join("tests").join("fixtures").join(name);

    format!("file://{}", path.display())
}

/// Run options with every pause and polling window set to zero.
pub fn instant_options() -> RunOptions {
    RunOptions {
        timing: Timing::instant(),
        headless: true,
        run_id: "test".into(),
        ..RunOptions::default()
    }
}
