use clap::Parser;
use replay_runner::browser::session::PlaywrightLauncher;
use replay_runner::cli::commands::{
    cmd_create, cmd_delete, cmd_list, cmd_run, cmd_show, cmd_step, cmd_update,
};
use replay_runner::cli::config::{Cli, Commands, load_config, resolve_store_path};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let store_path = resolve_store_path(cli.store.as_deref(), &config);

    match &cli.command {
        Commands::List => cmd_list(&store_path)?,
        Commands::Show { name } => cmd_show(&store_path, name)?,
        Commands::Create { name, steps } => cmd_create(&store_path, name, steps)?,
        Commands::Update { name, steps } => cmd_update(&store_path, name, steps)?,
        Commands::Delete { name } => cmd_delete(&store_path, name)?,
        Commands::Step { command } => {
            let launcher = PlaywrightLauncher::new(&config.driver.node, &config.driver.script);
            cmd_step(launcher, &store_path, command)?
        }
        Commands::Run(args) => {
            let launcher = PlaywrightLauncher::new(&config.driver.node, &config.driver.script);
            let all_passed = cmd_run(launcher, &store_path, &config, args)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Logs go to stderr. `RUST_LOG` wins over the -v count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}
