use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mt_cli::commands::{activity, check, machine, operator, report, status, tooling};
use mt_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Machine(action) => machine::run(&mut out, action, &config)?,
        Commands::Tooling(action) => tooling::run(&mut out, action, &config)?,
        Commands::Operator(action) => operator::run(&mut out, action, &config)?,
        Commands::Activity(action) => activity::run(&mut out, action, &config)?,
        Commands::Check(args) => check::run(&mut out, args, &config)?,
        Commands::Status(args) => status::run(&mut out, args, &config)?,
        Commands::MachineStatus(args) => status::run_machine(&mut out, args, &config)?,
        Commands::OperatorStatus(args) => status::run_operator(&mut out, args, &config)?,
        Commands::Report(args) => report::run(&mut out, args, &config)?,
    }

    Ok(())
}
