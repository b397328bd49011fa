mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{plan::PlanArgs, registry::RegistrySubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "deployer",
    about = "Ordered, resumable contract deployment driven by a shared registry",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from config.json or .git/)
    #[arg(long, global = true, env = "DEPLOYER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log each step as it runs
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in stages and their components, in run order
    Stages,

    /// Run a stage against the simulated executor and write the projected registry
    Plan(PlanArgs),

    /// Inspect the registry
    Registry {
        #[command(subcommand)]
        subcommand: RegistrySubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Stages => cmd::stages::run(cli.json),
        Commands::Plan(args) => cmd::plan::run(&root, args, cli.json),
        Commands::Registry { subcommand } => cmd::registry::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
