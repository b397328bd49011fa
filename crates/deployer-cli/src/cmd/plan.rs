use crate::output::{print_json, print_table, short_address};
use anyhow::Context;
use clap::Args;
use deployer_core::artifact::BuildDir;
use deployer_core::config::Config;
use deployer_core::executor::{JournalEntry, SimulatedExecutor};
use deployer_core::types::Address;
use deployer_core::{paths, Orchestrator, Registry, RunOptions, RunReport, Stage};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sender used by the simulated executor when `--from` is not given.
const DEFAULT_SENDER: &str = "0x00000000000000000000000000000000000000d1";

#[derive(Args)]
pub struct PlanArgs {
    /// Stage to run (see `deployer stages`)
    pub stage: String,

    /// Config file (default: config.json under the root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Registry written by earlier stages (default: contracts.json under the root)
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Directory of compiled artifacts (default: build/contracts under the root)
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Where to write the projected registry (default: contracts.plan.json)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Forget this stage's components from the prior registry and deploy them again
    #[arg(long)]
    pub fresh: bool,

    /// Deploying account for simulated addresses
    #[arg(long, value_name = "ADDRESS")]
    pub from: Option<String>,

    /// Block height the simulated chain starts at
    #[arg(long, value_name = "N")]
    pub start_block: Option<u64>,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    out: String,
    #[serde(flatten)]
    report: &'a RunReport,
    journal: &'a [JournalEntry],
}

pub fn run(root: &Path, args: PlanArgs, json: bool) -> anyhow::Result<()> {
    let stage = Stage::builtin(&args.stage)?;

    let config_path = located(root, args.config.as_deref(), paths::config_path);
    let config = Config::load(&config_path)?;

    let registry_path = located(root, args.registry.as_deref(), paths::registry_path);
    let prior = Registry::load(&registry_path)
        .with_context(|| format!("failed to load registry {}", registry_path.display()))?;

    let artifacts = BuildDir::new(located(root, args.artifacts.as_deref(), paths::artifacts_dir));
    let out = located(root, args.out.as_deref(), paths::plan_path);

    let sender = Address::parse(args.from.as_deref().unwrap_or(DEFAULT_SENDER))
        .context("invalid --from")?;
    let mut executor = SimulatedExecutor::new(sender).with_start_block(args.start_block.unwrap_or(0));

    let report = Orchestrator::new(&mut executor, &artifacts, out.clone())
        .with_options(RunOptions { fresh: args.fresh })
        .run(&stage, &config, prior)
        .with_context(|| format!("stage '{}' aborted", stage.name))?;

    if json {
        return print_json(&PlanOutput {
            out: out.display().to_string(),
            report: &report,
            journal: executor.journal(),
        });
    }

    let rows: Vec<Vec<String>> = report
        .steps
        .iter()
        .map(|s| {
            vec![
                s.component.clone(),
                s.source.as_str().to_string(),
                short_address(s.address.as_str()),
                s.linked.join(","),
                s.calls
                    .iter()
                    .map(|c| format!("{}.{}", c.target, c.method))
                    .collect::<Vec<_>>()
                    .join(","),
            ]
        })
        .collect();
    print_table(&["COMPONENT", "SOURCE", "ADDRESS", "LINKED", "CALLS"], rows);
    println!();
    println!(
        "Stage '{}': {} deployed, {} skipped. Registry written to {}",
        report.stage,
        report.deployed().count(),
        report.skipped().count(),
        out.display()
    );
    Ok(())
}

fn located(root: &Path, given: Option<&Path>, default: fn(&Path) -> PathBuf) -> PathBuf {
    given
        .map(|p| paths::resolve(root, p))
        .unwrap_or_else(|| default(root))
}
