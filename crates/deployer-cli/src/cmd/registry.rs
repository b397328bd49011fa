use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use deployer_core::{paths, Registry};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum RegistrySubcommand {
    /// Print every registered component and its address
    Show {
        /// Registry file (default: contracts.json under the root)
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: RegistrySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RegistrySubcommand::Show { registry } => show(root, registry.as_deref(), json),
    }
}

fn show(root: &Path, registry: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = registry
        .map(|p| paths::resolve(root, p))
        .unwrap_or_else(|| paths::registry_path(root));
    let registry = Registry::load(&path)
        .with_context(|| format!("failed to load registry {}", path.display()))?;

    if json {
        return print_json(&registry);
    }

    if registry.is_empty() {
        println!("No components registered in {}.", path.display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = registry
        .iter()
        .map(|(name, address)| vec![name.to_string(), address.to_string()])
        .collect();
    print_table(&["COMPONENT", "ADDRESS"], rows);
    Ok(())
}
