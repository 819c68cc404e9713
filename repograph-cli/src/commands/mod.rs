pub mod ingest;
pub mod init;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use repograph_core::config::RepographConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a Repograph project directory and empty store
    Init(init::InitArgs),
    /// Ingest a miner payload (JSON) into the property graph
    Ingest(ingest::IngestArgs),
    /// Show current state of the property graph store
    Status(status::StatusArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Init(args) => init::run(args).await,
        Command::Ingest(args) => ingest::run(args).await,
        Command::Status(args) => status::run(args).await,
    }
}

/// Where the store lives inside a project directory.
pub fn resolve_db_path(project_path: &Path) -> PathBuf {
    project_path.join(".repograph").join("repograph.db")
}

/// Load `.repograph/config.toml`, insisting the project is initialized.
pub fn load_config(project_path: &Path) -> anyhow::Result<RepographConfig> {
    let config_path = project_path.join(".repograph").join("config.toml");
    if !config_path.exists() {
        anyhow::bail!(
            "Repograph is not initialized in {}. Run `repograph init` first.",
            project_path.display()
        );
    }
    let config_str = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Cannot read config: {}", config_path.display()))?;
    let config: RepographConfig = toml::from_str(&config_str)
        .with_context(|| format!("Cannot parse config: {}", config_path.display()))?;
    Ok(config)
}
