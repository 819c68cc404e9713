use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use repograph_core::config::RepographConfig;
use repograph_core::store::sqlite::SqliteStore;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Project identifier stored in the config (default: directory name)
    #[arg(long)]
    pub project: Option<String>,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

pub async fn run(args: InitArgs) -> anyhow::Result<()> {
    let project_path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let repograph_dir = project_path.join(".repograph");
    let config_path = repograph_dir.join("config.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Repograph is already initialized in {}. Use --force to overwrite.",
            project_path.display()
        );
    }

    std::fs::create_dir_all(&repograph_dir)
        .with_context(|| format!("Cannot create directory: {}", repograph_dir.display()))?;

    let project_id = args.project.unwrap_or_else(|| {
        project_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut config = RepographConfig::default();
    config.project.id.clone_from(&project_id);

    let config_str = toml::to_string_pretty(&config).context("Cannot serialize config")?;
    std::fs::write(&config_path, config_str)
        .with_context(|| format!("Cannot write config: {}", config_path.display()))?;

    // Materialize the store so the schema exists before the first ingest.
    let db_path = super::resolve_db_path(&project_path);
    SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    println!("Initialized Repograph in {}", project_path.display());
    println!();
    println!("  Project id: {project_id}");
    println!("  Config:     {}", config_path.display());
    println!("  Store:      {}", db_path.display());

    Ok(())
}
