use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use repograph_core::store::GraphStore;
use repograph_core::store::sqlite::SqliteStore;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let project_path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let config = super::load_config(&project_path)?;

    let db_path = super::resolve_db_path(&project_path);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;
    let stats = store.stats().await.context("Cannot read store stats")?;

    println!("Repograph store at {}", db_path.display());
    if !config.project.id.is_empty() {
        println!("Project: {}", config.project.id);
    }
    println!();

    println!("  Nodes: {}", stats.total_nodes);
    for (kind, count) in &stats.nodes_by_kind {
        println!("    {kind:<14} {count}");
    }
    println!("  Edges: {}", stats.total_edges);
    for (kind, count) in &stats.edges_by_kind {
        println!("    {kind:<14} {count}");
    }
    println!("  Size:  {} bytes", stats.db_size_bytes);

    Ok(())
}
