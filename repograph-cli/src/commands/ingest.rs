use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::warn;

use repograph_core::ingest::IngestPipeline;
use repograph_core::progress::IndicatifReporter;
use repograph_core::store::sqlite::SqliteStore;
use repograph_core::types::GraphPayload;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Miner payload to ingest (JSON)
    pub payload: PathBuf,

    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Records per store round-trip (0 = submit collections whole)
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Fail when edge records reference entities missing from the store
    #[arg(long)]
    pub verify_endpoints: bool,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let project_path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let mut config = super::load_config(&project_path)?;
    if let Some(batch_size) = args.batch_size {
        config.ingestion.batch_size = batch_size;
    }
    if args.verify_endpoints {
        config.ingestion.verify_endpoints = true;
    }

    let payload_str = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("Cannot read payload: {}", args.payload.display()))?;
    let payload: GraphPayload = serde_json::from_str(&payload_str)
        .with_context(|| format!("Cannot parse payload: {}", args.payload.display()))?;

    check_project_scope(&config.project.id, &payload);

    let db_path = super::resolve_db_path(&project_path);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let progress = IndicatifReporter::new();
    let pipeline = IngestPipeline::new(&config);
    let report = pipeline
        .ingest_all(&store, payload, &progress)
        .await
        .context("Ingestion failed")?;

    println!(
        "Ingested {} into {}",
        args.payload.display(),
        project_path.display()
    );
    println!();
    println!(
        "  Nodes created:   {} ({} already present)",
        report.nodes_created, report.nodes_matched
    );
    println!(
        "  Edges created:   {} ({} already present, {} skipped)",
        report.edges_created, report.edges_matched, report.edges_skipped
    );
    println!("  Duration:        {:.2?}", report.duration);

    Ok(())
}

/// Warn about records scoped to a different project than this store.
fn check_project_scope(project_id: &str, payload: &GraphPayload) {
    if project_id.is_empty() {
        return;
    }
    let mismatched = payload
        .commits
        .iter()
        .map(|c| c.project_id.as_str())
        .chain(payload.branches.iter().map(|b| b.project_id.as_str()))
        .chain(payload.files.iter().map(|f| f.project_id.as_str()))
        .chain(payload.methods.iter().map(|m| m.project_id.as_str()))
        .filter(|id| *id != project_id)
        .count();
    if mismatched > 0 {
        warn!(
            project_id,
            mismatched, "Payload contains records scoped to a different project"
        );
    }
}
