use std::time::{Duration, Instant};

use tracing::info;

use crate::config::RepographConfig;
use crate::progress::ProgressReporter;
use crate::store::GraphStore;
use crate::types::{EdgeRecord, EntityRecord, GraphPayload, MergeOutcome};

use super::batch::BatchSize;
use super::dedup::{dedup_last_wins, structural_key};
use super::entities::upsert_entities;
use super::indices::ensure_entity_indices;
use super::relationships::upsert_relationships;

/// Orchestrates one ingestion run: dedup → entity kinds (each followed by
/// its index declarations) → relationship kinds.
///
/// Every entity kind is fully acknowledged before the first relationship
/// write goes out; that barrier is what lets edge merges match endpoints
/// by natural key. No transaction spans the run — each batch is
/// independently idempotent, so re-invoking the whole operation after a
/// partial failure is safe (at-least-once, not exactly-once).
#[derive(Debug)]
pub struct IngestPipeline {
    batch: BatchSize,
    verify_endpoints: bool,
}

/// Counts and timing for one entity or relationship kind.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub name: &'static str,
    pub records: usize,
    pub created: u64,
    pub duration: Duration,
}

/// What an ingestion run did, per kind and in total.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub nodes_created: u64,
    pub nodes_matched: u64,
    pub edges_created: u64,
    pub edges_matched: u64,
    /// Edge records whose endpoints were absent (only non-zero when
    /// endpoint verification is off).
    pub edges_skipped: u64,
    pub duration: Duration,
    pub phases: Vec<PhaseReport>,
}

impl IngestPipeline {
    pub fn new(config: &RepographConfig) -> Self {
        Self {
            batch: BatchSize::from_config(config.ingestion.batch_size),
            verify_endpoints: config.ingestion.verify_endpoints,
        }
    }

    /// Override the configured batching mode.
    pub fn with_batch_size(mut self, batch: BatchSize) -> Self {
        self.batch = batch;
        self
    }

    /// Ingest one mining run's payload into the store.
    pub async fn ingest_all(
        &self,
        store: &dyn GraphStore,
        payload: GraphPayload,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<IngestReport> {
        let started = Instant::now();
        let mut report = IngestReport::default();

        // Collapse within-run repeats before batching. Entities dedup by
        // natural key (last record wins); plain relationship records dedup
        // by their full payload. Commits, authorship, and update edges
        // arrive deduplicated from the miner and are passed through.
        let developers = dedup_last_wins(payload.developers, |d| d.hash.clone());
        let parents = dedup_last_wins(payload.parents, structural_key);
        let branches = dedup_last_wins(payload.branches, |b| b.hash.clone());
        let branch_commits = dedup_last_wins(payload.branch_commits, structural_key);
        let files = dedup_last_wins(payload.files, |f| f.hash.clone());
        let methods = dedup_last_wins(payload.methods, |m| m.hash.clone());
        let file_methods = dedup_last_wins(payload.file_methods, structural_key);
        let commits = payload.commits;
        let authors = payload.authors;
        let update_files = payload.update_files;
        let update_methods = payload.update_methods;

        // Entity phase. Order among kinds is free of dependencies, but all
        // of them must complete before any relationship write begins.
        self.entities(store, &developers, progress, &mut report).await?;
        self.entities(store, &commits, progress, &mut report).await?;
        self.entities(store, &branches, progress, &mut report).await?;
        self.entities(store, &files, progress, &mut report).await?;
        self.entities(store, &methods, progress, &mut report).await?;

        // Relationship phase. Each kind only needs its two endpoint kinds,
        // already acknowledged above.
        self.relationships(store, &parents, progress, &mut report).await?;
        self.relationships(store, &authors, progress, &mut report).await?;
        self.relationships(store, &branch_commits, progress, &mut report).await?;
        self.relationships(store, &file_methods, progress, &mut report).await?;
        self.relationships(store, &update_methods, progress, &mut report).await?;
        self.relationships(store, &update_files, progress, &mut report).await?;

        report.duration = started.elapsed();
        info!(
            nodes_created = report.nodes_created,
            edges_created = report.edges_created,
            edges_skipped = report.edges_skipped,
            elapsed = ?report.duration,
            "Ingestion run complete"
        );
        Ok(report)
    }

    /// One entity kind: bulk merge, then its index declarations.
    async fn entities<R: EntityRecord>(
        &self,
        store: &dyn GraphStore,
        records: &[R],
        progress: &dyn ProgressReporter,
        report: &mut IngestReport,
    ) -> crate::error::Result<MergeOutcome> {
        let start = Instant::now();
        info!(count = records.len(), kind = R::KIND.as_str(), "Indexing entities");

        let outcome = upsert_entities(store, records, self.batch, progress).await?;
        ensure_entity_indices(store, R::KIND).await?;

        report.nodes_created += outcome.created;
        report.nodes_matched += outcome.matched;
        report.phases.push(PhaseReport {
            name: R::KIND.as_str(),
            records: records.len(),
            created: outcome.created,
            duration: start.elapsed(),
        });
        Ok(outcome)
    }

    /// One relationship kind.
    async fn relationships<R: EdgeRecord>(
        &self,
        store: &dyn GraphStore,
        records: &[R],
        progress: &dyn ProgressReporter,
        report: &mut IngestReport,
    ) -> crate::error::Result<MergeOutcome> {
        let start = Instant::now();
        info!(count = records.len(), kind = R::KIND.as_str(), "Indexing relationships");

        let outcome =
            upsert_relationships(store, records, self.batch, self.verify_endpoints, progress)
                .await?;

        report.edges_created += outcome.created;
        report.edges_matched += outcome.matched;
        report.edges_skipped += records.len() as u64 - outcome.applied();
        report.phases.push(PhaseReport {
            name: R::KIND.as_str(),
            records: records.len(),
            created: outcome.created,
            duration: start.elapsed(),
        });
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::progress::NoopReporter;
    use crate::store::sqlite::SqliteStore;
    use crate::types::{
        AuthorEdge, Commit, Developer, EdgeKind, EntityKind, ParentEdge,
    };

    use chrono::Utc;

    fn commit(hash: &str) -> Commit {
        Commit {
            hash: hash.into(),
            timestamp: Utc::now(),
            is_merge: false,
            project_id: "p1".into(),
        }
    }

    fn payload() -> GraphPayload {
        GraphPayload {
            developers: vec![Developer {
                hash: "d1".into(),
                email: "a@x".into(),
                name: "A".into(),
            }],
            commits: vec![commit("c1"), commit("c2")],
            parents: vec![ParentEdge {
                parent_hash: "c1".into(),
                child_hash: "c2".into(),
            }],
            authors: vec![
                AuthorEdge {
                    author_hash: "d1".into(),
                    commit_hash: "c1".into(),
                    timestamp: Utc::now(),
                },
                AuthorEdge {
                    author_hash: "d1".into(),
                    commit_hash: "c2".into(),
                    timestamp: Utc::now(),
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn entities_land_before_relationships() {
        let store = SqliteStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(&RepographConfig::default());

        let report = pipeline
            .ingest_all(&store, payload(), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.nodes_created, 3);
        assert_eq!(report.edges_created, 3);
        assert_eq!(report.edges_skipped, 0);
        assert_eq!(store.count_edges(EdgeKind::Parent).await.unwrap(), 1);
        assert_eq!(store.count_edges(EdgeKind::Author).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn report_covers_every_kind() {
        let store = SqliteStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(&RepographConfig::default());

        let report = pipeline
            .ingest_all(&store, payload(), &NoopReporter)
            .await
            .unwrap();

        // 5 entity kinds + 6 relationship kinds, in the fixed run order.
        assert_eq!(report.phases.len(), 11);
        assert_eq!(report.phases[0].name, "Developer");
        assert_eq!(report.phases[4].name, "Method");
        assert_eq!(report.phases[5].name, "Parent");
        assert_eq!(report.phases[10].name, "UpdateFile");
    }

    #[tokio::test]
    async fn rerun_is_idempotent_end_to_end() {
        let store = SqliteStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(&RepographConfig::default());

        pipeline
            .ingest_all(&store, payload(), &NoopReporter)
            .await
            .unwrap();
        let second = pipeline
            .ingest_all(&store, payload(), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(second.nodes_created, 0);
        assert_eq!(second.edges_created, 0);
        assert_eq!(store.count_nodes(EntityKind::Commit).await.unwrap(), 2);
        assert_eq!(store.count_edges(EdgeKind::Author).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn batch_size_override_does_not_change_results() {
        let store = SqliteStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(&RepographConfig::default())
            .with_batch_size(crate::ingest::BatchSize::All);

        let report = pipeline
            .ingest_all(&store, payload(), &NoopReporter)
            .await
            .unwrap();
        assert_eq!(report.nodes_created, 3);
        assert_eq!(report.edges_created, 3);
    }

    #[tokio::test]
    async fn duplicate_entity_records_collapse_last_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(&RepographConfig::default());

        let mut p = payload();
        p.developers = vec![
            Developer {
                hash: "d1".into(),
                email: "old@x".into(),
                name: "A".into(),
            },
            Developer {
                hash: "d2".into(),
                email: "b@x".into(),
                name: "B".into(),
            },
            Developer {
                hash: "d1".into(),
                email: "new@x".into(),
                name: "A".into(),
            },
        ];

        pipeline.ingest_all(&store, p, &NoopReporter).await.unwrap();

        assert_eq!(store.count_nodes(EntityKind::Developer).await.unwrap(), 2);
        let d1 = store
            .get_node(EntityKind::Developer, "d1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d1.properties["email"], "new@x");
    }
}
