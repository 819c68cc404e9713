use tracing::debug;

use crate::error::IngestError;
use crate::progress::ProgressReporter;
use crate::store::GraphStore;
use crate::types::{EntityRecord, MergeOutcome, NodeRow};

use super::batch::{BatchSize, batches};

/// Merge node-typed `records` into the store, one idempotent keyed merge
/// per batch.
///
/// Each batch is validated before submission; a record with an empty
/// natural key rejects its batch without touching the store. Failure
/// handling is the caller's: a store error aborts the current batch,
/// batches already committed stay committed, and re-running the whole
/// kind from scratch is safe because merges are keyed.
pub async fn upsert_entities<R: EntityRecord>(
    store: &dyn GraphStore,
    records: &[R],
    size: BatchSize,
    progress: &dyn ProgressReporter,
) -> crate::error::Result<MergeOutcome> {
    progress.start(R::KIND.as_str(), Some(records.len() as u64));

    let mut outcome = MergeOutcome::default();
    for (batch_index, chunk) in batches(records, size).enumerate() {
        let rows = chunk
            .iter()
            .map(|record| to_row(record, batch_index))
            .collect::<Result<Vec<_>, _>>()?;

        let merged = store.merge_nodes(R::KIND, &rows).await?;
        debug!(
            kind = R::KIND.as_str(),
            batch = batch_index,
            created = merged.created,
            matched = merged.matched,
            "Merged entity batch"
        );
        outcome.absorb(merged);
        progress.advance(chunk.len() as u64);
    }

    progress.finish();
    Ok(outcome)
}

fn to_row<R: EntityRecord>(record: &R, batch_index: usize) -> Result<NodeRow, IngestError> {
    let key = record.natural_key();
    if key.is_empty() {
        return Err(IngestError::MalformedRecord {
            kind: R::KIND.to_string(),
            batch_index,
            reason: "empty natural key".to_string(),
        });
    }
    Ok(NodeRow {
        key: key.to_owned(),
        project_id: record.project_id().map(str::to_owned),
        properties: record.attributes(),
    })
}
