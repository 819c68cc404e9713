use tracing::{debug, warn};

use crate::error::IngestError;
use crate::progress::ProgressReporter;
use crate::store::GraphStore;
use crate::types::{EdgeRecord, EdgeRow, MergeOutcome};

use super::batch::{BatchSize, batches};

/// Merge edge-typed `records` into the store by endpoint natural-key
/// match, one batch per store round-trip.
///
/// Both endpoint entity kinds must already be fully merged before this
/// runs; an edge whose endpoints are absent is silently skipped by the
/// store (the match finds nothing) and surfaces only in the outcome.
/// With `verify_endpoints` the skip becomes a referential-gap error
/// instead, carrying the kind and batch index needed for a safe
/// end-to-end re-run.
pub async fn upsert_relationships<R: EdgeRecord>(
    store: &dyn GraphStore,
    records: &[R],
    size: BatchSize,
    verify_endpoints: bool,
    progress: &dyn ProgressReporter,
) -> crate::error::Result<MergeOutcome> {
    progress.start(R::KIND.as_str(), Some(records.len() as u64));

    let mut outcome = MergeOutcome::default();
    for (batch_index, chunk) in batches(records, size).enumerate() {
        let rows = chunk
            .iter()
            .map(|record| to_row(record, batch_index))
            .collect::<Result<Vec<_>, _>>()?;

        let merged = store.merge_edges(R::KIND, &rows).await?;
        debug!(
            kind = R::KIND.as_str(),
            batch = batch_index,
            created = merged.created,
            matched = merged.matched,
            "Merged relationship batch"
        );

        let missing = rows.len() as u64 - merged.applied();
        if missing > 0 {
            if verify_endpoints {
                return Err(IngestError::ReferentialGap {
                    kind: R::KIND.to_string(),
                    batch_index,
                    missing,
                }
                .into());
            }
            warn!(
                kind = R::KIND.as_str(),
                batch = batch_index,
                missing,
                "Edge rows skipped: endpoint nodes not found"
            );
        }

        outcome.absorb(merged);
        progress.advance(chunk.len() as u64);
    }

    progress.finish();
    Ok(outcome)
}

fn to_row<R: EdgeRecord>(record: &R, batch_index: usize) -> Result<EdgeRow, IngestError> {
    let (from_key, to_key) = (record.from_key(), record.to_key());
    if from_key.is_empty() || to_key.is_empty() {
        return Err(IngestError::MalformedRecord {
            kind: R::KIND.to_string(),
            batch_index,
            reason: "empty endpoint key".to_string(),
        });
    }
    Ok(EdgeRow {
        from_key: from_key.to_owned(),
        to_key: to_key.to_owned(),
        attributes: record.attributes(),
    })
}
