use crate::types::{
    EdgeKind, EdgeRow, EntityKind, MergeOutcome, NodeRow, StoreStats, StoredEdge, StoredNode,
};

/// The core store abstraction. The ingestion engine writes through this
/// trait; any backing store offering conditional-create-by-key and
/// conditional-create-edge-by-match can implement it.
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    // ── Node operations ────────────────────────────────────────────

    /// Merge a batch of nodes by natural key: create each node that has no
    /// existing row with the same (kind, key), leave existing nodes
    /// untouched. Attribute mismatches on an existing node are NOT
    /// detected or reconciled. The batch is applied atomically.
    async fn merge_nodes(
        &self,
        kind: EntityKind,
        rows: &[NodeRow],
    ) -> crate::error::Result<MergeOutcome>;

    /// Get a node by kind and natural key.
    async fn get_node(
        &self,
        kind: EntityKind,
        key: &str,
    ) -> crate::error::Result<Option<StoredNode>>;

    /// Count nodes of a kind.
    async fn count_nodes(&self, kind: EntityKind) -> crate::error::Result<u64>;

    // ── Edge operations ────────────────────────────────────────────

    /// Merge a batch of edges: for each row, locate the endpoint nodes by
    /// natural key (scoped to the edge kind's endpoint entity kinds) and
    /// create the edge unless one of this kind already connects them.
    /// Attributes are bound at creation only — a pre-existing edge keeps
    /// its stored attributes. Rows whose endpoints are absent are skipped,
    /// not errors; callers detect the shortfall via the outcome.
    async fn merge_edges(
        &self,
        kind: EdgeKind,
        rows: &[EdgeRow],
    ) -> crate::error::Result<MergeOutcome>;

    /// Get an edge by kind and endpoint natural keys.
    async fn get_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
    ) -> crate::error::Result<Option<StoredEdge>>;

    /// Count edges of a kind.
    async fn count_edges(&self, kind: EdgeKind) -> crate::error::Result<u64>;

    // ── Indices ────────────────────────────────────────────────────

    /// Idempotently declare a lookup index on (kind, attribute).
    /// Declaring an index that already exists is a no-op.
    async fn ensure_index(&self, kind: EntityKind, attribute: &str) -> crate::error::Result<()>;

    // ── Metrics ────────────────────────────────────────────────────

    /// Get summary statistics about the store.
    async fn stats(&self) -> crate::error::Result<StoreStats>;
}
