use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::types::{
    AttributeMap, EdgeKind, EdgeRow, EntityKind, MergeOutcome, NodeRow, StoreStats, StoredEdge,
    StoredNode,
};

use super::GraphStore;
use super::schema;

/// SQLite-backed implementation of `GraphStore`.
///
/// Merge semantics ride on the schema's UNIQUE constraints: `INSERT OR
/// IGNORE` creates a row when the (kind, key) — or (kind, from, to) —
/// slot is free and leaves the existing row untouched otherwise, which is
/// exactly create-if-absent with creation-time attribute binding.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        // Performance pragmas (skip WAL for in-memory — it's auto)
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::Sqlite)?;

        // Try WAL mode — silently ignored for in-memory
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;

        conn.execute(
            "INSERT OR IGNORE INTO repograph_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(())
    }

    /// Helper: parse a properties JSON column.
    fn parse_properties(json_str: &str) -> AttributeMap {
        serde_json::from_str(json_str).unwrap_or_default()
    }

    /// Map an indexable attribute to a SQL expression over the nodes table.
    ///
    /// The natural key and the project discriminator have dedicated
    /// columns; anything else indexes into the properties JSON.
    fn index_expression(attribute: &str) -> Result<String, StoreError> {
        if attribute.is_empty()
            || !attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::InvalidAttribute(attribute.to_string()));
        }
        Ok(match attribute {
            "hash" => "key".to_string(),
            "project_id" => "project_id".to_string(),
            other => format!("json_extract(properties, '$.{other}')"),
        })
    }
}

#[async_trait::async_trait]
impl GraphStore for SqliteStore {
    async fn merge_nodes(
        &self,
        kind: EntityKind,
        rows: &[NodeRow],
    ) -> crate::error::Result<MergeOutcome> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;

        let mut outcome = MergeOutcome::default();
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO nodes (kind, key, project_id, properties)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(StoreError::Sqlite)?;

            for row in rows {
                let properties_json =
                    serde_json::to_string(&row.properties).map_err(StoreError::Serialization)?;
                let changed = stmt
                    .execute(params![
                        kind.as_str(),
                        row.key,
                        row.project_id,
                        properties_json
                    ])
                    .map_err(StoreError::Sqlite)?;
                if changed == 1 {
                    outcome.created += 1;
                } else {
                    outcome.matched += 1;
                }
            }
        }
        tx.commit().map_err(StoreError::Sqlite)?;

        Ok(outcome)
    }

    async fn get_node(
        &self,
        kind: EntityKind,
        key: &str,
    ) -> crate::error::Result<Option<StoredNode>> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let node = conn
            .query_row(
                "SELECT key, project_id, properties FROM nodes WHERE kind = ?1 AND key = ?2",
                params![kind.as_str(), key],
                |row| {
                    let properties: String = row.get(2)?;
                    Ok(StoredNode {
                        kind,
                        key: row.get(0)?,
                        project_id: row.get(1)?,
                        properties: Self::parse_properties(&properties),
                    })
                },
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(node)
    }

    async fn count_nodes(&self, kind: EntityKind) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let count: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM nodes WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(count)
    }

    async fn merge_edges(
        &self,
        kind: EdgeKind,
        rows: &[EdgeRow],
    ) -> crate::error::Result<MergeOutcome> {
        let (from_kind, to_kind) = kind.endpoints();
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;

        let mut outcome = MergeOutcome::default();
        {
            let mut lookup = tx
                .prepare_cached("SELECT id FROM nodes WHERE kind = ?1 AND key = ?2")
                .map_err(StoreError::Sqlite)?;
            let mut insert = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO edges (kind, from_id, to_id, attributes)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(StoreError::Sqlite)?;

            for row in rows {
                let from_id: Option<i64> = lookup
                    .query_row(params![from_kind.as_str(), row.from_key], |r| r.get(0))
                    .optional()
                    .map_err(StoreError::Sqlite)?;
                let to_id: Option<i64> = lookup
                    .query_row(params![to_kind.as_str(), row.to_key], |r| r.get(0))
                    .optional()
                    .map_err(StoreError::Sqlite)?;

                // A missing endpoint skips the row; the shortfall surfaces
                // in the outcome, never as a store error.
                let (Some(from_id), Some(to_id)) = (from_id, to_id) else {
                    continue;
                };

                let attributes_json = match &row.attributes {
                    Some(map) => {
                        serde_json::to_string(map).map_err(StoreError::Serialization)?
                    }
                    None => "{}".to_string(),
                };
                let changed = insert
                    .execute(params![kind.as_str(), from_id, to_id, attributes_json])
                    .map_err(StoreError::Sqlite)?;
                if changed == 1 {
                    outcome.created += 1;
                } else {
                    outcome.matched += 1;
                }
            }
        }
        tx.commit().map_err(StoreError::Sqlite)?;

        Ok(outcome)
    }

    async fn get_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
    ) -> crate::error::Result<Option<StoredEdge>> {
        let (from_kind, to_kind) = kind.endpoints();
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let edge = conn
            .query_row(
                "SELECT f.key, t.key, e.attributes FROM edges e
                 JOIN nodes f ON f.id = e.from_id
                 JOIN nodes t ON t.id = e.to_id
                 WHERE e.kind = ?1
                   AND f.kind = ?2 AND f.key = ?3
                   AND t.kind = ?4 AND t.key = ?5",
                params![
                    kind.as_str(),
                    from_kind.as_str(),
                    from_key,
                    to_kind.as_str(),
                    to_key
                ],
                |row| {
                    let attributes: String = row.get(2)?;
                    Ok(StoredEdge {
                        kind,
                        from_key: row.get(0)?,
                        to_key: row.get(1)?,
                        attributes: Self::parse_properties(&attributes),
                    })
                },
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(edge)
    }

    async fn count_edges(&self, kind: EdgeKind) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        let count: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM edges WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(count)
    }

    async fn ensure_index(&self, kind: EntityKind, attribute: &str) -> crate::error::Result<()> {
        let expression = Self::index_expression(attribute)?;
        let index_name = format!(
            "idx_nodes_{}_{attribute}",
            kind.as_str().to_ascii_lowercase()
        );
        // Partial per-kind index; the kind is a trusted internal enum, the
        // attribute was validated above, so splicing into DDL is sound
        // (CREATE INDEX does not take bind parameters).
        let ddl = format!(
            "CREATE INDEX IF NOT EXISTS {index_name} ON nodes({expression})
             WHERE kind = '{}'",
            kind.as_str()
        );

        let conn = self.conn.lock().expect("repograph store mutex poisoned");
        conn.execute_batch(&ddl).map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn stats(&self) -> crate::error::Result<StoreStats> {
        let conn = self.conn.lock().expect("repograph store mutex poisoned");

        let total_nodes: u64 = conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        let total_edges: u64 = conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;

        let mut nodes_by_kind = Vec::new();
        let mut stmt = conn
            .prepare("SELECT kind, COUNT(*) FROM nodes GROUP BY kind ORDER BY kind")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
            .map_err(StoreError::Sqlite)?;
        for row in rows {
            nodes_by_kind.push(row.map_err(StoreError::Sqlite)?);
        }

        let mut edges_by_kind = Vec::new();
        let mut stmt = conn
            .prepare("SELECT kind, COUNT(*) FROM edges GROUP BY kind ORDER BY kind")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
            .map_err(StoreError::Sqlite)?;
        for row in rows {
            edges_by_kind.push(row.map_err(StoreError::Sqlite)?);
        }

        let db_size_bytes = self
            .db_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map_or(0, |m| m.len());

        Ok(StoreStats {
            total_nodes,
            total_edges,
            nodes_by_kind,
            edges_by_kind,
            db_size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, project_id: Option<&str>) -> NodeRow {
        let mut properties = AttributeMap::new();
        properties.insert("name".into(), serde_json::Value::String(key.to_string()));
        NodeRow {
            key: key.to_string(),
            project_id: project_id.map(str::to_owned),
            properties,
        }
    }

    fn edge(from: &str, to: &str) -> EdgeRow {
        EdgeRow {
            from_key: from.to_string(),
            to_key: to.to_string(),
            attributes: None,
        }
    }

    #[tokio::test]
    async fn merge_nodes_creates_then_matches() {
        let store = SqliteStore::in_memory().unwrap();
        let rows = vec![node("c1", Some("p1")), node("c2", Some("p1"))];

        let first = store.merge_nodes(EntityKind::Commit, &rows).await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.matched, 0);

        let second = store.merge_nodes(EntityKind::Commit, &rows).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.matched, 2);

        assert_eq!(store.count_nodes(EntityKind::Commit).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn merge_is_keyed_not_attribute_reconciling() {
        let store = SqliteStore::in_memory().unwrap();
        let mut row = node("d1", None);
        store
            .merge_nodes(EntityKind::Developer, &[row.clone()])
            .await
            .unwrap();

        // Same key, different attributes: existing node stays untouched.
        row.properties
            .insert("name".into(), serde_json::Value::String("changed".into()));
        let outcome = store
            .merge_nodes(EntityKind::Developer, &[row])
            .await
            .unwrap();
        assert_eq!(outcome.matched, 1);

        let stored = store
            .get_node(EntityKind::Developer, "d1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.properties["name"], "d1");
    }

    #[tokio::test]
    async fn same_key_different_kind_is_distinct() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("x", Some("p"))])
            .await
            .unwrap();
        store
            .merge_nodes(EntityKind::File, &[node("x", Some("p"))])
            .await
            .unwrap();
        assert_eq!(store.count_nodes(EntityKind::Commit).await.unwrap(), 1);
        assert_eq!(store.count_nodes(EntityKind::File).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn merge_edges_requires_both_endpoints() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("c1", Some("p")), node("c2", Some("p"))])
            .await
            .unwrap();

        let outcome = store
            .merge_edges(
                EdgeKind::Parent,
                &[edge("c1", "c2"), edge("c1", "missing")],
            )
            .await
            .unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.applied(), 1);
        assert_eq!(store.count_edges(EdgeKind::Parent).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn merge_edges_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("c1", Some("p")), node("c2", Some("p"))])
            .await
            .unwrap();

        let rows = vec![edge("c1", "c2")];
        store.merge_edges(EdgeKind::Parent, &rows).await.unwrap();
        let again = store.merge_edges(EdgeKind::Parent, &rows).await.unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.matched, 1);
        assert_eq!(store.count_edges(EdgeKind::Parent).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn edge_attributes_bind_at_creation_only() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("c1", Some("p"))])
            .await
            .unwrap();
        store
            .merge_nodes(EntityKind::File, &[node("f1", Some("p"))])
            .await
            .unwrap();

        let mut first = AttributeMap::new();
        first.insert("added".into(), serde_json::Value::from(10));
        store
            .merge_edges(
                EdgeKind::UpdateFile,
                &[EdgeRow {
                    from_key: "c1".into(),
                    to_key: "f1".into(),
                    attributes: Some(first),
                }],
            )
            .await
            .unwrap();

        let mut second = AttributeMap::new();
        second.insert("added".into(), serde_json::Value::from(99));
        store
            .merge_edges(
                EdgeKind::UpdateFile,
                &[EdgeRow {
                    from_key: "c1".into(),
                    to_key: "f1".into(),
                    attributes: Some(second),
                }],
            )
            .await
            .unwrap();

        let stored = store
            .get_edge(EdgeKind::UpdateFile, "c1", "f1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.attributes["added"], 10);
    }

    #[tokio::test]
    async fn edge_direction_is_part_of_identity() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("c1", Some("p")), node("c2", Some("p"))])
            .await
            .unwrap();

        store
            .merge_edges(EdgeKind::Parent, &[edge("c1", "c2")])
            .await
            .unwrap();
        let outcome = store
            .merge_edges(EdgeKind::Parent, &[edge("c2", "c1")])
            .await
            .unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(store.count_edges(EdgeKind::Parent).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ensure_index_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .ensure_index(EntityKind::Commit, "hash")
            .await
            .unwrap();
        store
            .ensure_index(EntityKind::Commit, "hash")
            .await
            .unwrap();
        store
            .ensure_index(EntityKind::Commit, "project_id")
            .await
            .unwrap();

        let conn = store.conn.lock().unwrap();
        let count: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name LIKE 'idx_nodes_commit_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn ensure_index_on_property_attribute() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .ensure_index(EntityKind::File, "name")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ensure_index_rejects_non_identifier() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .ensure_index(EntityKind::File, "na me'; DROP TABLE nodes; --")
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn stats_reports_counts_by_kind() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .merge_nodes(EntityKind::Commit, &[node("c1", Some("p")), node("c2", Some("p"))])
            .await
            .unwrap();
        store
            .merge_nodes(EntityKind::Developer, &[node("d1", None)])
            .await
            .unwrap();
        store
            .merge_edges(EdgeKind::Parent, &[edge("c1", "c2")])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 1);
        assert!(
            stats
                .nodes_by_kind
                .contains(&("Commit".to_string(), 2))
        );
        assert!(
            stats
                .edges_by_kind
                .contains(&("Parent".to_string(), 1))
        );
    }
}
