/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for Repograph's `SQLite` database.
///
/// Nodes and edges are generic rows discriminated by `kind`; per-entity
/// attributes live in a JSON column. The UNIQUE constraints carry the
/// merge semantics: a node exists per (kind, key), an edge per
/// (kind, from, to).
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS repograph_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- All nodes in the property graph
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    key TEXT NOT NULL,
    project_id TEXT,
    properties TEXT NOT NULL DEFAULT '{}',
    UNIQUE(kind, key)
);
CREATE INDEX IF NOT EXISTS idx_nodes_kind ON nodes(kind);

-- Directed edges between nodes
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    from_id INTEGER NOT NULL REFERENCES nodes(id),
    to_id INTEGER NOT NULL REFERENCES nodes(id),
    attributes TEXT NOT NULL DEFAULT '{}',
    UNIQUE(kind, from_id, to_id)
);
CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind);
CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);
";

/// `SQLite` PRAGMAs for performance.
pub const PRAGMAS_SQL: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;
PRAGMA foreign_keys = ON;
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_executes_on_in_memory_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        // Execute pragmas (skip WAL for in-memory)
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"nodes".to_string()));
        assert!(tables.contains(&"edges".to_string()));
        assert!(tables.contains(&"repograph_meta".to_string()));
    }

    #[test]
    fn schema_is_reentrant() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
    }

    #[test]
    fn schema_version_is_set() {
        assert_eq!(SCHEMA_VERSION, "1");
    }
}
