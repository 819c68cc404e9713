/// Top-level Repograph error type.
///
/// All fallible operations in `repograph-core` return
/// [`Result<T, RepographError>`](Result). Each variant wraps a
/// domain-specific error enum, allowing callers to match on the error
/// source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum RepographError {
    /// Error from the graph store layer (`SQLite` operations).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error raised by the ingestion engine (bad records, referential gaps).
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the SQLite-backed graph store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization of node or edge attributes failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An index was requested on an attribute name that is not a plain
    /// identifier (and cannot be spliced into DDL safely).
    #[error("Invalid index attribute: {0}")]
    InvalidAttribute(String),
}

/// Errors raised while indexing a mining payload.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    /// A record is missing its natural key (or an endpoint key) and the
    /// containing batch was rejected before submission.
    #[error("Malformed {kind} record in batch {batch_index}: {reason}")]
    MalformedRecord {
        /// Entity or relationship kind of the offending record.
        kind: String,
        /// Zero-based batch index within the kind's submission.
        batch_index: usize,
        /// What was wrong with the record.
        reason: String,
    },

    /// An edge batch resolved fewer rows than it submitted, meaning some
    /// endpoint nodes were absent. Only raised when endpoint verification
    /// is enabled; the default mirrors the store's silent skip.
    #[error("{missing} {kind} edge(s) in batch {batch_index} reference missing endpoints")]
    ReferentialGap {
        /// Relationship kind of the affected batch.
        kind: String,
        /// Zero-based batch index within the kind's submission.
        batch_index: usize,
        /// Number of rows that failed to resolve both endpoints.
        missing: u64,
    },
}

/// Errors in Repograph configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, RepographError>`.
pub type Result<T> = std::result::Result<T, RepographError>;
