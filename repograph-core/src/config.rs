use serde::{Deserialize, Serialize};

/// Top-level Repograph configuration, matching `.repograph/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepographConfig {
    #[serde(default)]
    pub repograph: RepographSection,
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub ingestion: IngestionSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepographSection {
    pub version: String,
}

impl Default for RepographSection {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
        }
    }
}

/// The mined project this store is scoped to. When set, ingestion warns
/// about payload records carrying a different `project_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSection {
    /// Records per store round-trip. `0` submits each collection whole.
    pub batch_size: u32,
    /// Raise a referential-gap error when an edge batch resolves fewer
    /// rows than it submitted, instead of silently skipping them.
    pub verify_endpoints: bool,
}

impl Default for IngestionSection {
    fn default() -> Self {
        Self {
            batch_size: 100,
            verify_endpoints: false,
        }
    }
}
