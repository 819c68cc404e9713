use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Graph vocabulary ───────────────────────────────────────────────

/// Every entity mined from a repository becomes a node of one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A commit author, keyed by an identity-derived hash.
    Developer,
    /// A git commit, keyed by its commit hash.
    Commit,
    /// A branch, keyed by a hash derived from name and project.
    Branch,
    /// A tracked file, keyed by a path-derived hash.
    File,
    /// A method/function inside a file, keyed by its own hash.
    Method,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "Developer",
            Self::Commit => "Commit",
            Self::Branch => "Branch",
            Self::File => "File",
            Self::Method => "Method",
        }
    }

    /// Whether nodes of this kind carry a `project_id` discriminator.
    /// Developers are shared across projects and carry none.
    pub fn carries_project_id(self) -> bool {
        !matches!(self, Self::Developer)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed, typed relationships between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Commit → Commit: the source is a parent of the target.
    Parent,
    /// Developer → Commit: authorship, stamped with the commit timestamp.
    Author,
    /// Branch → Commit: the commit is reachable from the branch.
    BranchCommit,
    /// Commit → File: the commit touched the file; change stats attached at creation.
    UpdateFile,
    /// File → Method: the method is defined in the file.
    FileMethod,
    /// Commit → Method: the commit touched the method; change stats attached at creation.
    UpdateMethod,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "Parent",
            Self::Author => "Author",
            Self::BranchCommit => "BranchCommit",
            Self::UpdateFile => "UpdateFile",
            Self::FileMethod => "FileMethod",
            Self::UpdateMethod => "UpdateMethod",
        }
    }

    /// The entity kinds an edge of this kind connects, as (from, to).
    pub fn endpoints(self) -> (EntityKind, EntityKind) {
        match self {
            Self::Parent => (EntityKind::Commit, EntityKind::Commit),
            Self::Author => (EntityKind::Developer, EntityKind::Commit),
            Self::BranchCommit => (EntityKind::Branch, EntityKind::Commit),
            Self::UpdateFile => (EntityKind::Commit, EntityKind::File),
            Self::FileMethod => (EntityKind::File, EntityKind::Method),
            Self::UpdateMethod => (EntityKind::Commit, EntityKind::Method),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arbitrary key-value attributes: node properties, or the payload bound
/// to a change edge at creation time.
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

// ── Entity records ─────────────────────────────────────────────────

/// A commit author. The hash is derived from the author identity, so the
/// same person resolves to one node across re-mining runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Developer {
    pub hash: String,
    pub email: String,
    pub name: String,
}

/// A git commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub is_merge: bool,
    pub project_id: String,
}

/// A branch, scoped to one mined project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Branch {
    pub hash: String,
    pub name: String,
    pub project_id: String,
}

/// A tracked file, scoped to one mined project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntity {
    pub hash: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub name: String,
}

/// A method or function definition inside a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Method {
    pub hash: String,
    pub project_id: String,
    pub name: String,
    pub file_name: String,
}

/// Node-typed records that can be merged into the store by natural key.
pub trait EntityRecord: Send + Sync {
    const KIND: EntityKind;

    /// The stable, content-derived identifier the merge is keyed on.
    fn natural_key(&self) -> &str;

    /// The project discriminator, for kinds that carry one.
    fn project_id(&self) -> Option<&str>;

    /// Remaining attributes, stored verbatim on the node at creation.
    fn attributes(&self) -> AttributeMap;
}

fn json_str(value: &str) -> serde_json::Value {
    serde_json::Value::String(value.to_owned())
}

impl EntityRecord for Developer {
    const KIND: EntityKind = EntityKind::Developer;

    fn natural_key(&self) -> &str {
        &self.hash
    }

    fn project_id(&self) -> Option<&str> {
        None
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("email".into(), json_str(&self.email));
        map.insert("name".into(), json_str(&self.name));
        map
    }
}

impl EntityRecord for Commit {
    const KIND: EntityKind = EntityKind::Commit;

    fn natural_key(&self) -> &str {
        &self.hash
    }

    fn project_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("timestamp".into(), json_str(&self.timestamp.to_rfc3339()));
        map.insert("is_merge".into(), serde_json::Value::Bool(self.is_merge));
        map
    }
}

impl EntityRecord for Branch {
    const KIND: EntityKind = EntityKind::Branch;

    fn natural_key(&self) -> &str {
        &self.hash
    }

    fn project_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("name".into(), json_str(&self.name));
        map
    }
}

impl EntityRecord for FileEntity {
    const KIND: EntityKind = EntityKind::File;

    fn natural_key(&self) -> &str {
        &self.hash
    }

    fn project_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("type".into(), json_str(&self.file_type));
        map.insert("name".into(), json_str(&self.name));
        map
    }
}

impl EntityRecord for Method {
    const KIND: EntityKind = EntityKind::Method;

    fn natural_key(&self) -> &str {
        &self.hash
    }

    fn project_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }

    fn attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("name".into(), json_str(&self.name));
        map.insert("file_name".into(), json_str(&self.file_name));
        map
    }
}

// ── Relationship records ───────────────────────────────────────────

/// Parent → child commit link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentEdge {
    pub parent_hash: String,
    pub child_hash: String,
}

/// Developer → commit authorship, stamped with the commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorEdge {
    pub author_hash: String,
    pub commit_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// Branch → commit membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchCommitEdge {
    pub branch_hash: String,
    pub commit_hash: String,
}

/// Commit → file change, with miner-supplied change stats
/// (lines added/removed, change type, …) bound at edge creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFileEdge {
    pub commit_hash: String,
    pub file_hash: String,
    #[serde(default)]
    pub attributes: AttributeMap,
}

/// File → method containment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMethodEdge {
    pub file_hash: String,
    pub method_hash: String,
}

/// Commit → method change, with miner-supplied change stats
/// (complexity delta, …) bound at edge creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMethodEdge {
    pub commit_hash: String,
    pub method_hash: String,
    #[serde(default)]
    pub attributes: AttributeMap,
}

/// Edge-typed records that can be merged into the store by endpoint match.
pub trait EdgeRecord: Send + Sync {
    const KIND: EdgeKind;

    /// Natural key of the source node.
    fn from_key(&self) -> &str;

    /// Natural key of the target node.
    fn to_key(&self) -> &str;

    /// Attribute payload set when (and only when) the edge is created.
    fn attributes(&self) -> Option<AttributeMap> {
        None
    }
}

impl EdgeRecord for ParentEdge {
    const KIND: EdgeKind = EdgeKind::Parent;

    fn from_key(&self) -> &str {
        &self.parent_hash
    }

    fn to_key(&self) -> &str {
        &self.child_hash
    }
}

impl EdgeRecord for AuthorEdge {
    const KIND: EdgeKind = EdgeKind::Author;

    fn from_key(&self) -> &str {
        &self.author_hash
    }

    fn to_key(&self) -> &str {
        &self.commit_hash
    }

    fn attributes(&self) -> Option<AttributeMap> {
        let mut map = AttributeMap::new();
        map.insert("timestamp".into(), json_str(&self.timestamp.to_rfc3339()));
        Some(map)
    }
}

impl EdgeRecord for BranchCommitEdge {
    const KIND: EdgeKind = EdgeKind::BranchCommit;

    fn from_key(&self) -> &str {
        &self.branch_hash
    }

    fn to_key(&self) -> &str {
        &self.commit_hash
    }
}

impl EdgeRecord for UpdateFileEdge {
    const KIND: EdgeKind = EdgeKind::UpdateFile;

    fn from_key(&self) -> &str {
        &self.commit_hash
    }

    fn to_key(&self) -> &str {
        &self.file_hash
    }

    fn attributes(&self) -> Option<AttributeMap> {
        Some(self.attributes.clone())
    }
}

impl EdgeRecord for FileMethodEdge {
    const KIND: EdgeKind = EdgeKind::FileMethod;

    fn from_key(&self) -> &str {
        &self.file_hash
    }

    fn to_key(&self) -> &str {
        &self.method_hash
    }
}

impl EdgeRecord for UpdateMethodEdge {
    const KIND: EdgeKind = EdgeKind::UpdateMethod;

    fn from_key(&self) -> &str {
        &self.commit_hash
    }

    fn to_key(&self) -> &str {
        &self.method_hash
    }

    fn attributes(&self) -> Option<AttributeMap> {
        Some(self.attributes.clone())
    }
}

// ── Miner payload ──────────────────────────────────────────────────

/// One mining run's worth of entities and relationships, as produced by an
/// upstream history miner. All collections default to empty so partial
/// payloads (e.g. commits-only re-mining) deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GraphPayload {
    pub developers: Vec<Developer>,
    pub commits: Vec<Commit>,
    pub parents: Vec<ParentEdge>,
    pub authors: Vec<AuthorEdge>,
    pub branches: Vec<Branch>,
    pub branch_commits: Vec<BranchCommitEdge>,
    pub files: Vec<FileEntity>,
    pub update_files: Vec<UpdateFileEdge>,
    pub methods: Vec<Method>,
    pub file_methods: Vec<FileMethodEdge>,
    pub update_methods: Vec<UpdateMethodEdge>,
}

impl GraphPayload {
    /// Total record count across all collections.
    pub fn len(&self) -> usize {
        self.developers.len()
            + self.commits.len()
            + self.parents.len()
            + self.authors.len()
            + self.branches.len()
            + self.branch_commits.len()
            + self.files.len()
            + self.update_files.len()
            + self.methods.len()
            + self.file_methods.len()
            + self.update_methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Store rows ─────────────────────────────────────────────────────

/// A node ready for submission: natural key, optional project scope, and
/// the remaining attributes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub key: String,
    pub project_id: Option<String>,
    pub properties: AttributeMap,
}

/// An edge ready for submission: endpoint natural keys plus the optional
/// creation-time attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub from_key: String,
    pub to_key: String,
    pub attributes: Option<AttributeMap>,
}

/// Outcome of one merge submission.
///
/// `created + matched` can fall short of the submitted row count only for
/// edge merges, where rows referencing absent endpoints are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rows that created a new node/edge.
    pub created: u64,
    /// Rows that matched an existing node/edge and left it untouched.
    pub matched: u64,
}

impl MergeOutcome {
    /// Rows that resolved to a node/edge, new or pre-existing.
    pub fn applied(self) -> u64 {
        self.created + self.matched
    }

    pub fn absorb(&mut self, other: Self) {
        self.created += other.created;
        self.matched += other.matched;
    }
}

/// A node read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub kind: EntityKind,
    pub key: String,
    pub project_id: Option<String>,
    pub properties: AttributeMap,
}

/// An edge read back from the store, endpoints resolved to natural keys.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEdge {
    pub kind: EdgeKind,
    pub from_key: String,
    pub to_key: String,
    pub attributes: AttributeMap,
}

/// Summary statistics about the store.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_nodes: u64,
    pub total_edges: u64,
    pub nodes_by_kind: Vec<(String, u64)>,
    pub edges_by_kind: Vec<(String, u64)>,
    pub db_size_bytes: u64,
}
