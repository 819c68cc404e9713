use tracing::debug;

use crate::store::GraphStore;
use crate::types::EntityKind;

/// Declare the lookup indices `kind` needs once its bulk load has
/// completed: the natural key always, the project discriminator for kinds
/// that carry one. Endpoint matching and downstream queries would
/// otherwise full-scan the node set. Redeclaring is a no-op.
pub async fn ensure_entity_indices(
    store: &dyn GraphStore,
    kind: EntityKind,
) -> crate::error::Result<()> {
    store.ensure_index(kind, "hash").await?;
    if kind.carries_project_id() {
        store.ensure_index(kind, "project_id").await?;
    }
    debug!(kind = kind.as_str(), "Ensured lookup indices");
    Ok(())
}
