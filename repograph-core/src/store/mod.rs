//! The property-graph store: an abstract merge-by-key write protocol and
//! its SQLite-backed implementation.

pub mod schema;
pub mod sqlite;
mod traits;

pub use traits::GraphStore;
