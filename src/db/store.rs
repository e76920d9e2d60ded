//! Storage abstraction for items
//!
//! The HTTP layer talks to this trait only, so the DynamoDB backend can be
//! swapped for the in-memory one in tests and credential-free local runs.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{Item, ItemDraft, ItemKey, ItemPatch};

/// Errors surfaced by a store backend.
///
/// Expected absence is never an error: lookups return `Option`, delete
/// returns `bool`. These variants cover the cases that cannot be expressed
/// in-band.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A partial key (id without categoria) matched more than one record.
    #[error("id '{id}' matches {matches} items; categoria is required to disambiguate")]
    Ambiguous { id: String, matches: usize },

    /// A stored record is missing or mistypes a required attribute.
    #[error("malformed stored item: {0}")]
    Serialization(String),

    /// Any backend failure other than a failed existence condition.
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD operations over the items table.
///
/// Every method is a single atomic request against the backend; the
/// `attribute_exists` conditions on update/delete are the only concurrency
/// guard. One key schema (simple or composite) applies per store instance.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Probe the backing medium; `false` marks the service unready.
    async fn health_check(&self) -> bool {
        true
    }

    /// Store a new item, filling `id` and `fecha` when the draft omits them.
    ///
    /// The write is unconditional: a colliding `id` is overwritten
    /// (last-write-wins). Returns the item as stored.
    async fn create(&self, draft: ItemDraft) -> StoreResult<Item>;

    /// Point lookup by full primary key.
    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Item>>;

    /// All items sharing a partition key.
    ///
    /// Composite schema: a partition query returning 0..N records. Simple
    /// schema: the point lookup wrapped as 0..1, so callers have a single
    /// list-shaped entry point.
    async fn query_by_id(&self, id: &str) -> StoreResult<Vec<Item>>;

    /// Every item in the table. Unordered, unpaginated full scan.
    async fn list_all(&self) -> StoreResult<Vec<Item>>;

    /// Partial update of the non-key fields of an existing item.
    ///
    /// Returns the post-update record, or `None` when no item exists under
    /// the key. An empty patch degenerates to a plain read. With the
    /// composite schema and no `categoria`, the partition is resolved
    /// first: a sole match is used, more than one is `Ambiguous`.
    async fn update(
        &self,
        id: &str,
        categoria: Option<&str>,
        patch: &ItemPatch,
    ) -> StoreResult<Option<Item>>;

    /// Delete an item if it exists.
    ///
    /// Returns `true` when a record was removed and `false` when nothing
    /// was stored under the key; deleting twice is not an error. Resolves
    /// partial composite keys like [`ItemStore::update`].
    async fn delete(&self, id: &str, categoria: Option<&str>) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_display() {
        let err = StoreError::Ambiguous {
            id: "p1".to_string(),
            matches: 3,
        };
        assert_eq!(
            err.to_string(),
            "id 'p1' matches 3 items; categoria is required to disambiguate"
        );
    }

    #[test]
    fn test_backend_display() {
        let err = StoreError::Backend("scan failed: throttled".to_string());
        assert_eq!(err.to_string(), "storage backend error: scan failed: throttled");
    }

    #[test]
    fn test_serialization_display() {
        let err = StoreError::Serialization("missing attribute 'nombre'".to_string());
        assert_eq!(err.to_string(), "malformed stored item: missing attribute 'nombre'");
    }
}
