//! In-memory item store
//!
//! Mirrors the DynamoDB store's outcome semantics (including the partial
//! composite-key resolution) over a `HashMap` behind an async `RwLock`.
//! Used by the test suite and selectable as a backend for credential-free
//! local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::config::KeySchema;
use crate::db::models::{Item, ItemDraft, ItemKey, ItemPatch};
use crate::db::store::{ItemStore, StoreError, StoreResult};

pub struct InMemoryItemStore {
    key_schema: KeySchema,
    items: RwLock<HashMap<ItemKey, Item>>,
}

impl InMemoryItemStore {
    pub fn new(key_schema: KeySchema) -> Self {
        Self {
            key_schema,
            items: RwLock::new(HashMap::new()),
        }
    }
}

/// Same resolution protocol as the DynamoDB store, over the map keys.
fn resolve_key(
    items: &HashMap<ItemKey, Item>,
    key_schema: KeySchema,
    id: &str,
    categoria: Option<&str>,
) -> StoreResult<Option<ItemKey>> {
    match key_schema {
        KeySchema::Simple => Ok(Some(ItemKey::simple(id))),
        KeySchema::Composite => match categoria {
            Some(categoria) => Ok(Some(ItemKey::composite(id, categoria))),
            None => {
                let mut matches: Vec<ItemKey> =
                    items.keys().filter(|key| key.id == id).cloned().collect();
                match matches.len() {
                    0 | 1 => Ok(matches.pop()),
                    n => Err(StoreError::Ambiguous {
                        id: id.to_string(),
                        matches: n,
                    }),
                }
            }
        },
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn create(&self, draft: ItemDraft) -> StoreResult<Item> {
        let item = draft.into_item();
        let mut items = self.items.write().await;
        items.insert(item.key(), item.clone());
        Ok(item)
    }

    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn query_by_id(&self, id: &str) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items.values().filter(|item| item.id == id).cloned().collect())
    }

    async fn list_all(&self) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items.values().cloned().collect())
    }

    async fn update(
        &self,
        id: &str,
        categoria: Option<&str>,
        patch: &ItemPatch,
    ) -> StoreResult<Option<Item>> {
        let mut items = self.items.write().await;
        let Some(key) = resolve_key(&items, self.key_schema, id, categoria)? else {
            return Ok(None);
        };
        match items.get_mut(&key) {
            Some(item) => {
                patch.apply(item);
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str, categoria: Option<&str>) -> StoreResult<bool> {
        let mut items = self.items.write().await;
        let Some(key) = resolve_key(&items, self.key_schema, id, categoria)? else {
            return Ok(false);
        };
        Ok(items.remove(&key).is_some())
    }
}
