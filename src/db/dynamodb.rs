//! DynamoDB-backed item store
//!
//! Data access layer for the items table. All key-shape discipline lives
//! here: point lookups use the full primary key, partial composite keys are
//! resolved through a partition query, and update/delete are conditional on
//! the record existing.

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

use crate::config::KeySchema;
use crate::db::models::{Item, ItemDraft, ItemKey, ItemPatch};
use crate::db::store::{ItemStore, StoreError, StoreResult};

/// Item store backed by a single DynamoDB table.
///
/// The SDK client, table name, and key schema are injected at construction
/// and shared for the process lifetime.
#[derive(Clone)]
pub struct DynamoItemStore {
    client: Client,
    table_name: String,
    key_schema: KeySchema,
}

impl DynamoItemStore {
    pub fn new(client: Client, table_name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            key_schema,
        }
    }

    /// Resolve an id plus optional categoria to a full primary key.
    ///
    /// Simple schema: the id is the whole key. Composite schema without a
    /// categoria: query the partition and accept a sole match; zero matches
    /// mean the record is absent, several mean the caller must disambiguate.
    async fn resolve_key(
        &self,
        id: &str,
        categoria: Option<&str>,
    ) -> StoreResult<Option<ItemKey>> {
        match self.key_schema {
            KeySchema::Simple => Ok(Some(ItemKey::simple(id))),
            KeySchema::Composite => match categoria {
                Some(categoria) => Ok(Some(ItemKey::composite(id, categoria))),
                None => {
                    let mut matches = self.query_by_id(id).await?;
                    match matches.len() {
                        0 => Ok(None),
                        1 => Ok(Some(matches.remove(0).key())),
                        n => {
                            tracing::warn!(id = %id, matches = n, "partial key is ambiguous");
                            Err(StoreError::Ambiguous {
                                id: id.to_string(),
                                matches: n,
                            })
                        }
                    }
                }
            },
        }
    }
}

#[async_trait]
impl ItemStore for DynamoItemStore {
    /// Check that the backing table is reachable and active.
    async fn health_check(&self) -> bool {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => {
                tracing::debug!(table = %self.table_name, "DynamoDB health check passed");
                true
            }
            Err(e) => {
                tracing::warn!(table = %self.table_name, error = %e, "DynamoDB health check failed");
                false
            }
        }
    }

    async fn create(&self, draft: ItemDraft) -> StoreResult<Item> {
        let item = draft.into_item();

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item.to_dynamodb()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to put item: {e}")))?;

        tracing::debug!(table = %self.table_name, id = %item.id, "item stored");
        Ok(item)
    }

    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_dynamodb()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to get item: {e}")))?;

        let Some(attrs) = result.item else {
            return Ok(None);
        };

        let item = Item::from_dynamodb(&attrs).ok_or_else(|| malformed(key.to_string()))?;
        Ok(Some(item))
    }

    async fn query_by_id(&self, id: &str) -> StoreResult<Vec<Item>> {
        match self.key_schema {
            // One possible record per id, returned as a 0..1 list.
            KeySchema::Simple => {
                Ok(self.get(&ItemKey::simple(id)).await?.into_iter().collect())
            }
            KeySchema::Composite => {
                let result = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .key_condition_expression("id = :id")
                    .expression_attribute_values(":id", AttributeValue::S(id.to_string()))
                    .send()
                    .await
                    .map_err(|e| StoreError::Backend(format!("failed to query items: {e}")))?;

                result
                    .items
                    .unwrap_or_default()
                    .iter()
                    .map(|attrs| {
                        Item::from_dynamodb(attrs).ok_or_else(|| malformed(id.to_string()))
                    })
                    .collect()
            }
        }
    }

    async fn list_all(&self) -> StoreResult<Vec<Item>> {
        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to scan table: {e}")))?;

        result
            .items
            .unwrap_or_default()
            .iter()
            .map(|attrs| {
                Item::from_dynamodb(attrs)
                    .ok_or_else(|| malformed(format!("in table {}", self.table_name)))
            })
            .collect()
    }

    async fn update(
        &self,
        id: &str,
        categoria: Option<&str>,
        patch: &ItemPatch,
    ) -> StoreResult<Option<Item>> {
        let Some(key) = self.resolve_key(id, categoria).await? else {
            return Ok(None);
        };

        // Nothing to write: degenerate to a plain read.
        let Some((expression, values)) = build_update_expression(patch) else {
            return self.get(&key).await;
        };

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_dynamodb()))
            .update_expression(&expression)
            .set_expression_attribute_values(Some(values))
            .condition_expression("attribute_exists(id)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                tracing::debug!(table = %self.table_name, key = %key, "item updated");
                let Some(attrs) = output.attributes else {
                    return Ok(None);
                };
                let item = Item::from_dynamodb(&attrs).ok_or_else(|| malformed(key.to_string()))?;
                Ok(Some(item))
            }
            Err(e) => match e.into_service_error() {
                // Existence condition failed: the record is absent, not broken.
                UpdateItemError::ConditionalCheckFailedException(_) => {
                    tracing::debug!(table = %self.table_name, key = %key, "update skipped, item absent");
                    Ok(None)
                }
                other => Err(StoreError::Backend(format!("failed to update item: {other}"))),
            },
        }
    }

    async fn delete(&self, id: &str, categoria: Option<&str>) -> StoreResult<bool> {
        let Some(key) = self.resolve_key(id, categoria).await? else {
            return Ok(false);
        };

        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_dynamodb()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(table = %self.table_name, key = %key, "item deleted");
                Ok(true)
            }
            Err(e) => match e.into_service_error() {
                DeleteItemError::ConditionalCheckFailedException(_) => {
                    tracing::debug!(table = %self.table_name, key = %key, "delete skipped, item absent");
                    Ok(false)
                }
                other => Err(StoreError::Backend(format!("failed to delete item: {other}"))),
            },
        }
    }
}

/// Build a `SET` update expression from the present non-key patch fields.
///
/// Each field becomes a `name = :name` clause with a matching placeholder
/// value. Returns `None` for an empty patch.
fn build_update_expression(
    patch: &ItemPatch,
) -> Option<(String, HashMap<String, AttributeValue>)> {
    let fields = patch.set_fields();
    if fields.is_empty() {
        return None;
    }

    let clauses: Vec<String> = fields
        .iter()
        .map(|(name, _)| format!("{name} = :{name}"))
        .collect();
    let expression = format!("SET {}", clauses.join(", "));

    let values = fields
        .into_iter()
        .map(|(name, value)| (format!(":{name}"), value))
        .collect();

    Some((expression, values))
}

fn malformed(context: String) -> StoreError {
    StoreError::Serialization(format!(
        "item {context} has missing or mistyped attributes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_update_expression_full_patch() {
        let patch = ItemPatch {
            nombre: Some("Gorra".to_string()),
            fecha: Some("2025-11-03T12:34:56+00:00".to_string()),
            cantidad: Some(7),
            ..Default::default()
        };

        let (expression, values) = build_update_expression(&patch).expect("non-empty patch");
        assert_eq!(expression, "SET nombre = :nombre, fecha = :fecha, cantidad = :cantidad");
        assert_eq!(values.len(), 3);
        assert_eq!(
            values.get(":nombre"),
            Some(&AttributeValue::S("Gorra".to_string()))
        );
        assert_eq!(
            values.get(":cantidad"),
            Some(&AttributeValue::N("7".to_string()))
        );
    }

    #[test]
    fn test_build_update_expression_partial_patch() {
        let patch = ItemPatch {
            cantidad: Some(0),
            ..Default::default()
        };

        let (expression, values) = build_update_expression(&patch).expect("non-empty patch");
        assert_eq!(expression, "SET cantidad = :cantidad");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_build_update_expression_ignores_key_fields() {
        let patch = ItemPatch {
            id: Some("other".to_string()),
            categoria: Some("ropa".to_string()),
            nombre: Some("Gorra".to_string()),
            ..Default::default()
        };

        let (expression, values) = build_update_expression(&patch).expect("non-empty patch");
        assert_eq!(expression, "SET nombre = :nombre");
        assert!(!values.contains_key(":id"));
        assert!(!values.contains_key(":categoria"));
    }

    #[test]
    fn test_build_update_expression_empty_patch() {
        let patch = ItemPatch {
            id: Some("only-keys".to_string()),
            ..Default::default()
        };
        assert!(build_update_expression(&patch).is_none());
    }
}
