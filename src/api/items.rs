//! Item CRUD endpoints
//!
//! Thin HTTP glue over the item store. All key-shape discipline lives in
//! the store; these handlers validate payloads, translate the in-band
//! absent/false outcomes to 404, and map everything else through
//! [`ApiError`].

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::config::KeySchema;
use crate::db::{Item, ItemDraft, ItemKey, ItemPatch};
use crate::error::ApiError;
use crate::server::state::AppState;

/// Query parameters naming the sort key of a composite table.
#[derive(Debug, Default, Deserialize)]
pub struct CategoriaQuery {
    pub categoria: Option<String>,
}

impl CategoriaQuery {
    /// The categoria, with a blank value counting as unset.
    fn normalized(&self) -> Option<&str> {
        self.categoria.as_deref().filter(|c| !c.is_empty())
    }
}

/// POST /items - Create an item
///
/// Returns 201 with the stored record, including any generated `id` and
/// `fecha`.
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(draft) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    draft
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    check_categoria(state.settings.key_schema, draft.categoria.as_deref())?;

    let item = state.store.create(draft).await?;

    tracing::info!(id = %item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items - List all items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.store.list_all().await?;
    tracing::debug!(count = items.len(), "Listed items");
    Ok(Json(items))
}

/// GET /items/{id} - Look up by partition key
///
/// With the simple schema the id names one record: 200 with the object or
/// 404. With the composite schema the id names a partition: 200 with the
/// array of matches, empty included.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.settings.key_schema {
        KeySchema::Simple => {
            let item = state
                .store
                .get(&ItemKey::simple(&id))
                .await?
                .ok_or_else(|| ApiError::item_not_found(&id))?;
            Ok(Json(item).into_response())
        }
        KeySchema::Composite => {
            let items = state.store.query_by_id(&id).await?;
            Ok(Json(items).into_response())
        }
    }
}

/// GET /items/{id}/exact?categoria= - Full-key lookup
///
/// Composite schema only; the categoria query parameter is mandatory.
pub async fn get_item_exact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CategoriaQuery>,
) -> Result<Json<Item>, ApiError> {
    if state.settings.key_schema != KeySchema::Composite {
        return Err(ApiError::Validation(
            "exact lookup requires a composite key table".to_string(),
        ));
    }
    let Some(categoria) = query.normalized() else {
        return Err(ApiError::Validation(
            "categoria query parameter is required".to_string(),
        ));
    };

    let item = state
        .store
        .get(&ItemKey::composite(&id, categoria))
        .await?
        .ok_or_else(|| ApiError::item_not_found(&id))?;
    Ok(Json(item))
}

/// PUT /items/{id}[?categoria=] - Partial update
///
/// Key fields in the payload are ignored; 200 with the post-update record,
/// 404 when absent, 400 when the partial key is ambiguous.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CategoriaQuery>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(patch) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    patch
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let item = state
        .store
        .update(&id, query.normalized(), &patch)
        .await?
        .ok_or_else(|| ApiError::item_not_found(&id))?;

    tracing::info!(id = %id, "Item updated");
    Ok(Json(item))
}

/// DELETE /items/{id}[?categoria=] - Delete an item
///
/// 204 on deletion, 404 when nothing was stored under the key.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CategoriaQuery>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete(&id, query.normalized()).await?;
    if deleted {
        tracing::info!(id = %id, "Item deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::item_not_found(&id))
    }
}

/// The create payload must carry a categoria exactly when the table has a
/// sort key. Blank values count as absent.
fn check_categoria(schema: KeySchema, categoria: Option<&str>) -> Result<(), ApiError> {
    let present = categoria.is_some_and(|c| !c.is_empty());
    match schema {
        KeySchema::Composite if !present => Err(ApiError::Validation(
            "categoria is required with a composite key table".to_string(),
        )),
        KeySchema::Simple if present => Err(ApiError::Validation(
            "categoria is not accepted with a simple key table".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_categoria_simple() {
        assert!(check_categoria(KeySchema::Simple, None).is_ok());
        assert!(check_categoria(KeySchema::Simple, Some("")).is_ok());
        assert!(check_categoria(KeySchema::Simple, Some("ropa")).is_err());
    }

    #[test]
    fn test_check_categoria_composite() {
        assert!(check_categoria(KeySchema::Composite, Some("ropa")).is_ok());
        assert!(check_categoria(KeySchema::Composite, None).is_err());
        assert!(check_categoria(KeySchema::Composite, Some("")).is_err());
    }

    #[test]
    fn test_categoria_query_normalization() {
        let query = CategoriaQuery {
            categoria: Some(String::new()),
        };
        assert_eq!(query.normalized(), None);

        let query = CategoriaQuery {
            categoria: Some("ropa".to_string()),
        };
        assert_eq!(query.normalized(), Some("ropa"));
    }
}
