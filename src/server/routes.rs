//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, items};
use crate::middleware::logging::log_request;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    // Item CRUD routes
    let item_routes = Router::new()
        .route("/items", post(items::create_item).get(items::list_items))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/:id/exact", get(items::get_item_exact));

    // Combine all routes
    Router::new()
        .merge(item_routes)
        .merge(health_routes)
        // Apply middleware layers (order matters: first added = outermost = runs first)
        .layer(create_cors_layer())
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings
///
/// Every route is open to any origin, matching the upstream consumers
/// (static frontends served from other hosts).
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            // Expose trace ID headers to clients
            "x-trace-id".parse().unwrap(),
            "x-request-id".parse().unwrap(),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeySchema, Settings, StorageBackend};
    use crate::db::InMemoryItemStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_router(key_schema: KeySchema) -> Router {
        let settings = Settings {
            key_schema,
            storage_backend: StorageBackend::Memory,
            ..Settings::default()
        };
        let store = Arc::new(InMemoryItemStore::new(key_schema));
        create_router(AppState::with_store(settings, store))
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let router = test_router(KeySchema::Simple);

        let (status, body) = send(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["version"].is_string());

        let (status, body) = send(&router, "GET", "/liveness", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alive"], true);

        let (status, body) = send(&router, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["checks"]["storage"], true);
    }

    #[tokio::test]
    async fn test_item_lifecycle_simple() {
        let router = test_router(KeySchema::Simple);

        // Create with generated id and fecha
        let (status, created) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"nombre": "Camiseta", "cantidad": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(created["fecha"].as_str().unwrap().contains('T'));

        // Read it back
        let (status, fetched) = send(&router, "GET", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        // Delete is idempotent: 204 then 404
        let (status, _) = send(&router, "DELETE", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, "DELETE", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "GET", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_validation_failures() {
        let router = test_router(KeySchema::Simple);

        // Empty nombre
        let (status, body) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"nombre": "", "cantidad": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "error");

        // Missing cantidad
        let (status, _) = send(&router, "POST", "/items", Some(json!({"nombre": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Negative cantidad never deserializes
        let (status, _) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"nombre": "x", "cantidad": -5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Nothing was stored along the way
        let (_, items) = send(&router, "GET", "/items", None).await;
        assert_eq!(items.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_items() {
        let router = test_router(KeySchema::Simple);

        for nombre in ["uno", "dos"] {
            let (status, _) = send(
                &router,
                "POST",
                "/items",
                Some(json!({"nombre": nombre, "cantidad": 1})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, items) = send(&router, "GET", "/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_simple() {
        let router = test_router(KeySchema::Simple);

        let (_, created) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"id": "p1", "nombre": "Camiseta", "cantidad": 10})),
        )
        .await;

        // Patch one field; id in the payload is ignored
        let (status, updated) = send(
            &router,
            "PUT",
            "/items/p1",
            Some(json!({"id": "hijacked", "cantidad": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], "p1");
        assert_eq!(updated["cantidad"], 3);
        assert_eq!(updated["nombre"], "Camiseta");
        assert_eq!(updated["fecha"], created["fecha"]);

        // Empty patch reads the record back unchanged
        let (status, unchanged) = send(&router, "PUT", "/items/p1", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unchanged, updated);

        // Absent key
        let (status, _) = send(
            &router,
            "PUT",
            "/items/ghost",
            Some(json!({"cantidad": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_simple_schema_rejects_categoria() {
        let router = test_router(KeySchema::Simple);

        let (status, _) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"nombre": "x", "cantidad": 1, "categoria": "ropa"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, "GET", "/items/p1/exact?categoria=ropa", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_composite_partition_flow() {
        let router = test_router(KeySchema::Composite);

        // categoria is mandatory at create time
        let (status, _) = send(
            &router,
            "POST",
            "/items",
            Some(json!({"id": "p1", "nombre": "uno", "cantidad": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for (categoria, nombre) in [("a", "uno"), ("b", "dos")] {
            let (status, _) = send(
                &router,
                "POST",
                "/items",
                Some(json!({
                    "id": "p1",
                    "categoria": categoria,
                    "nombre": nombre,
                    "cantidad": 1
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        // Partition lookup answers with the whole array
        let (status, matches) = send(&router, "GET", "/items/p1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(matches.as_array().unwrap().len(), 2);

        // Unknown partition is an empty array, not a 404
        let (status, matches) = send(&router, "GET", "/items/nope", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(matches.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_composite_exact_lookup() {
        let router = test_router(KeySchema::Composite);

        send(
            &router,
            "POST",
            "/items",
            Some(json!({"id": "p1", "categoria": "a", "nombre": "uno", "cantidad": 1})),
        )
        .await;

        let (status, item) = send(&router, "GET", "/items/p1/exact?categoria=a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["categoria"], "a");

        let (status, _) = send(&router, "GET", "/items/p1/exact?categoria=z", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Missing categoria parameter
        let (status, body) = send(&router, "GET", "/items/p1/exact", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_composite_ambiguous_write_requires_categoria() {
        let router = test_router(KeySchema::Composite);

        for categoria in ["a", "b"] {
            send(
                &router,
                "POST",
                "/items",
                Some(json!({
                    "id": "p1",
                    "categoria": categoria,
                    "nombre": "x",
                    "cantidad": 1
                })),
            )
            .await;
        }

        // Two records share the partition: the write must name the sort key
        let (status, body) = send(
            &router,
            "PUT",
            "/items/p1",
            Some(json!({"cantidad": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "ambiguous_key_error");

        let (status, _) = send(&router, "DELETE", "/items/p1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Disambiguated, the update lands on one record only
        let (status, updated) = send(
            &router,
            "PUT",
            "/items/p1?categoria=a",
            Some(json!({"cantidad": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["cantidad"], 9);

        let (_, other) = send(&router, "GET", "/items/p1/exact?categoria=b", None).await;
        assert_eq!(other["cantidad"], 1);

        let (status, _) = send(&router, "DELETE", "/items/p1?categoria=a", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // One record left, so the partial key resolves on its own now
        let (status, _) = send(&router, "DELETE", "/items/p1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let router = test_router(KeySchema::Simple);

        let (status, body) = send(&router, "GET", "/items/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "not_found_error");
        assert!(body["error"]["message"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_trace_id_echoed_on_response() {
        let router = test_router(KeySchema::Simple);

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .header("x-trace-id", "trace-42")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get("x-trace-id").unwrap(),
            "trace-42"
        );
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "trace-42"
        );
    }
}
