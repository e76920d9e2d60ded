//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::{create_dynamodb_client, Settings, StorageBackend};
use crate::db::{DynamoItemStore, InMemoryItemStore, ItemStore};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// This struct holds all the shared resources that handlers need access to.
/// It is designed to be cheaply cloneable (via Arc) and thread-safe.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Item store backing every CRUD endpoint
    pub store: Arc<dyn ItemStore>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// Builds the store selected by `storage_backend`; the DynamoDB client
    /// is constructed once here and shared for the process lifetime.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let start_time = Instant::now();

        let store: Arc<dyn ItemStore> = match settings.storage_backend {
            StorageBackend::Dynamodb => {
                tracing::debug!(
                    region = %settings.aws_region,
                    endpoint = ?settings.dynamodb_endpoint_url,
                    table = %settings.table_name,
                    key_schema = %settings.key_schema,
                    "Creating DynamoDB client"
                );
                let client = create_dynamodb_client(&settings).await;
                Arc::new(DynamoItemStore::new(
                    client,
                    settings.table_name.clone(),
                    settings.key_schema,
                ))
            }
            StorageBackend::Memory => {
                tracing::info!("Using in-memory storage backend");
                Arc::new(InMemoryItemStore::new(settings.key_schema))
            }
        };

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            settings,
            store,
            start_time,
        })
    }

    /// Build a state over a caller-supplied store.
    ///
    /// Used by tests to drive the router against an in-memory store.
    pub fn with_store(settings: Settings, store: Arc<dyn ItemStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
