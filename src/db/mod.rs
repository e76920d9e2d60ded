//! Database module
//!
//! Contains the item model, the storage trait, and its DynamoDB and
//! in-memory implementations.

pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod store;

pub use dynamodb::DynamoItemStore;
pub use memory::InMemoryItemStore;
pub use models::{Item, ItemDraft, ItemKey, ItemPatch};
pub use store::{ItemStore, StoreError, StoreResult};
