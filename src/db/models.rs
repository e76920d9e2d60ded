//! Item data model
//!
//! This module defines the persisted item entity and the request-side
//! shapes (draft and patch) together with their DynamoDB conversions.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// A stored item.
///
/// `id` is the partition key. `categoria` is the sort key and is present
/// only when the table uses the composite key shape; with the simple key
/// shape it is always `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Partition key
    pub id: String,

    /// Sort key (composite key shape only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,

    /// Display name, never empty
    pub nombre: String,

    /// ISO 8601 creation timestamp
    pub fecha: String,

    /// Non-negative quantity
    pub cantidad: u32,
}

impl Item {
    /// The full primary key of this item.
    pub fn key(&self) -> ItemKey {
        ItemKey {
            id: self.id.clone(),
            categoria: self.categoria.clone(),
        }
    }

    /// Convert to a DynamoDB item map.
    pub fn to_dynamodb(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S(self.id.clone()));
        if let Some(ref categoria) = self.categoria {
            item.insert("categoria".to_string(), AttributeValue::S(categoria.clone()));
        }
        item.insert("nombre".to_string(), AttributeValue::S(self.nombre.clone()));
        item.insert("fecha".to_string(), AttributeValue::S(self.fecha.clone()));
        item.insert("cantidad".to_string(), AttributeValue::N(self.cantidad.to_string()));
        item
    }

    /// Parse from a DynamoDB item map.
    ///
    /// Returns `None` when a required attribute is missing or mistyped.
    pub fn from_dynamodb(item: &HashMap<String, AttributeValue>) -> Option<Self> {
        Some(Self {
            id: get_string(item, "id")?,
            categoria: get_string(item, "categoria"),
            nombre: get_string(item, "nombre")?,
            fecha: get_string(item, "fecha").unwrap_or_default(),
            cantidad: get_number(item, "cantidad")?,
        })
    }
}

/// Full primary key of an item.
///
/// `categoria` is `Some` exactly when the table uses the composite shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub id: String,
    pub categoria: Option<String>,
}

impl ItemKey {
    /// Key for a simple (partition-key-only) table.
    pub fn simple(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            categoria: None,
        }
    }

    /// Key for a composite (partition + sort key) table.
    pub fn composite(id: impl Into<String>, categoria: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            categoria: Some(categoria.into()),
        }
    }

    /// Convert to a DynamoDB key map.
    pub fn to_dynamodb(&self) -> HashMap<String, AttributeValue> {
        let mut key = HashMap::new();
        key.insert("id".to_string(), AttributeValue::S(self.id.clone()));
        if let Some(ref categoria) = self.categoria {
            key.insert("categoria".to_string(), AttributeValue::S(categoria.clone()));
        }
        key
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.categoria {
            Some(ref categoria) => write!(f, "{}/{}", self.id, categoria),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Create payload for an item.
///
/// `id` and `fecha` are filled in at creation time when absent (or empty,
/// matching the permissive handling of blank inputs upstream).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ItemDraft {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub categoria: Option<String>,

    #[validate(length(min = 1, message = "nombre must not be empty"))]
    pub nombre: String,

    #[serde(default)]
    pub fecha: Option<String>,

    pub cantidad: u32,
}

impl ItemDraft {
    /// Materialize the draft into a storable item, generating `id` (UUID v4)
    /// and `fecha` (current UTC time) when the draft omits them.
    pub fn into_item(self) -> Item {
        Item {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            categoria: self.categoria.filter(|categoria| !categoria.is_empty()),
            nombre: self.nombre,
            fecha: self
                .fecha
                .filter(|fecha| !fecha.is_empty())
                .unwrap_or_else(now_iso8601),
            cantidad: self.cantidad,
        }
    }
}

/// Partial-update payload for an item.
///
/// Key attributes may appear in the payload (clients routinely echo the
/// whole record back) but are never part of the mutation: `set_fields` and
/// `apply` only expose the non-key fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ItemPatch {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub categoria: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "nombre must not be empty"))]
    pub nombre: Option<String>,

    #[serde(default)]
    pub fecha: Option<String>,

    #[serde(default)]
    pub cantidad: Option<u32>,
}

impl ItemPatch {
    /// True when no non-key field is present, i.e. there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.fecha.is_none() && self.cantidad.is_none()
    }

    /// The present non-key fields as attribute-name/value pairs, in the
    /// order they are applied to the update expression.
    pub fn set_fields(&self) -> Vec<(&'static str, AttributeValue)> {
        let mut fields = Vec::new();
        if let Some(ref nombre) = self.nombre {
            fields.push(("nombre", AttributeValue::S(nombre.clone())));
        }
        if let Some(ref fecha) = self.fecha {
            fields.push(("fecha", AttributeValue::S(fecha.clone())));
        }
        if let Some(cantidad) = self.cantidad {
            fields.push(("cantidad", AttributeValue::N(cantidad.to_string())));
        }
        fields
    }

    /// Apply the present non-key fields to an item in place.
    pub fn apply(&self, item: &mut Item) {
        if let Some(ref nombre) = self.nombre {
            item.nombre = nombre.clone();
        }
        if let Some(ref fecha) = self.fecha {
            item.fecha = fecha.clone();
        }
        if let Some(cantidad) = self.cantidad {
            item.cantidad = cantidad;
        }
    }
}

/// Current UTC time as an ISO 8601 string.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

// Helper functions for parsing DynamoDB AttributeValues

fn get_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn get_number(item: &HashMap<String, AttributeValue>, key: &str) -> Option<u32> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}
