//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// Primary-key shape of the items table.
///
/// One shape applies per deployment; every store operation consults it, so
/// a process is internally consistent about how records are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeySchema {
    /// Partition key `id` only
    Simple,
    /// Partition key `id` plus sort key `categoria`
    Composite,
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySchema::Simple => write!(f, "simple"),
            KeySchema::Composite => write!(f, "composite"),
        }
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        KeySchema::Simple
    }
}

impl std::str::FromStr for KeySchema {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(KeySchema::Simple),
            "composite" => Ok(KeySchema::Composite),
            _ => anyhow::bail!("Invalid key schema: {}. Expected: simple or composite", s),
        }
    }
}

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// The real DynamoDB table
    Dynamodb,
    /// Process-local map, for development without credentials
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Dynamodb => write!(f, "dynamodb"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Dynamodb
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(StorageBackend::Dynamodb),
            "memory" => Ok(StorageBackend::Memory),
            _ => anyhow::bail!("Invalid storage backend: {}. Expected: dynamodb or memory", s),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // AWS settings
    pub aws_region: String,
    pub dynamodb_endpoint_url: Option<String>,

    // Items table
    pub table_name: String,
    pub key_schema: KeySchema,
    pub storage_backend: StorageBackend,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "items-api"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8080")
                .parse()
                .context("Invalid PORT value")?,

            // AWS settings
            aws_region: env_or_default("AWS_REGION", "us-east-1"),
            dynamodb_endpoint_url: env::var("DYNAMODB_ENDPOINT_URL").ok(),

            // Items table
            table_name: resolve_table_name(
                env::var("TABLE_NAME").ok(),
                env::var("DYNAMO_TABLE").ok(),
            ),
            key_schema: env_or_default("TABLE_KEY_SCHEMA", "simple")
                .parse()
                .context("Invalid TABLE_KEY_SCHEMA value")?,
            storage_backend: env_or_default("STORAGE_BACKEND", "dynamodb")
                .parse()
                .context("Invalid STORAGE_BACKEND value")?,
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        // Validate port range
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.table_name.is_empty() {
            anyhow::bail!("Table name cannot be empty");
        }

        // Warn when production traffic would land in a process-local map
        if self.environment == Environment::Production
            && self.storage_backend == StorageBackend::Memory
        {
            tracing::warn!("Running in production with the in-memory storage backend!");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "items-api".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            aws_region: "us-east-1".to_string(),
            dynamodb_endpoint_url: None,
            table_name: "items".to_string(),
            key_schema: KeySchema::Simple,
            storage_backend: StorageBackend::Dynamodb,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `TABLE_NAME` wins, `DYNAMO_TABLE` is the legacy fallback; blank values
/// count as unset.
fn resolve_table_name(primary: Option<String>, fallback: Option<String>) -> String {
    primary
        .filter(|name| !name.is_empty())
        .or_else(|| fallback.filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "items".to_string())
}
