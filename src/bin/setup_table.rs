//! CLI tool to create the DynamoDB items table
//!
//! Usage:
//!   cargo run --bin setup_table
//!
//! For local development with DynamoDB Local:
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8000 cargo run --bin setup_table

use anyhow::Result;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use clap::Parser;
use items_api::config::KeySchema;

/// Create the DynamoDB items table
#[derive(Parser, Debug)]
#[command(name = "setup_table")]
#[command(about = "Create the DynamoDB items table")]
struct Args {
    /// DynamoDB endpoint URL (for local development)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Table name (overrides TABLE_NAME / DYNAMO_TABLE env vars)
    #[arg(long)]
    table_name: Option<String>,

    /// Key schema: simple (id) or composite (id + categoria)
    #[arg(long, value_enum)]
    key_schema: Option<KeySchema>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Configure AWS SDK
    let mut config_builder = aws_config::from_env();

    // Check for endpoint URL from args or environment
    let endpoint_url = args
        .endpoint_url
        .or_else(|| std::env::var("DYNAMODB_ENDPOINT_URL").ok());

    if let Some(ref url) = endpoint_url {
        config_builder = config_builder.endpoint_url(url);
        println!("Using DynamoDB endpoint: {}", url);
    }

    let aws_config = config_builder.load().await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);

    // Table name and key schema follow the same env vars as the service
    let table_name = args
        .table_name
        .or_else(|| std::env::var("TABLE_NAME").ok().filter(|v| !v.is_empty()))
        .or_else(|| std::env::var("DYNAMO_TABLE").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "items".to_string());

    let key_schema = match args.key_schema {
        Some(schema) => schema,
        None => std::env::var("TABLE_KEY_SCHEMA")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default(),
    };

    println!("\n🚀 Setting up DynamoDB table...\n");

    match create_table(&client, &table_name, key_schema).await {
        Ok(true) => println!("✅ Created table: {} ({} key schema)", table_name, key_schema),
        Ok(false) => println!("⏭️  Table already exists: {}", table_name),
        Err(e) => println!("❌ Failed to create table {}: {}", table_name, e),
    }

    println!("\n✅ Table setup complete!\n");

    Ok(())
}

async fn create_table(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
    key_schema: KeySchema,
) -> Result<bool> {
    // Check if table already exists
    let tables = client.list_tables().send().await?;
    if tables.table_names().contains(&table_name.to_string()) {
        return Ok(false);
    }

    let mut request = client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest);

    if key_schema == KeySchema::Composite {
        request = request
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("categoria")
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name("categoria")
                    .key_type(KeyType::Range)
                    .build()?,
            );
    }

    request.send().await?;

    Ok(true)
}
