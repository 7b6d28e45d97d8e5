use crate::{domain::RANDOM_INDEX_FIELD, errors::AppError, repositories::{ATTR_ID, RANDOM_INDEX_GSI}};
use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    types::{
        AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        Projection, ProjectionType, ScalarAttributeType,
    },
    Client as DynamoDbClient,
};
use tracing;

/// Creates the memes table with its random index GSI if it doesn't exist.
///
/// Only meant for local development against LocalStack; in production the
/// table is owned elsewhere.
pub async fn ensure_memes_table(client: &DynamoDbClient, table_name: &str) -> Result<(), AppError> {
    let random_index = GlobalSecondaryIndex::builder()
        .index_name(RANDOM_INDEX_GSI)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(RANDOM_INDEX_FIELD)
                .key_type(KeyType::Hash)
                .build()?,
        )
        .projection(
            Projection::builder()
                .projection_type(ProjectionType::All)
                .build(),
        )
        .build()?;

    let result = client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(ATTR_ID)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(RANDOM_INDEX_FIELD)
                .attribute_type(ScalarAttributeType::N)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(ATTR_ID)
                .key_type(KeyType::Hash)
                .build()?,
        )
        .global_secondary_indexes(random_index)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => {
            tracing::info!("Startup: Table '{}' created successfully or setup initiated.", table_name);
            Ok(())
        }
        Err(e) => {
            if let DynamoSdkError::ServiceError(service_err) = &e {
                if service_err.err().is_resource_in_use_exception() {
                    tracing::info!("Startup: Table '{}' already exists, no action needed.", table_name);
                    Ok(())
                } else {
                    let context = format!("Startup: Service error creating DynamoDB table '{}'", table_name);
                    tracing::error!("{}: {:?}", context, service_err);
                    Err(AppError::InitError(format!("{}: {}", context, e)))
                }
            } else {
                let context = format!("Startup: SDK error creating DynamoDB table '{}'", table_name);
                tracing::error!("{}: {}", context, e);
                Err(AppError::InitError(format!("{}: {}", context, e)))
            }
        }
    }
}
