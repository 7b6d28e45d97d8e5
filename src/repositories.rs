use crate::{
    domain::{MemeRepository, RANDOM_INDEX_FIELD},
    errors::RepoError,
    models::{CaptionLine, MemeRecord},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{AttributeValue, Select},
    Client as DynamoDbClient,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{self, info};

/// Global secondary index keyed on the random index attribute.
pub const RANDOM_INDEX_GSI: &str = "random_index-index";

// Item attribute names
pub(crate) const ATTR_ID: &str = "meme_id";
const ATTR_TEMPLATE_ID: &str = "template_id";
const ATTR_CAPTIONS: &str = "captions";
const ATTR_CAPTION_TEXT: &str = "text";
const ATTR_INVITATION: &str = "invitation";
const ATTR_CREATED_AT: &str = "created_at";

#[derive(Debug, Clone)]
pub struct DynamoDbMemeRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoDbMemeRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoDbMemeRepository");
        Self { client, table_name }
    }

    fn parse_item(&self, item: &HashMap<String, AttributeValue>) -> Result<MemeRecord, RepoError> {
        item_to_meme(item).ok_or_else(|| {
            let item_id = item.get(ATTR_ID).and_then(|v| v.as_s().ok());
            tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item into MemeRecord");
            RepoError::DataCorruption(format!(
                "Failed to parse meme {:?} from DynamoDB table '{}'",
                item_id, self.table_name
            ))
        })
    }
}

#[async_trait]
impl MemeRepository for DynamoDbMemeRepository {
    /// Counts items with a paginated `Select::Count` scan.
    async fn count(&self) -> Result<u64, RepoError> {
        let mut total: u64 = 0;
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request_builder = self
                .client
                .scan()
                .table_name(&self.table_name)
                .select(Select::Count);

            if let Some(lek) = last_evaluated_key {
                request_builder = request_builder.set_exclusive_start_key(Some(lek));
            }

            let resp = request_builder
                .send()
                .await
                .context(format!("DynamoDB: Failed to count items in table '{}'", self.table_name))
                .map_err(RepoError::BackendError)?;

            total += u64::try_from(resp.count).unwrap_or_default();

            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
            tracing::debug!("DynamoDB Count (table: {}): Continuing with LastEvaluatedKey...", self.table_name);
        }

        tracing::debug!(table_name = %self.table_name, total, "DynamoDB: Counted memes");
        Ok(total)
    }

    /// Queries the random index GSI. Only the random index attribute is
    /// indexed, so any other field is refused without calling DynamoDB.
    async fn query_by_field(
        &self,
        field: &str,
        value: u64,
        limit: usize,
    ) -> Result<Vec<MemeRecord>, RepoError> {
        if field != RANDOM_INDEX_FIELD {
            return Err(RepoError::BackendError(anyhow::anyhow!(
                "DynamoDB (table: {}): no index for field '{}'",
                self.table_name,
                field
            )));
        }

        let page_limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let resp = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(RANDOM_INDEX_GSI)
            .key_condition_expression("#field = :value")
            .expression_attribute_names("#field", field)
            .expression_attribute_values(":value", AttributeValue::N(value.to_string()))
            .limit(page_limit)
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to query {} = {}",
                self.table_name, field, value
            ))
            .map_err(RepoError::BackendError)?;

        let items = resp.items.unwrap_or_default();
        tracing::debug!(table_name = %self.table_name, field, value, matches = items.len(), "DynamoDB: Queried memes");
        items
            .iter()
            .take(limit)
            .map(|item| self.parse_item(item))
            .collect()
    }

    /// Retrieves a record using GetItem.
    async fn get_by_id(&self, id: &str) -> Result<Option<MemeRecord>, RepoError> {
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ATTR_ID, AttributeValue::S(id.to_string()))
            .send()
            .await
            .context(format!("DynamoDB (table: {}): Failed to get meme (id: {})", self.table_name, id))
            .map_err(RepoError::BackendError)?;

        match resp.item {
            Some(item) => self.parse_item(&item).map(Some),
            None => Ok(None), // Item not found is not an error
        }
    }
}

// Converts a DynamoDB item map into a MemeRecord. None if any attribute is
// missing or has the wrong type.
fn item_to_meme(item: &HashMap<String, AttributeValue>) -> Option<MemeRecord> {
    let id = item.get(ATTR_ID)?.as_s().ok()?.to_string();
    let template_id = item.get(ATTR_TEMPLATE_ID)?.as_s().ok()?.to_string();
    let captions = item
        .get(ATTR_CAPTIONS)?
        .as_l()
        .ok()?
        .iter()
        .map(|caption| {
            let text = caption.as_m().ok()?.get(ATTR_CAPTION_TEXT)?.as_s().ok()?;
            Some(CaptionLine::new(text.as_str()))
        })
        .collect::<Option<Vec<_>>>()?;
    let invitation_text = item.get(ATTR_INVITATION)?.as_s().ok()?.to_string();
    let random_index = item.get(RANDOM_INDEX_FIELD)?.as_n().ok()?.parse::<u64>().ok()?;
    let created_at = DateTime::parse_from_rfc3339(item.get(ATTR_CREATED_AT)?.as_s().ok()?)
        .ok()?
        .with_timezone(&Utc);

    Some(MemeRecord {
        id,
        template_id,
        captions,
        invitation_text,
        random_index,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(text: &str) -> AttributeValue {
        AttributeValue::M(HashMap::from([(
            ATTR_CAPTION_TEXT.to_string(),
            AttributeValue::S(text.to_string()),
        )]))
    }

    fn item() -> HashMap<String, AttributeValue> {
        HashMap::from([
            (ATTR_ID.to_string(), AttributeValue::S("abc123".into())),
            (ATTR_TEMPLATE_ID.to_string(), AttributeValue::S("181913649".into())),
            (
                ATTR_CAPTIONS.to_string(),
                AttributeValue::L(vec![caption("first"), caption("second"), caption("third")]),
            ),
            (ATTR_INVITATION.to_string(), AttributeValue::S("See you there #meetup".into())),
            (RANDOM_INDEX_FIELD.to_string(), AttributeValue::N("17".into())),
            (ATTR_CREATED_AT.to_string(), AttributeValue::S("2023-03-14T15:09:26Z".into())),
        ])
    }

    #[test]
    fn parses_complete_item_keeping_caption_order() {
        let record = item_to_meme(&item()).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.template_id, "181913649");
        assert_eq!(
            record.caption_texts(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
        assert_eq!(record.random_index, 17);
        assert_eq!(record.created_at.to_rfc3339(), "2023-03-14T15:09:26+00:00");
    }

    #[test]
    fn missing_attribute_fails_to_parse() {
        let mut item = item();
        item.remove(ATTR_INVITATION);
        assert!(item_to_meme(&item).is_none());
    }

    #[test]
    fn malformed_caption_fails_to_parse() {
        let mut item = item();
        item.insert(
            ATTR_CAPTIONS.to_string(),
            AttributeValue::L(vec![caption("ok"), AttributeValue::S("not a map".into())]),
        );
        assert!(item_to_meme(&item).is_none());
    }

    #[test]
    fn empty_caption_list_still_parses() {
        // renderability is decided by the pipeline, not the store
        let mut item = item();
        item.insert(ATTR_CAPTIONS.to_string(), AttributeValue::L(Vec::new()));
        assert!(item_to_meme(&item).unwrap().captions.is_empty());
    }

    fn offline_repository() -> DynamoDbMemeRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("ca-central-1"))
            .endpoint_url("http://127.0.0.1:9")
            .build();
        DynamoDbMemeRepository::new(DynamoDbClient::from_conf(config), "memes".to_string())
    }

    #[tokio::test]
    async fn query_by_unindexed_field_is_refused() {
        let err = offline_repository()
            .query_by_field(ATTR_TEMPLATE_ID, 1, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::BackendError(_)));
        assert!(err.to_string().contains("no index for field 'template_id'"));
    }

    #[test]
    fn negative_random_index_fails_to_parse() {
        let mut item = item();
        item.insert(RANDOM_INDEX_FIELD.to_string(), AttributeValue::N("-1".into()));
        assert!(item_to_meme(&item).is_none());
    }
}
