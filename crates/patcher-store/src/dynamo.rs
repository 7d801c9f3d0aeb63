//! DynamoDB backend for the record store gateway

use crate::cache::{ClientKey, ConnectionCache};
use crate::error::StoreError;
use crate::gateway::{scan_pages, Item, Page, PageSource, RangeQuery, RecordStore, UpdatedAttributes};
use crate::keys;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use patcher_types::{Record, RecordAttribute, StoreConfig, Tenant};
use std::collections::HashMap;
use std::fmt;

/// Process-wide cache of DynamoDB clients
pub type DynamoClientCache = ConnectionCache<Client>;

/// Raw DynamoDB item
type RawItem = HashMap<String, AttributeValue>;

const KEY_CONDITION: &str = "#pk = :pk AND begins_with(#sk, :sk_prefix)";
const PROJECTION: &str = "#code, #name, #lln";
const UPDATE: &str = "SET #attr = :value";
// Only existing rows, and only while the attribute is still unset.
const UPDATE_CONDITION: &str =
    "attribute_exists(#pk) AND (attribute_not_exists(#attr) OR #attr = :empty)";

/// Build a DynamoDB client for a region/profile pair
pub async fn connect(config: &StoreConfig) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if !config.profile.is_empty() {
        loader = loader.profile_name(&config.profile);
    }
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    Client::new(&sdk_config)
}

/// Record store over one DynamoDB table
#[derive(Clone)]
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
}

impl fmt::Debug for DynamoRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoRecordStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoRecordStore {
    /// Create from a pre-built client
    #[inline]
    #[must_use]
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Create using the shared client for the config's region and profile
    pub async fn from_cache(cache: &DynamoClientCache, config: &StoreConfig) -> Self {
        let client = cache
            .get_or_connect(ClientKey::from(config), || connect(config))
            .await;
        Self::new(client, config.table_name.clone())
    }

    /// Table this store reads and writes
    #[inline]
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl PageSource for DynamoRecordStore {
    type Cursor = RawItem;

    async fn fetch_page(
        &self,
        query: &RangeQuery,
        cursor: Option<RawItem>,
    ) -> Result<Page<RawItem>, StoreError> {
        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression(KEY_CONDITION)
            .projection_expression(PROJECTION)
            .expression_attribute_names("#pk", keys::PK)
            .expression_attribute_names("#sk", keys::SK)
            .expression_attribute_names("#code", keys::VENDOR_CODE)
            .expression_attribute_names("#name", keys::NAME)
            .expression_attribute_names("#lln", keys::LOCAL_LEGAL_NAME)
            .expression_attribute_values(":pk", AttributeValue::S(query.partition_key.clone()))
            .expression_attribute_values(
                ":sk_prefix",
                AttributeValue::S(query.sort_key_prefix.clone()),
            )
            .set_exclusive_start_key(cursor)
            .send()
            .await
            .map_err(|err| StoreError::Query {
                partition_key: query.partition_key.clone(),
                retryable: is_transient(&err),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        let items = response
            .items()
            .iter()
            .map(to_item)
            .collect::<Result<Vec<_>, _>>()?;
        let next = response
            .last_evaluated_key()
            .filter(|key| !key.is_empty())
            .cloned();

        Ok(Page { items, next })
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn scan_all(&self, tenant: &Tenant) -> Result<Vec<Record>, StoreError> {
        scan_pages(self, &RangeQuery::vendors(tenant)).await
    }

    async fn conditional_update(
        &self,
        tenant: &Tenant,
        code: &str,
        attribute: RecordAttribute,
        value: &str,
    ) -> Result<UpdatedAttributes, StoreError> {
        let sort_key = keys::vendor_sk(tenant.id(), code);

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(keys::PK, AttributeValue::S(keys::vendor_pk(tenant.id())))
            .key(keys::SK, AttributeValue::S(sort_key.clone()))
            .update_expression(UPDATE)
            .condition_expression(UPDATE_CONDITION)
            .expression_attribute_names("#pk", keys::PK)
            .expression_attribute_names("#attr", attribute.as_str())
            .expression_attribute_values(":value", AttributeValue::S(value.to_string()))
            .expression_attribute_values(":empty", AttributeValue::S(String::new()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|err| {
                if is_conditional_check_failed(&err) {
                    StoreError::ConditionFailed {
                        key: sort_key.clone(),
                    }
                } else {
                    StoreError::Write {
                        key: sort_key.clone(),
                        retryable: is_transient(&err),
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            })?;

        let updated = output.attributes().map(to_item).transpose()?.unwrap_or_default();
        if updated.is_empty() {
            return Err(StoreError::EmptyResult { key: sort_key });
        }

        tracing::debug!(key = %sort_key, attributes = ?updated, "updated vendor attributes");
        Ok(UpdatedAttributes::from(updated))
    }
}

/// Keep string attributes; nulls read as absent, anything else is a decode error
fn to_item(raw: &RawItem) -> Result<Item, StoreError> {
    let mut item = Item::new();
    for (name, value) in raw {
        match value {
            AttributeValue::S(s) => {
                item.insert(name.clone(), s.clone());
            }
            AttributeValue::Null(_) => {}
            other => {
                return Err(StoreError::Decode(format!(
                    "attribute {name} is not a string: {other:?}"
                )));
            }
        }
    }
    Ok(item)
}

fn is_transient<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    )
}

fn is_conditional_check_failed<R>(err: &SdkError<UpdateItemError, R>) -> bool {
    match err {
        SdkError::ServiceError(service_err) => matches!(
            service_err.err(),
            UpdateItemError::ConditionalCheckFailedException(_)
        ),
        _ => false,
    }
}
