use crate::config::Config;
use crate::errors::AppError;
use crate::field_access;
use crate::services::send_json;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde_json::{json, Map, Value};

/// A row created in the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Client for the spreadsheet-backed record store (Airtable-style REST tables).
#[derive(Clone)]
pub struct RecordStoreClient {
    client: Client,
    base_url: String,
    base_id: String,
    table: String,
    token: String,
}

impl RecordStoreClient {
    const PROVIDER: &'static str = "store";

    /// Creates a new `RecordStoreClient`.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the request timeout).
    /// * `config` - Store base URL, base id, table name and token.
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.store_base_url.clone(),
            base_id: config.store_base_id.clone(),
            table: config.store_table.clone(),
            token: config.store_token.clone(),
        }
    }

    /// `{base_url}/{base_id}/{table}` with each segment percent-encoded.
    fn table_url(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AppError::InternalError(format!("Invalid store base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::InternalError(format!("Store base URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table);
        Ok(url)
    }

    /// Creates a new row from a flat column-name-to-value mapping.
    ///
    /// # Returns
    ///
    /// * `Result<CreatedRecord, AppError>` - The identifier assigned by the store.
    pub async fn create_record(&self, fields: Map<String, Value>) -> Result<CreatedRecord, AppError> {
        let url = self.table_url()?;
        tracing::info!("Creating row in table '{}' ({} columns)", self.table, fields.len());

        let body = json!({
            "fields": fields,
            "typecast": true
        });

        let response_data = send_json(
            Self::PROVIDER,
            self.client
                .post(url)
                .bearer_auth(&self.token)
                .json(&body),
        )
        .await?;

        // Single-record creates answer with `id`; batch-style answers with `records[0].id`
        let id = field_access::text(&response_data, "id")
            .or_else(|| field_access::text(&response_data, "records[0].id"))
            .ok_or_else(|| {
                tracing::warn!("Unexpected store response format: {:?}", response_data);
                AppError::Provider {
                    provider: Self::PROVIDER,
                    status: None,
                    reason: "Create-row response missing 'id' field".to_string(),
                }
            })?;

        let created_at = field_access::text(&response_data, "createdTime")
            .or_else(|| field_access::text(&response_data, "records[0].createdTime"))
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc));

        tracing::info!("✓ Row created successfully: {}", id);
        Ok(CreatedRecord { id, created_at })
    }
}
