use crate::errors::AppError;
use crate::models::{EnrichedProperty, PropertyField};
use crate::store_client::{CreatedRecord, RecordStoreClient};
use serde_json::{Map, Value};

/// Writes enriched property records as rows in the record store.
#[derive(Clone)]
pub struct PropertyStorage {
    store: RecordStoreClient,
}

impl PropertyStorage {
    pub fn new(store: RecordStoreClient) -> Self {
        Self { store }
    }

    /// Store one enriched record as a new row.
    /// Failures are returned as-is; there is no retry.
    pub async fn persist(&self, record: &EnrichedProperty) -> Result<CreatedRecord, AppError> {
        let fields = to_store_fields(record);
        self.store.create_record(fields).await
    }
}

/// Renames every record field to its destination column. One column per field.
pub fn to_store_fields(record: &EnrichedProperty) -> Map<String, Value> {
    PropertyField::ALL
        .iter()
        .map(|field| (field.column().to_string(), record.get(*field).clone()))
        .collect()
}
