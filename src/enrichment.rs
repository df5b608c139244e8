//! Property enrichment pipeline
//!
//! 1. Valuation lookup by address, then details and media keyed by `zpid`
//! 2. Assessment lookup by address, then schools keyed by `attomId`
//! 3. Precedence merge: user input > valuation > assessment > default
//! 4. Persist the merged record as a new store row
//!
//! Steps 1 and 2 run concurrently. Every provider call may fail without failing the
//! request; only the final write is fatal.
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::record_storage::PropertyStorage;
use crate::services::{AssessmentService, ValuationService};
use crate::store_client::RecordStoreClient;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw provider documents gathered for one request. `None` means no data.
#[derive(Debug, Clone, Default)]
pub struct ProviderData {
    pub valuation_summary: Option<Value>,
    pub valuation_details: Option<Value>,
    pub valuation_media: Option<Value>,
    pub assessment_profile: Option<Value>,
    pub schools: Option<Value>,
}

impl ProviderData {
    /// Documents in merge order, each with the table that reads it.
    fn ranked(&self) -> [(Option<&Value>, &'static [FieldMapping]); 5] {
        [
            (self.valuation_details.as_ref(), VALUATION_DETAIL_FIELDS),
            (self.valuation_media.as_ref(), VALUATION_MEDIA_FIELDS),
            (self.valuation_summary.as_ref(), VALUATION_SUMMARY_FIELDS),
            (self.assessment_profile.as_ref(), ASSESSMENT_PROFILE_FIELDS),
            (self.schools.as_ref(), ASSESSMENT_SCHOOL_FIELDS),
        ]
    }

    /// Names of the documents that were obtained, for logging.
    pub fn sources(&self) -> Vec<&'static str> {
        [
            ("valuation_summary", &self.valuation_summary),
            ("valuation_details", &self.valuation_details),
            ("valuation_media", &self.valuation_media),
            ("assessment_profile", &self.assessment_profile),
            ("schools", &self.schools),
        ]
        .into_iter()
        .filter(|(_, doc)| doc.is_some())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Values used when no source resolves a field. Everything else defaults to null.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeDefaults {
    /// `None` leaves `is_buying_home` null when the user did not answer.
    pub is_buying_home: Option<bool>,
}

impl MergeDefaults {
    fn value_for(&self, field: PropertyField) -> Value {
        match field {
            PropertyField::IsBuyingHome => self.is_buying_home.map_or(Value::Null, Value::Bool),
            _ => Value::Null,
        }
    }
}

/// Reads `field` from `doc` using the first matching entry of `table`.
fn extract(doc: &Value, table: &[FieldMapping], field: PropertyField) -> Option<Value> {
    table
        .iter()
        .filter(|mapping| mapping.field == field)
        .find_map(|mapping| mapping.extract(doc))
}

/// Provider-assigned identifier used to chain a follow-up call.
fn chaining_id(doc: Option<&Value>, table: &[FieldMapping], field: PropertyField) -> Option<String> {
    match extract(doc?, table, field)? {
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    }
}

/// Builds the enriched record. Pure: no I/O, no logging.
///
/// Every catalog field is present in the result, resolved from the first source
/// that yields a value, or set to its default.
pub fn merge_property(
    payload: &PropertyPayload,
    data: &ProviderData,
    defaults: MergeDefaults,
) -> EnrichedProperty {
    let ranked = data.ranked();

    let fields: BTreeMap<PropertyField, Value> = PropertyField::ALL
        .iter()
        .map(|&field| {
            let value = payload
                .value_for(field)
                .or_else(|| {
                    ranked
                        .iter()
                        .find_map(|(doc, table)| doc.and_then(|d| extract(d, table, field)))
                })
                .unwrap_or_else(|| defaults.value_for(field));
            (field, value)
        })
        .collect();

    EnrichedProperty {
        id: None,
        fields,
        created_at: None,
    }
}

/// Logs a failed provider call and degrades it to "no data".
fn tolerate(step: &str, result: Result<Value, AppError>) -> Option<Value> {
    match result {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("⚠ {} unavailable, continuing without it: {}", step, e);
            None
        }
    }
}

/// Runs the enrichment pipeline for property create requests.
#[derive(Clone)]
pub struct PropertyEnricher {
    valuation: ValuationService,
    assessment: AssessmentService,
    storage: PropertyStorage,
    defaults: MergeDefaults,
}

impl PropertyEnricher {
    pub fn new(
        valuation: ValuationService,
        assessment: AssessmentService,
        storage: PropertyStorage,
        defaults: MergeDefaults,
    ) -> Self {
        Self {
            valuation,
            assessment,
            storage,
            defaults,
        }
    }

    /// Wires all clients from configuration around one shared HTTP client.
    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            ValuationService::new(client.clone(), config),
            AssessmentService::new(client.clone(), config),
            PropertyStorage::new(RecordStoreClient::new(client, config)),
            MergeDefaults {
                is_buying_home: config.is_buying_home_default,
            },
        )
    }

    async fn collect_valuation(&self, address: &str) -> (Option<Value>, Option<Value>, Option<Value>) {
        let summary = tolerate(
            "Valuation lookup",
            self.valuation.lookup_by_address(address).await,
        );

        let Some(zpid) = chaining_id(
            summary.as_ref(),
            VALUATION_SUMMARY_FIELDS,
            PropertyField::ValuationId,
        ) else {
            tracing::debug!("No zpid from valuation lookup, skipping details and media");
            return (summary, None, None);
        };

        let (details, media) = tokio::join!(
            self.valuation.fetch_details(&zpid),
            self.valuation.fetch_media(&zpid),
        );

        (
            summary,
            tolerate("Valuation details", details),
            tolerate("Valuation media", media),
        )
    }

    async fn collect_assessment(&self, address: &str) -> (Option<Value>, Option<Value>) {
        let profile = tolerate(
            "Assessment lookup",
            self.assessment.lookup_by_address(address).await,
        );

        let Some(attom_id) = chaining_id(
            profile.as_ref(),
            ASSESSMENT_PROFILE_FIELDS,
            PropertyField::AssessmentId,
        ) else {
            tracing::debug!("No attomId from assessment lookup, skipping schools");
            return (profile, None);
        };

        let schools = tolerate(
            "School lookup",
            self.assessment.fetch_schools(&attom_id).await,
        );
        (profile, schools)
    }

    /// Fans out both provider branches and joins them. Never fails.
    pub async fn collect_provider_data(&self, address: &str) -> ProviderData {
        let (
            (valuation_summary, valuation_details, valuation_media),
            (assessment_profile, schools),
        ) = tokio::join!(
            self.collect_valuation(address),
            self.collect_assessment(address)
        );

        ProviderData {
            valuation_summary,
            valuation_details,
            valuation_media,
            assessment_profile,
            schools,
        }
    }

    /// Complete create workflow: enrich, merge, persist.
    ///
    /// Returns the merged record carrying the store-assigned id. Only a persistence
    /// failure is returned as an error.
    pub async fn create_property(
        &self,
        payload: &PropertyPayload,
    ) -> Result<EnrichedProperty, AppError> {
        tracing::info!("Starting property enrichment for: {}", payload.address);

        tracing::info!("Step 1: Collecting provider data");
        let data = self.collect_provider_data(&payload.address).await;
        tracing::info!("Provider data collected from {:?}", data.sources());

        tracing::info!("Step 2: Merging user input with provider data");
        let mut record = merge_property(payload, &data, self.defaults);

        tracing::info!(
            "Step 3: Persisting record ({} of {} fields populated)",
            record.populated(),
            PropertyField::ALL.len()
        );
        let created = self
            .storage
            .persist(&record)
            .await
            .with_context(|| format!("Failed to persist property '{}'", payload.address))?;

        record.id = Some(created.id);
        record.created_at = created.created_at;

        tracing::info!("✓ Property stored with id {:?}", record.id);
        Ok(record)
    }
}
