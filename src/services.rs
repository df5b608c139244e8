use crate::config::Config;
use crate::errors::AppError;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Sends a prepared request and returns the parsed JSON body.
///
/// Any non-success status or transport failure becomes `AppError::Provider`;
/// callers decide whether that is fatal.
pub(crate) async fn send_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, AppError> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::transport(provider, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::debug!("{} returned error {}: {}", provider, status, error_text);
        return Err(AppError::Provider {
            provider,
            status: Some(status.as_u16()),
            reason: error_text,
        });
    }

    response.json().await.map_err(|e| AppError::Provider {
        provider,
        status: None,
        reason: format!("Failed to parse response: {}", e),
    })
}

/// Client for the property valuation / comparables provider.
#[derive(Clone)]
pub struct ValuationService {
    client: Client,
    base_url: String,
    api_key: String,
    api_host: Option<String>,
}

impl ValuationService {
    const PROVIDER: &'static str = "valuation";

    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.valuation_base_url.clone(),
            api_key: config.valuation_api_key.clone(),
            api_host: config.valuation_api_host.clone(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("X-RapidAPI-Key", &self.api_key);
        match self.api_host {
            Some(ref host) => request.header("X-RapidAPI-Host", host),
            None => request,
        }
    }

    /// Search by address. The response carries the provider-assigned `zpid`.
    pub async fn lookup_by_address(&self, address: &str) -> Result<Value, AppError> {
        tracing::info!("Valuation lookup for address: {}", address);
        send_json(
            Self::PROVIDER,
            self.get("/search").query(&[("address", address)]),
        )
        .await
    }

    /// Extended property details for a `zpid`.
    pub async fn fetch_details(&self, zpid: &str) -> Result<Value, AppError> {
        tracing::info!("Fetching valuation details for zpid {}", zpid);
        send_json(
            Self::PROVIDER,
            self.get("/property").query(&[("zpid", zpid)]),
        )
        .await
    }

    /// Listing photos for a `zpid`.
    pub async fn fetch_media(&self, zpid: &str) -> Result<Value, AppError> {
        tracing::info!("Fetching valuation media for zpid {}", zpid);
        send_json(Self::PROVIDER, self.get("/images").query(&[("zpid", zpid)])).await
    }
}

/// Client for the tax assessment / expanded profile provider.
#[derive(Clone)]
pub struct AssessmentService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AssessmentService {
    const PROVIDER: &'static str = "assessment";

    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.assessment_base_url.clone(),
            api_key: config.assessment_api_key.clone(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
    }

    /// Expanded profile by address: address, building, summary, tax and legal fields.
    pub async fn lookup_by_address(&self, address: &str) -> Result<Value, AppError> {
        tracing::info!("Assessment lookup for address: {}", address);
        send_json(
            Self::PROVIDER,
            self.get("/property/expandedprofile")
                .query(&[("address", address)]),
        )
        .await
    }

    /// School district details keyed by the assessment-assigned `attomId`.
    pub async fn fetch_schools(&self, attom_id: &str) -> Result<Value, AppError> {
        tracing::info!("Fetching school data for attomId {}", attom_id);
        send_json(
            Self::PROVIDER,
            self.get("/property/detailwithschools")
                .query(&[("attomid", attom_id)]),
        )
        .await
    }
}
