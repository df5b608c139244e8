//! Property Enrichment API Library
//!
//! Enriches user-submitted property addresses with valuation and tax-assessment
//! provider data, merges the results with the user's own input, and stores the
//! merged record as a row in a spreadsheet-backed record store.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `enrichment`: Provider fan-out, precedence merge, and create workflow.
//! - `errors`: Error handling types.
//! - `field_access`: Safe nested-field reads over provider JSON.
//! - `handlers`: HTTP request handlers.
//! - `models`: Field catalog, provider mapping tables, request/response models.
//! - `record_storage`: Record-to-row mapping and persistence.
//! - `services`: Valuation and assessment provider clients.
//! - `store_client`: Record store client.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod enrichment;
pub mod errors;
pub mod field_access;
pub mod handlers;
pub mod models;
pub mod record_storage;
pub mod services;
pub mod store_client;
