use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::field_access::{as_decimal, as_flag, as_integer, as_text, lookup_or};

// ============ Field Catalog ============

/// How a field's raw provider value is coerced before it lands in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Flag,
}

impl FieldKind {
    /// Coerces a raw JSON value, returning `None` when it does not fit the kind.
    pub fn coerce(self, raw: &Value) -> Option<Value> {
        match self {
            FieldKind::Text => as_text(raw).map(Value::String),
            FieldKind::Integer => as_integer(raw).map(Value::from),
            FieldKind::Decimal => as_decimal(raw).map(Value::from),
            FieldKind::Flag => as_flag(raw).map(Value::Bool),
        }
    }
}

/// Every field of an enriched property record.
///
/// Variant order is the output order of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyField {
    Address,
    FirstName,
    LastName,
    Email,
    Phone,
    City,
    State,
    ZipCode,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    LotSize,
    YearBuilt,
    PropertyType,
    EstimatedValue,
    RentEstimate,
    ImageUrl,
    TaxAmount,
    TaxYear,
    AssessedValue,
    ParcelNumber,
    LegalDescription,
    SchoolDistrict,
    ValuationId,
    AssessmentId,
    IsBuyingHome,
    Notes,
}

impl PropertyField {
    pub const ALL: [PropertyField; 27] = [
        PropertyField::Address,
        PropertyField::FirstName,
        PropertyField::LastName,
        PropertyField::Email,
        PropertyField::Phone,
        PropertyField::City,
        PropertyField::State,
        PropertyField::ZipCode,
        PropertyField::Bedrooms,
        PropertyField::Bathrooms,
        PropertyField::SquareFeet,
        PropertyField::LotSize,
        PropertyField::YearBuilt,
        PropertyField::PropertyType,
        PropertyField::EstimatedValue,
        PropertyField::RentEstimate,
        PropertyField::ImageUrl,
        PropertyField::TaxAmount,
        PropertyField::TaxYear,
        PropertyField::AssessedValue,
        PropertyField::ParcelNumber,
        PropertyField::LegalDescription,
        PropertyField::SchoolDistrict,
        PropertyField::ValuationId,
        PropertyField::AssessmentId,
        PropertyField::IsBuyingHome,
        PropertyField::Notes,
    ];

    pub fn kind(self) -> FieldKind {
        use PropertyField::*;
        match self {
            Bedrooms | SquareFeet | YearBuilt | TaxYear => FieldKind::Integer,
            Bathrooms | LotSize | EstimatedValue | RentEstimate | TaxAmount | AssessedValue => {
                FieldKind::Decimal
            }
            IsBuyingHome => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }

    /// Column name in the record store table.
    pub fn column(self) -> &'static str {
        use PropertyField::*;
        match self {
            Address => "Address",
            FirstName => "First Name",
            LastName => "Last Name",
            Email => "Email",
            Phone => "Phone",
            City => "City",
            State => "State",
            ZipCode => "Zip Code",
            Bedrooms => "Bedrooms",
            Bathrooms => "Bathrooms",
            SquareFeet => "Square Feet",
            LotSize => "Lot Size",
            YearBuilt => "Year Built",
            PropertyType => "Property Type",
            EstimatedValue => "Estimated Value",
            RentEstimate => "Rent Estimate",
            ImageUrl => "Image URL",
            TaxAmount => "Tax Amount",
            TaxYear => "Tax Year",
            AssessedValue => "Assessed Value",
            ParcelNumber => "Parcel Number",
            LegalDescription => "Legal Description",
            SchoolDistrict => "School District",
            ValuationId => "Valuation ID",
            AssessmentId => "Assessment ID",
            IsBuyingHome => "Is Buying Home",
            Notes => "Notes",
        }
    }
}

/// One entry of a provider mapping table: where to read a field in a response document.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub field: PropertyField,
    pub path: &'static str,
}

impl FieldMapping {
    const fn new(field: PropertyField, path: &'static str) -> Self {
        Self { field, path }
    }

    /// Reads and coerces this mapping's value from `doc`.
    pub fn extract(&self, doc: &Value) -> Option<Value> {
        // Null coerces to None for every kind
        self.field
            .kind()
            .coerce(lookup_or(doc, self.path, &Value::Null))
    }
}

/// Valuation search response (lookup by address).
pub const VALUATION_SUMMARY_FIELDS: &[FieldMapping] = &[
    FieldMapping::new(PropertyField::ValuationId, "zpid"),
    FieldMapping::new(PropertyField::EstimatedValue, "zestimate"),
    FieldMapping::new(PropertyField::ImageUrl, "imgSrc"),
];

/// Valuation extended details (lookup by zpid).
pub const VALUATION_DETAIL_FIELDS: &[FieldMapping] = &[
    FieldMapping::new(PropertyField::City, "address.city"),
    FieldMapping::new(PropertyField::State, "address.state"),
    FieldMapping::new(PropertyField::ZipCode, "address.zipcode"),
    FieldMapping::new(PropertyField::Bedrooms, "bedrooms"),
    FieldMapping::new(PropertyField::Bathrooms, "bathrooms"),
    FieldMapping::new(PropertyField::SquareFeet, "livingArea"),
    FieldMapping::new(PropertyField::LotSize, "lotAreaValue"),
    FieldMapping::new(PropertyField::YearBuilt, "yearBuilt"),
    FieldMapping::new(PropertyField::PropertyType, "homeType"),
    FieldMapping::new(PropertyField::EstimatedValue, "zestimate"),
    FieldMapping::new(PropertyField::RentEstimate, "rentZestimate"),
];

/// Valuation media (lookup by zpid).
pub const VALUATION_MEDIA_FIELDS: &[FieldMapping] =
    &[FieldMapping::new(PropertyField::ImageUrl, "images[0]")];

/// Assessment expanded profile (lookup by address).
pub const ASSESSMENT_PROFILE_FIELDS: &[FieldMapping] = &[
    FieldMapping::new(PropertyField::AssessmentId, "property[0].identifier.attomId"),
    FieldMapping::new(PropertyField::ParcelNumber, "property[0].identifier.apn"),
    FieldMapping::new(PropertyField::City, "property[0].address.locality"),
    FieldMapping::new(PropertyField::State, "property[0].address.countrySubd"),
    FieldMapping::new(PropertyField::ZipCode, "property[0].address.postal1"),
    FieldMapping::new(PropertyField::Bedrooms, "property[0].building.rooms.beds"),
    FieldMapping::new(PropertyField::Bathrooms, "property[0].building.rooms.bathstotal"),
    FieldMapping::new(PropertyField::SquareFeet, "property[0].building.size.livingsize"),
    FieldMapping::new(PropertyField::LotSize, "property[0].lot.lotsize2"),
    FieldMapping::new(PropertyField::YearBuilt, "property[0].summary.yearbuilt"),
    FieldMapping::new(PropertyField::PropertyType, "property[0].summary.propclass"),
    FieldMapping::new(PropertyField::EstimatedValue, "assessment[0].market.mktttlvalue"),
    FieldMapping::new(PropertyField::TaxAmount, "assessment[0].tax.taxamt"),
    FieldMapping::new(PropertyField::TaxYear, "assessment[0].tax.taxyear"),
    FieldMapping::new(PropertyField::AssessedValue, "assessment[0].assessed.assdttlvalue"),
    FieldMapping::new(PropertyField::LegalDescription, "assessment[0].legal.legal1"),
];

/// Assessment school details (lookup by attomId).
pub const ASSESSMENT_SCHOOL_FIELDS: &[FieldMapping] = &[FieldMapping::new(
    PropertyField::SchoolDistrict,
    "property[0].school.districtName",
)];

// ============ Request/Response Models ============

/// Form fields submitted by the user alongside the address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPayload {
    #[serde(default)]
    pub address: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<u32>,
    pub year_built: Option<i32>,
    pub estimated_value: Option<f64>,
    pub property_type: Option<String>,
    pub is_buying_home: Option<bool>,
    pub notes: Option<String>,
}

impl PropertyPayload {
    /// The value the user supplied for `field`, if any.
    pub fn value_for(&self, field: PropertyField) -> Option<Value> {
        // Forms post "" for untouched inputs; `coerce` treats blank text as not supplied,
        // so a blank field falls through to provider data instead of overriding it.
        use PropertyField::*;
        let raw = match field {
            Address => json!(self.address),
            FirstName => json!(self.first_name),
            LastName => json!(self.last_name),
            Email => json!(self.email),
            Phone => json!(self.phone),
            Bedrooms => json!(self.bedrooms),
            Bathrooms => json!(self.bathrooms),
            SquareFeet => json!(self.square_feet),
            YearBuilt => json!(self.year_built),
            EstimatedValue => json!(self.estimated_value),
            PropertyType => json!(self.property_type),
            IsBuyingHome => json!(self.is_buying_home),
            Notes => json!(self.notes),
            _ => return None,
        };
        field.kind().coerce(&raw)
    }
}

/// Caller-facing envelope: `{ "operation": "create", "payload": { ... } }`.
#[derive(Debug, Deserialize)]
pub struct PropertyRequest {
    pub operation: String,
    pub payload: PropertyPayload,
}

/// Response envelope: `{ "data": <record> }`.
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub data: EnrichedProperty,
}

/// The merged property record.
///
/// `fields` always holds every [`PropertyField`]; unresolved fields are `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedProperty {
    /// Row identifier assigned by the record store.
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<PropertyField, Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl EnrichedProperty {
    pub fn get(&self, field: PropertyField) -> &Value {
        self.fields.get(&field).unwrap_or(&Value::Null)
    }

    /// Fields that resolved to a value.
    pub fn populated(&self) -> usize {
        self.fields.values().filter(|v| !v.is_null()).count()
    }
}
