use crate::errors::OffError;
use crate::query::{known_fields, not_blank, valid_nutrients};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Single-letter summary rating used by both the nutrition grade and the eco-score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];

    /// Case-insensitive; anything other than a single `a`..`e` is `None`.
    pub fn from_letter(raw: &str) -> Option<Grade> {
        match raw.to_lowercase().as_str() {
            "a" => Some(Grade::A),
            "b" => Some(Grade::B),
            "c" => Some(Grade::C),
            "d" => Some(Grade::D),
            "e" => Some(Grade::E),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "a",
            Grade::B => "b",
            Grade::C => "c",
            Grade::D => "d",
            Grade::E => "e",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = OffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::from_letter(s.trim())
            .ok_or_else(|| OffError::Validation(format!("unknown nutrition grade '{}'", s)))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NutrientUpdate {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct ProductLookup {
    #[validate(custom(function = "not_blank"))]
    pub barcode: String,
    #[serde(default)]
    #[validate(custom(function = "known_fields"))]
    pub fields: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct CategorySearch {
    #[validate(custom(function = "not_blank"))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "known_fields"))]
    pub fields: BTreeSet<String>,
    #[serde(default)]
    pub grade: Option<Grade>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataSubmission {
    #[validate(custom(function = "not_blank"))]
    pub barcode: String,
    #[validate(custom(function = "not_blank"))]
    pub user_id: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(custom(function = "valid_nutrients"))]
    pub nutrient_updates: BTreeMap<String, NutrientUpdate>,
}

impl fmt::Debug for DataSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSubmission")
            .field("barcode", &self.barcode)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("nutrient_updates", &self.nutrient_updates)
            .finish()
    }
}

/// One user action. Every variant is checked locally before any request is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum QueryRequest {
    FetchByBarcode(ProductLookup),
    SearchByCategory(CategorySearch),
    SubmitData(DataSubmission),
}

impl QueryRequest {
    pub fn validate(&self) -> Result<(), OffError> {
        match self {
            QueryRequest::FetchByBarcode(lookup) => lookup.validate()?,
            QueryRequest::SearchByCategory(search) => search.validate()?,
            QueryRequest::SubmitData(submission) => submission.validate()?,
        }
        Ok(())
    }
}

/// Sparse product document exactly as the remote API returned it.
///
/// Every accessor is total: a missing key, a `null`, or a value of the wrong
/// shape reads as absent rather than failing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Scalar as display text. Numbers and booleans are stringified.
    pub fn text(&self, field: &str) -> Option<String> {
        scalar_text(self.get(field)?)
    }

    pub fn text_or(&self, field: &str, default: &str) -> String {
        self.text(field).unwrap_or_else(|| default.to_string())
    }

    /// String entries of a list field, in source order. Non-string entries are skipped.
    pub fn tags(&self, field: &str) -> Vec<String> {
        match self.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn object(&self, field: &str) -> Option<&Map<String, Value>> {
        self.get(field).and_then(Value::as_object)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ProductRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a number that may have been sent as a JSON number or a numeric string.
pub(crate) fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Body of the product-lookup endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub product: Option<ProductRecord>,
}

impl ProductEnvelope {
    pub fn is_found(&self) -> bool {
        self.status
            .as_ref()
            .and_then(number_value)
            .is_some_and(|s| s == 1.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SearchResult {
    pub count: u64,
    pub products: Vec<ProductRecord>,
}

/// Body of the search endpoint before `count` is settled.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub count: Option<Value>,
    #[serde(default)]
    pub products: Option<Value>,
}

impl From<SearchEnvelope> for SearchResult {
    fn from(envelope: SearchEnvelope) -> Self {
        // A null list reads as empty; entries that are not objects are dropped.
        let products: Vec<ProductRecord> = match envelope.products {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(fields) => Some(ProductRecord::from(fields)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let count = envelope
            .count
            .as_ref()
            .and_then(number_value)
            .filter(|c| *c >= 0.0)
            .map(|c| c as u64)
            .unwrap_or(products.len() as u64);
        SearchResult { count, products }
    }
}
