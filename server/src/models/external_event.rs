use serde::Serialize;
use serde_json::Value;

/// Prefix marking ids of events that only exist upstream.
pub const EXTERNAL_ID_PREFIX: &str = "external-";

pub fn is_external_id(id: &str) -> bool {
    id.starts_with(EXTERNAL_ID_PREFIX)
}

/// A transient event from a third-party discovery API. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    /// The provider gave no start time and `date` is the fetch time.
    pub date_tbd: bool,
    pub location: String,
    pub image_url: Option<String>,
    pub venue: Option<Venue>,
    pub price_range: Option<PriceRange>,
    pub url: Option<String>,
    pub external_source: &'static str,
    pub external_id: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: String,
}

/// Payload of the external events endpoints.
#[derive(Debug, Serialize)]
pub struct ExternalFeed {
    pub total: usize,
    pub events: Vec<ExternalEvent>,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl ExternalFeed {
    pub fn new(events: Vec<ExternalEvent>, source: &'static str) -> Self {
        Self {
            total: events.len(),
            events,
            source,
            message: None,
            debug: None,
        }
    }

    pub fn empty(source: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(Vec::new(), source)
        }
    }
}
