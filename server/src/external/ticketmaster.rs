//! Ticketmaster Discovery API v2, reached directly or through the RapidAPI
//! marketplace wrapper.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{id_at, str_at, ExternalQuery, UpstreamRequest, DEFAULT_CATEGORY};
use crate::config::DiscoveryConfig;
use crate::models::external_event::EXTERNAL_ID_PREFIX;
use crate::models::{ExternalEvent, PriceRange, Venue};

pub const SOURCE: &str = "Ticketmaster Discovery API";
const EVENTS_PATH: &str = "/discovery/v2/events.json";
const PREFERRED_IMAGE_RATIO: &str = "16_9";
const DEFAULT_CURRENCY: &str = "USD";

/// Which key the request is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Ticketmaster's own API key, sent as the `apikey` query param.
    Direct { api_key: &'a str, base_url: &'a str },
    /// RapidAPI key, sent as `X-RapidAPI-*` headers.
    Marketplace {
        api_key: &'a str,
        host: &'a str,
        base_url: &'a str,
    },
}

impl Credential<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Credential::Direct { .. } => "Direct Ticketmaster API",
            Credential::Marketplace { .. } => "RapidAPI wrapper",
        }
    }
}

/// Prefers the direct key. The marketplace key is only used when it is
/// explicitly enabled.
pub fn select_credential(config: &DiscoveryConfig) -> Option<Credential<'_>> {
    if let Some(api_key) = config.ticketmaster_api_key.as_deref() {
        return Some(Credential::Direct {
            api_key,
            base_url: &config.ticketmaster_base_url,
        });
    }

    match config.rapidapi_key.as_deref() {
        Some(api_key) if config.use_rapidapi => Some(Credential::Marketplace {
            api_key,
            host: &config.rapidapi_ticketmaster_host,
            base_url: &config.rapidapi_ticketmaster_base_url,
        }),
        _ => None,
    }
}

/// Setup hints returned with the 503 when no key is configured.
pub fn setup_hints() -> Value {
    json!({
        "direct": "Get an API key from https://developer.ticketmaster.com/ and set TICKETMASTER_API_KEY",
        "rapidapi": "Set RAPIDAPI_KEY and USE_RAPIDAPI_TICKETMASTER=true to use the RapidAPI wrapper",
    })
}

pub fn build_request(credential: Credential<'_>, query: &ExternalQuery) -> UpstreamRequest {
    let mut params: Vec<(&'static str, String)> = Vec::new();
    let mut headers: Vec<(&'static str, String)> = Vec::new();

    let base_url = match credential {
        Credential::Direct { api_key, base_url } => {
            params.push(("apikey", api_key.to_string()));
            headers.push(("Accept", "application/json".to_string()));
            base_url
        }
        Credential::Marketplace {
            api_key,
            host,
            base_url,
        } => {
            headers.push(("X-RapidAPI-Key", api_key.to_string()));
            headers.push(("X-RapidAPI-Host", host.to_string()));
            base_url
        }
    };

    if let Some(city) = query.city() {
        params.push(("city", city.to_string()));
    }
    if let Some(state) = query.state() {
        params.push(("stateCode", state.to_string()));
    }
    params.push(("countryCode", query.country().to_string()));
    if let Some(category) = query.category() {
        params.push(("classificationName", category.to_string()));
    }
    params.push(("size", query.page_size().to_string()));

    UpstreamRequest {
        url: format!("{}{}", base_url.trim_end_matches('/'), EVENTS_PATH),
        query: params,
        headers,
    }
}

/// The raw event list: `_embedded.events`, else a bare array, else nothing.
pub fn raw_events(body: &Value) -> &[Value] {
    if let Some(events) = body.pointer("/_embedded/events").and_then(Value::as_array) {
        return events;
    }
    if let Some(events) = body.as_array() {
        return events;
    }

    tracing::warn!(
        has_embedded = body.get("_embedded").is_some(),
        keys = ?top_level_keys(body),
        "Unexpected Ticketmaster response structure"
    );
    &[]
}

/// Maps every raw event. Events without an id are skipped since they cannot
/// be told apart downstream.
pub fn normalize(body: &Value, query: &ExternalQuery, now: DateTime<Utc>) -> Vec<ExternalEvent> {
    raw_events(body)
        .iter()
        .filter_map(|raw| normalize_event(raw, query, now))
        .collect()
}

pub fn normalize_event(
    raw: &Value,
    query: &ExternalQuery,
    now: DateTime<Utc>,
) -> Option<ExternalEvent> {
    let external_id = id_at(raw, "/id")?;
    let title = str_at(raw, "/name").unwrap_or("Untitled Event").to_string();

    let venue_json = raw
        .pointer("/_embedded/venues/0")
        .or_else(|| raw.pointer("/venues/0"));
    let venue = venue_json.and_then(venue_from);

    let description = str_at(raw, "/info")
        .or_else(|| str_at(raw, "/description"))
        .map(str::to_string)
        .unwrap_or_else(|| match &venue {
            Some(v) => format!("{} - at {}", title, v.name),
            None => format!("{} - Local event", title),
        });

    let category = str_at(raw, "/classifications/0/genre/name")
        .or_else(|| str_at(raw, "/classifications/0/segment/name"))
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();

    let start = str_at(raw, "/dates/start/dateTime").or_else(|| str_at(raw, "/dates/start/localDate"));
    let (date, date_tbd) = match start {
        Some(d) => (d.to_string(), false),
        None => (now.to_rfc3339(), true),
    };

    let location = match &venue {
        Some(v) => venue_location(v),
        None => query.fallback_location(),
    };

    let price_range = raw.pointer("/priceRanges/0").map(|p| PriceRange {
        min: p.get("min").and_then(Value::as_f64),
        max: p.get("max").and_then(Value::as_f64),
        currency: str_at(p, "/currency")
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string(),
    });

    Some(ExternalEvent {
        id: format!("{}{}", EXTERNAL_ID_PREFIX, external_id),
        title,
        description,
        category,
        date,
        date_tbd,
        location,
        image_url: best_image(raw),
        venue,
        price_range,
        url: str_at(raw, "/url").map(str::to_string),
        external_source: SOURCE,
        external_id,
        is_external: true,
    })
}

/// Image tagged 16:9, else the first image.
fn best_image(raw: &Value) -> Option<String> {
    let images = raw.get("images").and_then(Value::as_array)?;
    images
        .iter()
        .find(|img| img.get("ratio").and_then(Value::as_str) == Some(PREFERRED_IMAGE_RATIO))
        .or_else(|| images.first())
        .and_then(|img| str_at(img, "/url"))
        .map(str::to_string)
}

fn venue_from(raw: &Value) -> Option<Venue> {
    Some(Venue {
        name: str_at(raw, "/name")?.to_string(),
        address: str_at(raw, "/address/line1").map(str::to_string),
        city: str_at(raw, "/city/name").map(str::to_string),
        state: str_at(raw, "/state/name").map(str::to_string),
        postal_code: str_at(raw, "/postalCode").map(str::to_string),
        country: str_at(raw, "/country/name").map(str::to_string),
    })
}

fn venue_location(venue: &Venue) -> String {
    std::iter::once(venue.name.as_str())
        .chain(venue.address.as_deref())
        .chain(venue.city.as_deref())
        .chain(venue.state.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

fn top_level_keys(body: &Value) -> Vec<&str> {
    body.as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Shape summary for the development-mode `debug` block.
pub fn debug_summary(body: &Value, raw_count: usize, transformed_count: usize) -> Value {
    json!({
        "apiEventsCount": raw_count,
        "transformedCount": transformed_count,
        "responseStructure": {
            "isArray": body.is_array(),
            "hasEmbedded": body.get("_embedded").is_some(),
            "keys": top_level_keys(body),
        }
    })
}
