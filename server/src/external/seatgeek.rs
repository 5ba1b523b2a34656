//! SeatGeek through RapidAPI. Secondary source with a flatter payload.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{id_at, str_at, ExternalQuery, UpstreamRequest, DEFAULT_CATEGORY, LOCATION_PLACEHOLDER};
use crate::config::DiscoveryConfig;
use crate::models::external_event::EXTERNAL_ID_PREFIX;
use crate::models::{ExternalEvent, Venue};

pub const SOURCE: &str = "RapidAPI (SeatGeek)";

/// `None` when no RapidAPI key is configured.
pub fn build_request(config: &DiscoveryConfig, query: &ExternalQuery) -> Option<UpstreamRequest> {
    let api_key = config.rapidapi_key.as_deref()?;

    let mut params: Vec<(&'static str, String)> = Vec::new();
    if let Some(city) = query.city() {
        params.push(("venue.city", city.to_string()));
    }
    if let Some(state) = query.state() {
        params.push(("venue.state", state.to_string()));
    }
    if let Some(category) = query.category() {
        params.push(("taxonomies.name", category.to_string()));
    }
    params.push(("per_page", query.page_size().to_string()));

    Some(UpstreamRequest {
        url: format!(
            "{}/events",
            config.rapidapi_seatgeek_base_url.trim_end_matches('/')
        ),
        query: params,
        headers: vec![
            ("X-RapidAPI-Key", api_key.to_string()),
            ("X-RapidAPI-Host", config.rapidapi_seatgeek_host.clone()),
        ],
    })
}

pub fn normalize(body: &Value, now: DateTime<Utc>) -> Vec<ExternalEvent> {
    body.get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|raw| normalize_event(raw, now))
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_event(raw: &Value, now: DateTime<Utc>) -> Option<ExternalEvent> {
    let external_id = id_at(raw, "/id")?;
    let title = str_at(raw, "/title").unwrap_or("Untitled Event").to_string();

    let venue = raw.get("venue").and_then(|v| {
        Some(Venue {
            name: str_at(v, "/name")?.to_string(),
            address: str_at(v, "/address").map(str::to_string),
            city: str_at(v, "/city").map(str::to_string),
            state: str_at(v, "/state").map(str::to_string),
            postal_code: str_at(v, "/postal_code").map(str::to_string),
            country: str_at(v, "/country").map(str::to_string),
        })
    });

    let location = match &venue {
        Some(v) => std::iter::once(v.name.as_str())
            .chain(v.address.as_deref())
            .chain(v.city.as_deref())
            .chain(v.state.as_deref())
            .collect::<Vec<_>>()
            .join(", "),
        None => LOCATION_PLACEHOLDER.to_string(),
    };

    let start = str_at(raw, "/datetime_local").or_else(|| str_at(raw, "/datetime_utc"));
    let (date, date_tbd) = match start {
        Some(d) => (d.to_string(), false),
        None => (now.to_rfc3339(), true),
    };

    Some(ExternalEvent {
        id: format!("{}{}", EXTERNAL_ID_PREFIX, external_id),
        description: str_at(raw, "/description")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - Local event", title)),
        title,
        category: str_at(raw, "/taxonomies/0/name")
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        date,
        date_tbd,
        location,
        image_url: str_at(raw, "/performers/0/image").map(str::to_string),
        venue,
        price_range: None,
        url: str_at(raw, "/url").map(str::to_string),
        external_source: "SeatGeek",
        external_id,
        is_external: true,
    })
}
