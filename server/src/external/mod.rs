//! Third-party event discovery.
//!
//! Each provider module builds an [`UpstreamRequest`] from an
//! [`ExternalQuery`] and normalizes the provider's JSON into
//! [`ExternalEvent`]s. Both halves are pure; [`fetch_json`] is the only
//! network call, a single attempt bounded by the configured timeout
//! ([`UPSTREAM_TIMEOUT`] unless overridden).

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::models::ExternalEvent;
use crate::utils::ids::parse_leading_int;
use crate::utils::AppError;

pub mod seatgeek;
pub mod ticketmaster;

pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_PAGE_SIZE: i64 = 50;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const DEFAULT_COUNTRY: &str = "US";
pub const LOCATION_PLACEHOLDER: &str = "Location TBD";
pub const DEFAULT_CATEGORY: &str = "General";

/// Query string of the external events endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExternalQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
}

impl ExternalQuery {
    pub fn city(&self) -> Option<&str> {
        non_empty(self.city.as_deref())
    }

    pub fn state(&self) -> Option<&str> {
        non_empty(self.state.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn country(&self) -> &str {
        non_empty(self.country.as_deref()).unwrap_or(DEFAULT_COUNTRY)
    }

    /// Requested page size, capped at [`MAX_PAGE_SIZE`] whatever the caller
    /// asked for.
    pub fn page_size(&self) -> i64 {
        non_empty(self.limit.as_deref())
            .and_then(parse_leading_int)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    /// Location string built from the caller's own city and state, for
    /// events whose venue is unknown.
    pub fn fallback_location(&self) -> String {
        match (self.city(), self.state()) {
            (Some(city), Some(state)) => format!("{}, {}", city, state),
            (Some(city), None) => city.to_string(),
            (None, Some(state)) => state.to_string(),
            (None, None) => LOCATION_PLACEHOLDER.to_string(),
        }
    }
}

/// A fully described outbound GET.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends `request` once, bounded by `timeout`, and parses the body as JSON.
///
/// Transport failures and timeouts carry no status. Non-2xx answers carry
/// the upstream status and the provider's message when it sent one.
pub async fn fetch_json(
    http: &reqwest::Client,
    request: &UpstreamRequest,
    source_name: &'static str,
    timeout: Duration,
) -> Result<Value, AppError> {
    let mut builder = http
        .get(&request.url)
        .query(&request.query)
        .timeout(timeout);
    for (name, value) in &request.headers {
        builder = builder.header(*name, value);
    }

    let upstream_error = |status: Option<u16>, message: String| AppError::Upstream {
        status,
        message,
        source_name,
    };

    let response = builder.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("Request to {} timed out", source_name)
        } else {
            e.to_string()
        };
        upstream_error(e.status().map(|s| s.as_u16()), message)
    })?;

    let status = response.status();
    tracing::debug!(status = status.as_u16(), source = source_name, "Upstream responded");

    let body = response
        .text()
        .await
        .map_err(|e| upstream_error(Some(status.as_u16()), e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| provider_message(&v))
            .unwrap_or_else(|| {
                format!(
                    "Upstream returned {}",
                    status.canonical_reason().unwrap_or("an error")
                )
            });
        return Err(upstream_error(Some(status.as_u16()), message));
    }

    serde_json::from_str(&body)
        .map_err(|e| upstream_error(None, format!("Malformed response from {}: {}", source_name, e)))
}

/// Error text from the shapes providers use: `message`, or Apigee's
/// `fault.faultstring`.
fn provider_message(body: &Value) -> Option<String> {
    str_at(body, "/message")
        .or_else(|| str_at(body, "/fault/faultstring"))
        .map(str::to_string)
}

/// Keeps events whose category and the requested one contain each other,
/// ignoring case. An empty event category matches everything, as the empty
/// string is a substring of any filter.
pub fn filter_by_category(events: Vec<ExternalEvent>, category: Option<&str>) -> Vec<ExternalEvent> {
    let Some(category) = category else {
        return events;
    };
    let wanted = category.to_lowercase();

    events
        .into_iter()
        .filter(|event| {
            let actual = event.category.to_lowercase();
            actual.contains(&wanted) || wanted.contains(&actual)
        })
        .collect()
}

/// Non-empty string at a JSON pointer.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    non_empty(value.pointer(pointer).and_then(Value::as_str))
}

/// Provider ids arrive as strings or numbers.
pub(crate) fn id_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::external_event::EXTERNAL_ID_PREFIX;

    fn event_with_category(category: &str) -> ExternalEvent {
        ExternalEvent {
            id: format!("{}1", EXTERNAL_ID_PREFIX),
            title: "Show".into(),
            description: "Show - Local event".into(),
            category: category.into(),
            date: "2025-05-01".into(),
            date_tbd: false,
            location: LOCATION_PLACEHOLDER.into(),
            image_url: None,
            venue: None,
            price_range: None,
            url: None,
            external_source: "test",
            external_id: "1".into(),
            is_external: true,
        }
    }

    #[test]
    fn test_page_size_is_capped() {
        let q = |limit: &str| ExternalQuery {
            limit: Some(limit.into()),
            ..ExternalQuery::default()
        };
        assert_eq!(q("500").page_size(), 50);
        assert_eq!(q("10").page_size(), 10);
        assert_eq!(q("lots").page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(ExternalQuery::default().page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_fallback_location() {
        let q = ExternalQuery {
            city: Some("Austin".into()),
            state: Some("TX".into()),
            ..ExternalQuery::default()
        };
        assert_eq!(q.fallback_location(), "Austin, TX");
        assert_eq!(
            ExternalQuery::default().fallback_location(),
            LOCATION_PLACEHOLDER
        );
    }

    #[test]
    fn test_category_filter_matches_both_directions() {
        let events = vec![
            event_with_category("Rock"),
            event_with_category("Music"),
            event_with_category("Basketball"),
        ];

        // "rock music" contains "rock" and "music"
        let kept = filter_by_category(events.clone(), Some("Rock Music"));
        let categories: Vec<_> = kept.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["Rock", "Music"]);

        // "Basketball" contains "ball"
        let kept = filter_by_category(events.clone(), Some("BALL"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].category, "Basketball");

        assert_eq!(filter_by_category(events, None).len(), 3);
    }

    #[test]
    fn test_provider_message_shapes() {
        let a = serde_json::json!({ "message": "bad key" });
        let b = serde_json::json!({ "fault": { "faultstring": "Invalid ApiKey" } });
        assert_eq!(provider_message(&a).as_deref(), Some("bad key"));
        assert_eq!(provider_message(&b).as_deref(), Some("Invalid ApiKey"));
        assert_eq!(provider_message(&serde_json::json!({})), None);
    }
}
