//! Event listing filters.
//!
//! `GET /api/events` takes every filter as an optional query string. Raw
//! strings are parsed here into an [`EventFilter`] and a [`Page`]; the SQL
//! for them lives in `repository::sql`.
//!
//! Malformed values never fail the request. An id or date that does not
//! parse becomes [`Match::Nothing`], which turns the whole predicate false.
//! A malformed `limit` or `offset` is ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::utils::ids::parse_leading_int;

/// Query string of `GET /api/events`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub q: Option<String>,
    pub college: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub created_by: Option<String>,
    pub saved_by_user: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// A parsed filter value. `Nothing` stands in for input that could not be
/// parsed and matches no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match<T> {
    Is(T),
    Nothing,
}

/// Conjunction of the supplied filters. `None` fields are not constrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Case-insensitive substring of title or description.
    pub text: Option<String>,
    pub college: Option<Match<i64>>,
    pub category: Option<String>,
    /// Inclusive lower bound on the event date.
    pub date_from: Option<Match<DateTime<Utc>>>,
    /// Inclusive upper bound on the event date.
    pub date_to: Option<Match<DateTime<Utc>>>,
    pub created_by: Option<Match<i64>>,
    /// Events with a saved-event row for this user.
    pub saved_by_user: Option<Match<i64>>,
}

impl EventFilter {
    /// True when some filter value failed to parse.
    pub fn matches_nothing(&self) -> bool {
        fn bad<T>(m: &Option<Match<T>>) -> bool {
            matches!(m, Some(Match::Nothing))
        }

        bad(&self.college)
            || bad(&self.created_by)
            || bad(&self.saved_by_user)
            || bad(&self.date_from)
            || bad(&self.date_to)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl EventQuery {
    pub fn into_parts(self) -> (EventFilter, Page) {
        let filter = EventFilter {
            text: present(self.q),
            college: present(self.college).map(|v| id_match(&v)),
            category: present(self.category),
            date_from: present(self.date_from).map(|v| date_match(&v)),
            date_to: present(self.date_to).map(|v| date_match(&v)),
            created_by: present(self.created_by).map(|v| id_match(&v)),
            saved_by_user: present(self.saved_by_user).map(|v| id_match(&v)),
        };

        let page = Page {
            limit: present(self.limit).and_then(|v| non_negative(&v)),
            offset: present(self.offset).and_then(|v| non_negative(&v)),
        };

        (filter, page)
    }
}

/// Parses an event timestamp: RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]`
/// (taken as UTC), or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn id_match(raw: &str) -> Match<i64> {
    parse_leading_int(raw).map_or(Match::Nothing, Match::Is)
}

fn date_match(raw: &str) -> Match<DateTime<Utc>> {
    parse_timestamp(raw).map_or(Match::Nothing, Match::Is)
}

fn non_negative(raw: &str) -> Option<i64> {
    parse_leading_int(raw).filter(|v| *v >= 0)
}
