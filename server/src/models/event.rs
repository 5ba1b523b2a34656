use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::college::CollegeSummary;
use crate::utils::ids::{deserialize_some, LooseId};

/// A persisted campus event. Belongs to exactly one college and one creator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub college_id: i64,
    pub created_by: i64,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorSummary {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

/// An event with its college and creator summaries joined in.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub college: CollegeSummary,
    pub creator: CreatorSummary,
}

/// Flat join row behind [`EventDetails`].
#[derive(Debug, FromRow)]
pub struct EventRow {
    #[sqlx(flatten)]
    pub event: Event,
    pub college_name: String,
    pub college_city: Option<String>,
    pub creator_name: Option<String>,
    pub creator_email: String,
}

impl From<EventRow> for EventDetails {
    fn from(row: EventRow) -> Self {
        let college = CollegeSummary {
            id: row.event.college_id,
            name: row.college_name,
            city: row.college_city,
        };
        let creator = CreatorSummary {
            id: row.event.created_by,
            name: row.creator_name,
            email: row.creator_email,
        };
        Self {
            event: row.event,
            college,
            creator,
        }
    }
}

/// `GET /api/events` payload. `total` ignores pagination.
#[derive(Debug, Serialize)]
pub struct EventPage {
    pub total: i64,
    pub events: Vec<EventDetails>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub college_id: i64,
    pub created_by: i64,
    pub is_public: bool,
    pub tags: Vec<String>,
}

/// Partial update. `Some(None)` on a nullable column clears it.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub college_id: Option<i64>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.image_url.is_none()
            && self.college_id.is_none()
            && self.is_public.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub college_name: Option<String>,
    pub college_id: Option<LooseId>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub location: Option<Option<String>>,
    pub college_name: Option<String>,
    pub college_id: Option<LooseId>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image_url: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}
