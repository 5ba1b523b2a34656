use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The college fields joined into event listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeSummary {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
}

impl From<&College> for CollegeSummary {
    fn from(college: &College) -> Self {
        Self {
            id: college.id,
            name: college.name.clone(),
            city: college.city.clone(),
        }
    }
}
