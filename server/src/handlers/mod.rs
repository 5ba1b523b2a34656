use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AdminUser;
use crate::models::{User, UserProfile};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::ids::parse_leading_int;
use crate::utils::response::success;

pub mod auth;
pub mod colleges;
pub mod events;
pub mod external;
pub mod users;

pub const CATEGORIES: [&str; 7] = [
    "Tech",
    "Cultural",
    "Sports",
    "Workshop",
    "Competition",
    "Seminar",
    "Conference",
];

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    database: &'static str,
}

pub async fn index() -> Response {
    let payload = json!({
        "name": "campus-events-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "auth": {
                "register": "POST /api/auth/register",
                "login": "POST /api/auth/login",
                "google": "GET /api/auth/google",
                "github": "GET /api/auth/github"
            },
            "events": {
                "list": "GET /api/events",
                "get": "GET /api/events/:id",
                "create": "POST /api/events (Admin)",
                "update": "PUT /api/events/:id (Admin)",
                "delete": "DELETE /api/events/:id (Admin)",
                "save": "POST /api/events/:id/save",
                "register": "POST /api/events/:id/register",
                "external": "GET /api/events/external",
                "externalSeatgeek": "GET /api/events/external/seatgeek"
            },
            "users": {
                "me": "GET /api/users/me",
                "update": "PUT /api/users/me",
                "savedEvents": "GET /api/users/:id/saved-events"
            },
            "colleges": "GET /api/colleges",
            "categories": "GET /api/categories",
            "ai": {
                "generateCaption": "POST /api/ai/generate-caption (Admin)"
            }
        }
    });

    success(payload, "Campus Events API")
}

pub async fn health_check(State(state): State<AppState>) -> Result<Response, AppError> {
    state.repo.ping().await?;

    let payload = HealthPayload {
        status: "ok",
        database: "connected",
    };
    Ok(success(payload, "Health check successful"))
}

pub async fn list_categories() -> Response {
    success(CATEGORIES, "Categories retrieved successfully")
}

#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub title: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
}

pub fn caption_for(title: &str, category: &str) -> String {
    format!(
        "Join us for {}, a {} event. Don't miss out on this exciting opportunity to learn, network, and grow!",
        title, category
    )
}

pub async fn generate_caption(
    AdminUser(_admin): AdminUser,
    Json(body): Json<CaptionRequest>,
) -> Result<Response, AppError> {
    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    let category = body.category.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() || category.is_empty() {
        return Err(AppError::ValidationError(
            "Title and category are required".to_string(),
        ));
    }

    let payload = CaptionResponse {
        caption: caption_for(title, category),
    };
    Ok(success(payload, "Caption generated"))
}

/// Path ids must be positive integers; `"12abc"` reads as 12.
pub(crate) fn parse_path_id(raw: &str) -> Result<i64, AppError> {
    parse_leading_int(raw)
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::InvalidId(raw.to_string()))
}

/// Public profile with the user's college joined in, when they have one.
pub(crate) async fn profile_with_college(
    state: &AppState,
    user: User,
) -> Result<UserProfile, AppError> {
    let college = match user.college_id {
        Some(id) => state.repo.find_college(id).await?,
        None => None,
    };
    Ok(UserProfile::new(user, college))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_id() {
        assert_eq!(parse_path_id("42").unwrap(), 42);
        assert_eq!(parse_path_id("7abc").unwrap(), 7);
        assert!(matches!(parse_path_id("0"), Err(AppError::InvalidId(_))));
        assert!(matches!(parse_path_id("-3"), Err(AppError::InvalidId(_))));
        assert!(matches!(parse_path_id("abc"), Err(AppError::InvalidId(_))));
    }

    #[test]
    fn test_caption_template() {
        assert_eq!(
            caption_for("Hack Night", "Tech"),
            "Join us for Hack Night, a Tech event. Don't miss out on this exciting opportunity to learn, network, and grow!"
        );
    }
}
