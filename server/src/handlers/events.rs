use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::parse_path_id;
use crate::auth::{AdminUser, AuthUser};
use crate::models::external_event::is_external_id;
use crate::models::registration::RegistrationResponse;
use crate::models::{
    CreateEventRequest, EventChanges, EventDetails, EventPage, NewEvent, SaveOutcome,
    UpdateEventRequest, User,
};
use crate::query::{parse_timestamp, EventQuery};
use crate::repository::is_foreign_key_violation;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::ids::LooseId;
use crate::utils::response::{created, success};

#[derive(Serialize)]
struct SaveResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Response, AppError> {
    let (filter, page) = query.into_parts();
    tracing::debug!(?filter, ?page, "Listing events");

    let events = state.repo.list_events(&filter, &page).await?;
    let total = state.repo.count_events(&filter).await?;

    Ok(success(
        EventPage { total, events },
        "Events retrieved successfully",
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::ValidationError("Event ID is required".to_string()));
    }
    if is_external_id(&id) {
        return Err(AppError::ExternalEventId(id));
    }

    let event = find_event(&state, parse_path_id(&id)?).await?;
    Ok(success(event, "Event retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let (Some(title), Some(description), Some(category), Some(date)) = (
        non_empty(body.title),
        non_empty(body.description),
        non_empty(body.category),
        non_empty(body.date),
    ) else {
        return Err(AppError::ValidationError(
            "Title, description, category, and date are required".to_string(),
        ));
    };

    let date = parse_date(&date)?;
    let college_id = resolve_college(&state, body.college_name.as_deref(), body.college_id.as_ref())
        .await?
        .ok_or_else(|| {
            AppError::ValidationError("College name or college ID is required".to_string())
        })?;

    let new_event = NewEvent {
        title,
        description,
        category,
        date,
        location: non_empty(body.location),
        image_url: non_empty(body.image_url),
        college_id,
        created_by: admin.id,
        is_public: body.is_public.unwrap_or(true),
        tags: body.tags.unwrap_or_default(),
    };

    let event = state
        .repo
        .create_event(new_event)
        .await
        .map_err(college_reference_error)?;

    tracing::info!(event_id = event.event.id, created_by = admin.id, "Event created");
    Ok(created(event, "Event created successfully"))
}

pub async fn update_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let event_id = parse_path_id(&id)?;
    let existing = find_event(&state, event_id).await?;
    ensure_owner(&admin, &existing, "You can only edit your own events")?;

    let changes = EventChanges {
        title: non_empty(body.title),
        description: non_empty(body.description),
        category: non_empty(body.category),
        date: non_empty(body.date).as_deref().map(parse_date).transpose()?,
        location: body.location,
        image_url: body.image_url,
        college_id: resolve_college(&state, body.college_name.as_deref(), body.college_id.as_ref())
            .await?,
        is_public: body.is_public,
        tags: body.tags,
    };

    let event = state
        .repo
        .update_event(event_id, changes)
        .await
        .map_err(college_reference_error)?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id, "Event updated");
    Ok(success(event, "Event updated successfully"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_path_id(&id)?;
    let existing = find_event(&state, event_id).await?;
    ensure_owner(&admin, &existing, "You can only delete your own events")?;

    if !state.repo.delete_event(event_id).await? {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    tracing::info!(event_id, "Event deleted");
    Ok(success(DeleteResponse { success: true }, "Event deleted successfully"))
}

pub async fn save_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_path_id(&id)?;
    find_event(&state, event_id).await?;

    let payload = match state.repo.save_event(auth.user_id, event_id).await? {
        SaveOutcome::Saved => SaveResponse {
            success: true,
            message: None,
        },
        SaveOutcome::AlreadySaved => SaveResponse {
            success: true,
            message: Some("Event already saved"),
        },
    };
    Ok(success(payload, "Event saved"))
}

pub async fn register_for_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_path_id(&id)?;
    find_event(&state, event_id).await?;

    let outcome = state.repo.register_for_event(auth.user_id, event_id).await?;
    if outcome.created {
        tracing::info!(event_id, user_id = auth.user_id, "Registered for event");
    }
    Ok(success(
        RegistrationResponse::from(outcome),
        "Registration recorded",
    ))
}

async fn find_event(state: &AppState, id: i64) -> Result<EventDetails, AppError> {
    state
        .repo
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

fn ensure_owner(user: &User, event: &EventDetails, message: &str) -> Result<(), AppError> {
    if event.event.created_by != user.id {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

/// `collegeName` wins over `collegeId`. Returns `None` when neither is given.
async fn resolve_college(
    state: &AppState,
    college_name: Option<&str>,
    college_id: Option<&LooseId>,
) -> Result<Option<i64>, AppError> {
    if let Some(name) = college_name.map(str::trim).filter(|n| !n.is_empty()) {
        let college = state.repo.find_or_create_college(name).await?;
        return Ok(Some(college.id));
    }

    match college_id.filter(|id| id.is_present()) {
        Some(id) => id
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::ValidationError("Invalid college ID".to_string())),
        None => Ok(None),
    }
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
    parse_timestamp(raw).ok_or_else(|| AppError::ValidationError("Invalid date format".to_string()))
}

fn college_reference_error(err: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::ValidationError("College not found".to_string())
    } else {
        AppError::DatabaseError(err)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
