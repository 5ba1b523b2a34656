use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use super::{parse_path_id, profile_with_college};
use crate::auth::password::hash_password;
use crate::auth::AuthUser;
use crate::models::user::{CurrentUser, UpdateProfileRequest};
use crate::models::UserChanges;
use crate::repository::is_foreign_key_violation;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, AppError> {
    let user = state
        .repo
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let saved_events = state.repo.saved_event_ids(user.id).await?;
    let registrations = state.repo.registrations_with_events(user.id).await?;
    let profile = profile_with_college(&state, user).await?;

    Ok(success(
        CurrentUser {
            profile,
            saved_events,
            registrations,
        },
        "User retrieved successfully",
    ))
}

pub async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Response, AppError> {
    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    let changes = UserChanges {
        name: body.name.filter(|n| !n.trim().is_empty()),
        college_id: body
            .college_id
            .filter(|id| id.is_present())
            .and_then(|id| id.as_i64()),
        password_hash,
    };

    let user = state
        .repo
        .update_user(auth.user_id, changes)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::ValidationError("College not found".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = user.id, "Profile updated");
    let profile = profile_with_college(&state, user).await?;
    Ok(success(profile, "Profile updated successfully"))
}

pub async fn saved_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user_id = parse_path_id(&id)?;
    if user_id != auth.user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let events = state.repo.saved_events(user_id).await?;
    Ok(success(events, "Saved events retrieved successfully"))
}
