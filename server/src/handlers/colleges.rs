use axum::extract::State;
use axum::response::Response;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn list_colleges(State(state): State<AppState>) -> Result<Response, AppError> {
    let colleges = state.repo.list_colleges().await?;
    Ok(success(colleges, "Colleges retrieved successfully"))
}
