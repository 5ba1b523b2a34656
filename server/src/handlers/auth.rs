use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;

use super::profile_with_college;
use crate::auth::jwt::{issue_token, TokenError};
use crate::auth::password::{hash_password, verify_password};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest};
use crate::models::{NewUser, Role, UserProfile};
use crate::oauth::{self, OAuthError, Provider};
use crate::repository::is_unique_violation;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::ValidationError(
            "Email and password are required".to_string(),
        ));
    };

    let role = match body.role.as_deref().filter(|r| !r.is_empty()) {
        None => Role::Student,
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            AppError::ValidationError("Role must be either \"student\" or \"admin\"".to_string())
        })?,
    };

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let new_user = NewUser {
        email,
        password_hash: hash_password(password).await?,
        name: body.name.filter(|n| !n.trim().is_empty()),
        role,
        college_id: body
            .college_id
            .filter(|id| id.is_present())
            .and_then(|id| id.as_i64()),
    };

    // The email check above can race a concurrent signup; the unique index decides.
    let user = state.repo.create_user(new_user).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("User already exists".to_string())
        } else {
            AppError::DatabaseError(e)
        }
    })?;

    let token = token_for(&state, user.id)?;
    let profile = profile_with_college(&state, user).await?;

    tracing::info!(user_id = profile.id, role = %profile.role, "User registered");
    Ok(created(
        AuthResponse {
            token,
            user: profile,
        },
        "User registered successfully",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::ValidationError(
            "Email and password are required".to_string(),
        ));
    };

    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !user.has_password() || !verify_password(password, user.password.clone()).await? {
        return Err(invalid());
    }

    let token = token_for(&state, user.id)?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(success(
        AuthResponse {
            token,
            user: UserProfile::new(user, None),
        },
        "Login successful",
    ))
}

pub async fn google_login(State(state): State<AppState>) -> Response {
    start_oauth(&state, Provider::Google)
}

pub async fn github_login(State(state): State<AppState>) -> Response {
    start_oauth(&state, Provider::GitHub)
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    finish_oauth(&state, Provider::Google, query.code.as_deref()).await
}

pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    finish_oauth(&state, Provider::GitHub, query.code.as_deref()).await
}

fn start_oauth(state: &AppState, provider: Provider) -> Response {
    match oauth::authorize_url(provider, &state.config) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => AppError::InternalServerError(e.to_string()).into_response(),
    }
}

async fn finish_oauth(state: &AppState, provider: Provider, code: Option<&str>) -> Redirect {
    let frontend_url = &state.config.frontend_url;
    match oauth_sign_in(state, provider, code).await {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            tracing::error!(provider = provider.name(), error = %e, "OAuth sign-in failed");
            Redirect::to(&oauth::failure_redirect(frontend_url, e.redirect_code()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SignInError {
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl SignInError {
    fn redirect_code(&self) -> &'static str {
        match self {
            SignInError::OAuth(e) => e.redirect_code(),
            _ => "oauth_failed",
        }
    }
}

async fn oauth_sign_in(
    state: &AppState,
    provider: Provider,
    code: Option<&str>,
) -> Result<String, SignInError> {
    let profile = oauth::fetch_profile(&state.http, provider, &state.config, code).await?;
    let user = state
        .repo
        .find_or_create_oauth_user(&profile.email, &profile.name)
        .await?;
    let token = issue_token(state.config.jwt_secret.as_deref(), user.id)?;

    tracing::info!(user_id = user.id, provider = provider.name(), "OAuth sign-in");
    Ok(oauth::success_redirect(&state.config.frontend_url, &token, &user)?.to_string())
}

fn token_for(state: &AppState, user_id: i64) -> Result<String, AppError> {
    issue_token(state.config.jwt_secret.as_deref(), user_id)
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}
