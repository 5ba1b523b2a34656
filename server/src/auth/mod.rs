//! Bearer-token authentication as axum extractors.
//!
//! `AuthUser` only proves the token is valid. `AdminUser` additionally loads
//! the account and checks its role.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::models::User;
use crate::state::AppState;
use crate::utils::AppError;

pub mod jwt;
pub mod password;

use jwt::{verify_token, TokenError};

/// The caller's id, taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// An authenticated caller whose stored role is `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut split = value.splitn(2, ' ');
    match (split.next(), split.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.trim()).filter(|t| !t.is_empty())
        }
        _ => None,
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::AuthError("Access token required".to_string()))?;

        match verify_token(state.config.jwt_secret.as_deref(), token) {
            Ok(claims) => Ok(AuthUser {
                user_id: claims.user_id,
            }),
            Err(TokenError::MissingSecret) => Err(AppError::InternalServerError(
                "JWT secret not configured".to_string(),
            )),
            Err(TokenError::Invalid(e)) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Err(AppError::Forbidden("Invalid or expired token".to_string()))
            }
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser { user_id } = AuthUser::from_request_parts(parts, state).await?;

        match state.repo.find_user_by_id(user_id).await? {
            Some(user) if user.is_admin() => Ok(AdminUser(user)),
            _ => Err(AppError::Forbidden("Admin access required".to_string())),
        }
    }
}
