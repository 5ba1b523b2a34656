use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Invalid or expired token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signs an HS256 token for `user_id`, valid for one hour.
pub fn issue_token(secret: Option<&str>, user_id: i64) -> Result<String, TokenError> {
    let secret = secret.ok_or(TokenError::MissingSecret)?;
    let now = Utc::now();
    let claims = Claims {
        user_id,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn verify_token(secret: Option<&str>, token: &str) -> Result<Claims, TokenError> {
    let secret = secret.ok_or(TokenError::MissingSecret)?;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: Option<&str> = Some("unit-test-secret");

    #[test]
    fn test_issue_and_verify() {
        let token = issue_token(SECRET, 17).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.user_id, 17);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(SECRET, 1).unwrap();
        assert!(matches!(
            verify_token(Some("other"), &token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let past = Utc::now() - Duration::hours(3);
        let claims = Claims {
            user_id: 1,
            iat: past.timestamp(),
            exp: (past + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert!(verify_token(SECRET, &token).is_err());
    }

    #[test]
    fn test_missing_secret() {
        assert!(matches!(issue_token(None, 1), Err(TokenError::MissingSecret)));
        assert!(matches!(
            verify_token(None, "x.y.z"),
            Err(TokenError::MissingSecret)
        ));
    }
}
