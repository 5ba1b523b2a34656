use crate::utils::AppError;

pub const BCRYPT_COST: u32 = 10;

/// Hashes on the blocking pool; bcrypt at cost 10 takes tens of milliseconds.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// `false` for a malformed stored hash, including the empty hash of OAuth
/// accounts.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    if hash.is_empty() {
        return Ok(false);
    }

    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?;

    Ok(verified.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("s3cret".to_string()).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_hash_never_verifies() {
        assert!(!verify_password(String::new(), String::new()).await.unwrap());
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string())
            .await
            .unwrap());
    }
}
