use bcrypt::{hash, verify, DEFAULT_COST};

use crate::utils::ApiError;

/// Hashing and verification both run on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| ApiError::storage("Error while hashing the password", e))?
        .map_err(|e| ApiError::storage("Error while hashing the password", e))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| ApiError::storage("Error while checking the password", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("correct horse".to_string()).await.unwrap();
        assert_ne!(hashed, "correct horse");

        assert!(verify_password("correct horse".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("pw".to_string(), "plain-text".to_string()).await.unwrap());
    }
}
