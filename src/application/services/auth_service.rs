//! Password hashing and access token issuance.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
    iat: u64,
}

/// Hashes passwords with Argon2 and signs HS256 bearer tokens whose subject
/// is the user id.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(jwt_secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// Hashes a raw password into an Argon2 PHC string with a random salt.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if hashing fails.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password");
                AppError::internal("Failed to hash password", json!({}))
            })
    }

    /// Checks `candidate` against a stored PHC string.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] on mismatch and [`AppError::Internal`]
    /// if the stored hash cannot be parsed.
    pub fn verify_password(&self, candidate: &str, stored_hash: &str) -> Result<(), AppError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::error!(error = %e, "Stored password hash is malformed");
            AppError::internal("Failed to verify password", json!({}))
        })?;

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|err| match err {
                PasswordHashError::Password => invalid_credentials(),
                other => {
                    tracing::error!(error = %other, "Password verification failed");
                    AppError::internal("Failed to verify password", json!({}))
                }
            })
    }

    /// Signs a token for `user_id` that expires after the configured lifetime.
    pub fn issue_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AppError::internal("System clock is before UNIX_EPOCH", json!({})))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.as_secs(),
            exp: (now + self.token_ttl).as_secs(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AppError::internal("Failed to sign token", json!({}))
        })
    }

    /// Validates a bearer token and returns the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for expired, forged or malformed tokens.
    pub fn verify_token(&self, token: &str) -> Result<String, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|err| {
                tracing::debug!(error = ?err.kind(), "Rejected access token");
                AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid or expired token" }))
            })
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

pub(crate) fn invalid_credentials() -> AppError {
    AppError::unauthorized(
        "Username or password is wrong",
        json!({ "reason": "Invalid credentials" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-signing-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_password_round_trip() {
        let auth = service();
        let hash = auth.hash_password("rahasia").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("rahasia", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_is_unauthorized() {
        let auth = service();
        let hash = auth.hash_password("rahasia").unwrap();

        let result = auth.verify_password("salah", &hash);
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_hashes_are_salted() {
        let auth = service();
        assert_ne!(
            auth.hash_password("same").unwrap(),
            auth.hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_malformed_stored_hash_is_internal() {
        let result = service().verify_password("x", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let token = auth.issue_token("khannedy").unwrap();

        assert_eq!(auth.verify_token(&token).unwrap(), "khannedy");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = AuthService::new("secret-a", Duration::from_secs(60))
            .issue_token("khannedy")
            .unwrap();

        let result = AuthService::new("secret-b", Duration::from_secs(60)).verify_token(&token);
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = service();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: "khannedy".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &auth.encoding_key).unwrap();

        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(service().verify_token("not.a.jwt").is_err());
    }
}
