//! JWT issuance/verification and password hashing.

use chrono::Utc;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::CrystalPathError;
use crate::models::User;
use crate::Result;

/// Token claims. `exp` is a unix timestamp in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub exp: i64,
}

/// Stateless authentication helper shared across handlers.
#[derive(Clone)]
pub struct AuthService {
    secret: String,
    token_expiry_days: i64,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.jwt_secret().to_string(),
            token_expiry_days: config.auth.token_expiry_days,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| CrystalPathError::Auth(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| CrystalPathError::Auth(format!("password verification failed: {e}")))
    }

    /// Issue a signed token for a user.
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            exp: Utc::now().timestamp() + self.token_expiry_days * 24 * 60 * 60,
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CrystalPathError::Auth(format!("token encoding failed: {e}")))
    }

    /// Decode and validate a token, including expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| CrystalPathError::Auth(format!("invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn service() -> AuthService {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret".to_string();
        AuthService::new(&config)
    }

    fn user() -> User {
        User {
            id: 42,
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            prediction_credits: 1,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let token = auth.issue_token(&user()).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = service();
        let token = auth.issue_token(&user()).unwrap();

        let mut other_config = AppConfig::default();
        other_config.auth.jwt_secret = "different".to_string();
        let other = AuthService::new(&other_config);
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().verify_token("not.a.token").is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let auth = service();
        let hash = auth.hash_password("hunter2").unwrap();
        assert!(auth.verify_password("hunter2", &hash).unwrap());
        assert!(!auth.verify_password("wrong", &hash).unwrap());
    }
}
