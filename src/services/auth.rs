//! Password hashing and access tokens.

use std::sync::OnceLock;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

#[derive(Debug)]
pub struct AuthService {
    secret: String,
    token_expiration: Duration,
    bcrypt_cost: u32,
    dummy_hash: OnceLock<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    pub fn new(secret: String, token_expiration_hours: u64, bcrypt_cost: u32) -> Self {
        Self {
            secret,
            token_expiration: Duration::hours(token_expiration_hours as i64),
            bcrypt_cost,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Burn the same bcrypt work as a real check when there is no user to
    /// check against. Always returns `false`.
    pub fn verify_against_dummy(&self, password: &str) -> bool {
        let hash = self.dummy_hash.get_or_init(|| {
            bcrypt::hash("ducket-dummy-password", self.bcrypt_cost).unwrap_or_default()
        });
        let _ = bcrypt::verify(password, hash);
        false
    }

    pub fn create_access_token(&self, user_id: i32) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.token_expiration).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }

    /// Decode a token and return the user id it was issued for.
    pub fn verify_access_token(&self, token: &str) -> Result<i32> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        token_data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("secret".to_string(), 24, 4)
    }

    #[test]
    fn test_password_hashing() {
        let auth = service();
        let hash = auth.hash_password("correct horse").unwrap();

        assert!(auth.verify_password("correct horse", &hash).unwrap());
        assert!(!auth.verify_password("battery staple", &hash).unwrap());
        assert!(!auth.verify_against_dummy("correct horse"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let token = auth.create_access_token(42).unwrap();
        assert_eq!(auth.verify_access_token(&token).unwrap(), 42);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = AuthService::new("other".to_string(), 24, 4)
            .create_access_token(1)
            .unwrap();
        let result = service().verify_access_token(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = service();
        let now = Utc::now();
        let claims = Claims {
            sub: "1".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("secret".as_bytes()),
        )
        .unwrap();

        assert!(auth.verify_access_token(&token).is_err());
    }
}
