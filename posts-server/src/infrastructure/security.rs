use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing material for session tokens, built once at start-up.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: String, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Lifetime of issued tokens, also used as the session cookie max-age.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn generate_token(&self, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks signature and expiry. Any failure means the token is unusable.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

/// Hashes a password into an Argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is
/// unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ttl: Duration) -> JwtKeys {
        JwtKeys::new("secret".into(), ttl)
    }

    #[test]
    fn token_carries_user_id_and_lifetime() {
        let keys = keys(Duration::hours(2));
        let user_id = Uuid::new_v4();
        let claims = keys
            .verify_token(&keys.generate_token(user_id).unwrap())
            .unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtKeys::new("another".into(), Duration::hours(1));
        let token = other.generate_token(Uuid::new_v4()).unwrap();
        assert!(keys(Duration::hours(1)).verify_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys(Duration::seconds(-5));
        let token = keys.generate_token(Uuid::new_v4()).unwrap();
        assert!(keys.verify_token(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(keys(Duration::hours(1)).verify_token("not.a.token").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_password("anything", "plain-text").is_err());
    }
}
