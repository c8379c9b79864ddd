use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.to_lowercase(), hash);
        self.repo.create(user).await
    }

    /// Checks the credentials and issues a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Resolves a session token to its user. Any failure means "anonymous".
    pub async fn authenticate(&self, token: &str) -> Option<User> {
        let claims = self.keys.verify_token(token).ok()?;
        self.repo.find_by_id(claims.sub).await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryRepository;
    use chrono::Duration;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryRepository::new()),
            JwtKeys::new("test-secret".into(), Duration::hours(1)),
        )
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        let user = auth
            .register("alice".into(), "Alice@Example.com".into(), "password123".into())
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "password123");

        let token = auth.login("alice", "password123").await.unwrap();
        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.register("bob".into(), String::new(), "password123".into())
            .await
            .unwrap();
        let err = auth.login("bob", "nope").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
        let err = auth.login("nobody", "password123").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn garbage_token_is_anonymous() {
        assert!(service().authenticate("not-a-token").await.is_none());
    }
}
