use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("user not found: {0}")]
    UsernameNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("login required")]
    LoginRequired { next: String },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_)
                | DomainError::UsernameNotFound(_)
                | DomainError::GroupNotFound(_)
                | DomainError::PostNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants() {
        assert!(DomainError::PostNotFound(1).is_not_found());
        assert!(DomainError::UsernameNotFound("ghost".into()).is_not_found());
        assert!(!DomainError::Forbidden.is_not_found());
        assert!(!DomainError::LoginRequired { next: "/".into() }.is_not_found());
    }
}
