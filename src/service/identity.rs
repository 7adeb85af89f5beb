//! Identity Resolution
//!
//! Turns a caller credential into an `Actor`. Resolution happens before any
//! read-modify-write, so a bad credential never leaves partial state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Actor, DomainError, DomainResult};
use crate::repository::UserRepository;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credential: &str) -> DomainResult<Actor>;
}

/// Static bearer tokens mapped to usernames, backed by the users table
pub struct TokenIdentity {
    tokens: HashMap<String, String>,
    users: Arc<UserRepository>,
}

impl TokenIdentity {
    pub fn new(tokens: HashMap<String, String>, users: Arc<UserRepository>) -> Self {
        Self { tokens, users }
    }
}

fn strip_bearer(credential: &str) -> &str {
    let trimmed = credential.trim();
    trimmed.strip_prefix("Bearer ").unwrap_or(trimmed).trim()
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn resolve(&self, credential: &str) -> DomainResult<Actor> {
        let token = strip_bearer(credential);
        let username = self
            .tokens
            .get(token)
            .ok_or_else(|| DomainError::PermissionDenied("Invalid credential".into()))?;

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::PermissionDenied(format!("Unknown user '{}'", username)))?;

        Ok(Actor::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::init_db;
    use std::path::PathBuf;

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("  abc "), "abc");
    }

    #[tokio::test]
    async fn test_resolve_tokens() {
        let db = init_db(&PathBuf::from(":memory:")).await.unwrap();
        let users = Arc::new(UserRepository::new(db.connection()));
        let anna = users.create("anna").await.unwrap();

        let mut tokens = HashMap::new();
        tokens.insert("t-anna".to_string(), "anna".to_string());
        tokens.insert("t-ghost".to_string(), "ghost".to_string());
        let identity = TokenIdentity::new(tokens, users);

        let actor = identity.resolve("Bearer t-anna").await.unwrap();
        assert_eq!(actor, Actor::new(anna.id, "anna"));

        assert!(matches!(
            identity.resolve("nope").await,
            Err(DomainError::PermissionDenied(_))
        ));
        assert!(matches!(
            identity.resolve("t-ghost").await,
            Err(DomainError::PermissionDenied(_))
        ));
    }
}
