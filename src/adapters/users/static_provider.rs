//! Static user provider implementation.
//!
//! Serves user profiles from a fixed in-memory map. Useful for tests and
//! single-tenant deployments where the profile set is known up front.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{UserId, UserInfo};
use crate::ports::{UserProvider, UserProviderError};

/// In-memory implementation of the UserProvider port.
///
/// Thread-safe via internal `Mutex`.
#[derive(Default)]
pub struct StaticUserProvider {
    users: Mutex<HashMap<UserId, UserInfo>>,
}

impl StaticUserProvider {
    /// Creates a provider with no users.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user profile.
    pub fn insert(&self, user: UserInfo) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_user(self, user: UserInfo) -> Self {
        self.insert(user);
        self
    }
}

#[async_trait]
impl UserProvider for StaticUserProvider {
    async fn get_user_info(&self, user_id: &UserId) -> Result<Option<UserInfo>, UserProviderError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_known_users() {
        let user_id = UserId::new("user-1").unwrap();
        let provider = StaticUserProvider::new()
            .with_user(UserInfo::new(user_id.clone(), "a@example.com").with_name("Alice"));

        let info = provider.get_user_info(&user_id).await.unwrap().unwrap();
        assert_eq!(info.email, "a@example.com");
        assert_eq!(info.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn unknown_users_are_none() {
        let provider = StaticUserProvider::new();
        let missing = UserId::new("ghost").unwrap();
        assert!(provider.get_user_info(&missing).await.unwrap().is_none());
    }
}
