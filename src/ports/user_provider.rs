//! User Provider Port - Interface for resolving user profiles.
//!
//! Populates the reserved `user` context key (`{{user.email}}`,
//! `{{user.timezone}}`, …) and supplies the timezone for date built-ins.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{UserId, UserInfo};

/// Errors from the user provider.
#[derive(Debug, Clone, Error)]
pub enum UserProviderError {
    /// Backend failure during lookup.
    #[error("user lookup failed: {0}")]
    Lookup(String),
}

/// Port for retrieving user information.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Gets user information by id, `None` when unknown.
    async fn get_user_info(&self, user_id: &UserId) -> Result<Option<UserInfo>, UserProviderError>;
}
