//! User information supplied by the user-provider port.

use serde::{Deserialize, Serialize};

use super::UserId;

/// User profile fields exposed to templates under the reserved `user` key.
///
/// `timezone` is an IANA zone name and defaults to UTC. Optional fields are
/// omitted from the serialized form entirely so that `exists` checks on
/// `user.phone` see *absent* rather than `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier.
    pub id: UserId,

    /// Primary email address.
    pub email: String,

    /// IANA timezone name (e.g. "America/Denver").
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Phone number, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Display name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl UserInfo {
    /// Creates a UserInfo with the UTC default timezone.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            timezone: default_timezone(),
            phone: None,
            name: None,
        }
    }

    /// Sets the timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
