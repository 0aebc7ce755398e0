use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Payload of a signed session token.
///
/// Carries just enough to authorize a request without a store lookup:
/// the principal's id, display name and role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Display name at issue time
    pub name: String,

    /// Role name ("user" or "admin")
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims valid for `lifetime_hours` from `issued_at`.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `name` - Display name
    /// * `role` - Role name
    /// * `issued_at` - Issue instant
    /// * `lifetime_hours` - Hours until the token expires
    pub fn new(
        user_id: impl ToString,
        name: impl Into<String>,
        role: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime_hours: i64,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            name: name.into(),
            role: role.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(lifetime_hours)).timestamp(),
        }
    }

    /// Claims issued now.
    pub fn for_user(
        user_id: impl ToString,
        name: impl Into<String>,
        role: impl Into<String>,
        lifetime_hours: i64,
    ) -> Self {
        Self::new(user_id, name, role, Utc::now(), lifetime_hours)
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Check if the token is expired at `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
