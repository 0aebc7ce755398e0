use std::fmt;
use std::str::FromStr;

use auth::Authenticator;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::ValidationErrors;
use crate::user::errors::EmailError;
use crate::user::errors::PasswordRuleError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;
use crate::user::errors::UserNameError;

/// User aggregate entity.
///
/// Represents a registered borrower or librarian together with every
/// credential digest bound to the account. Plaintext tokens never live
/// here; they are return values of the operations that issue them.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub password_digest: Option<String>,
    pub remember_digest: Option<String>,
    pub activation_digest: Option<String>,
    pub activated: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub reset_digest: Option<String>,
    pub reset_sent_at: Option<DateTime<Utc>>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly registered, not yet activated user.
    pub fn new(
        name: UserName,
        email: EmailAddress,
        password_digest: String,
        activation_digest: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            password_digest: Some(password_digest),
            remember_digest: None,
            activation_digest: Some(activation_digest),
            activated: false,
            activated_at: None,
            reset_digest: None,
            reset_sent_at: None,
            role: Role::User,
            created_at,
        }
    }

    /// Stored digest for a token channel, if that channel was ever established.
    pub fn digest(&self, kind: TokenKind) -> Option<&str> {
        match kind {
            TokenKind::Remember => self.remember_digest.as_deref(),
            TokenKind::Activation => self.activation_digest.as_deref(),
            TokenKind::Reset => self.reset_digest.as_deref(),
        }
    }

    /// Check a presented token against the digest of the given channel.
    ///
    /// Always false when the digest is absent.
    pub fn authenticated(
        &self,
        kind: TokenKind,
        token: &str,
        authenticator: &Authenticator,
    ) -> bool {
        authenticator.matches(token, self.digest(kind))
    }

    /// Check a plaintext password. False when no password digest is set.
    pub fn password_matches(&self, password: &str, authenticator: &Authenticator) -> bool {
        authenticator.matches(password, self.password_digest.as_deref())
    }

    /// Mark the account active and drop the activation digest.
    ///
    /// A second call is a no-op, so the original activation time is kept.
    ///
    /// # Returns
    /// Whether anything changed
    pub fn activate(&mut self, now: DateTime<Utc>) -> bool {
        if self.activated && self.activation_digest.is_none() {
            return false;
        }
        if !self.activated {
            self.activated = true;
            self.activated_at = Some(now);
        }
        self.activation_digest = None;
        true
    }

    pub fn remember(&mut self, remember_digest: String) {
        self.remember_digest = Some(remember_digest);
    }

    pub fn forget(&mut self) {
        self.remember_digest = None;
    }

    pub fn start_password_reset(&mut self, reset_digest: String, now: DateTime<Utc>) {
        self.reset_digest = Some(reset_digest);
        self.reset_sent_at = Some(now);
    }

    pub fn clear_password_reset(&mut self) {
        self.reset_digest = None;
        self.reset_sent_at = None;
    }

    /// Whether the pending reset is older than `window` at `now`.
    ///
    /// A user without `reset_sent_at` has nothing to honour and counts as expired.
    pub fn reset_expired_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.reset_sent_at {
            Some(sent_at) => now - sent_at > window,
            None => true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Token channels a user may hold a digest for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Remember,
    Activation,
    Reset,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account role. Persisted as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Role::User => 0,
            Role::Admin => 1,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, RoleError> {
        match code {
            0 => Ok(Role::User),
            1 => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name value type
///
/// Non-blank and bounded in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    pub const DEFAULT_MAX_LENGTH: usize = 50;

    /// Create a validated display name.
    ///
    /// # Errors
    /// * `Blank` - Empty or whitespace only
    /// * `TooLong` - More than `max_length` characters
    pub fn new(name: String, max_length: usize) -> Result<Self, UserNameError> {
        if name.trim().is_empty() {
            return Err(UserNameError::Blank);
        }
        let length = name.chars().count();
        if length > max_length {
            return Err(UserNameError::TooLong {
                max: max_length,
                actual: length,
            });
        }
        Ok(Self(name))
    }

    /// Rebuild a name that was validated before it was stored.
    pub fn from_stored(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Always held in lowercase; format checked with an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub const DEFAULT_MAX_LENGTH: usize = 255;

    /// Create a normalized, validated email address.
    ///
    /// # Errors
    /// * `Blank` - Empty or whitespace only
    /// * `TooLong` - More than `max_length` characters
    /// * `InvalidFormat` - Not a valid address
    pub fn new(email: String, max_length: usize) -> Result<Self, EmailError> {
        if email.trim().is_empty() {
            return Err(EmailError::Blank);
        }
        let email = email.to_lowercase();
        let length = email.chars().count();
        if length > max_length {
            return Err(EmailError::TooLong {
                max: max_length,
                actual: length,
            });
        }
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Lowercase a lookup key without validating it.
    pub fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Rebuild an address that was validated before it was stored.
    pub fn from_stored(email: String) -> Self {
        Self(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfied the length rule.
///
/// Only ever passed to the hasher; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const DEFAULT_MIN_LENGTH: usize = 6;

    /// # Errors
    /// * `Blank` - Empty or whitespace only
    /// * `TooShort` - Fewer than `min_length` characters
    pub fn new(password: String, min_length: usize) -> Result<Self, PasswordRuleError> {
        if password.trim().is_empty() {
            return Err(PasswordRuleError::Blank);
        }
        let length = password.chars().count();
        if length < min_length {
            return Err(PasswordRuleError::TooShort {
                min: min_length,
                actual: length,
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Account rules that deployments may tune.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPolicy {
    pub name_max_length: usize,
    pub email_max_length: usize,
    pub password_min_length: usize,
    pub reset_expiry: Duration,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            name_max_length: UserName::DEFAULT_MAX_LENGTH,
            email_max_length: EmailAddress::DEFAULT_MAX_LENGTH,
            password_min_length: Password::DEFAULT_MIN_LENGTH,
            reset_expiry: Duration::hours(2),
        }
    }
}

impl AccountPolicy {
    /// Validate every registration field, collecting all failures.
    ///
    /// # Errors
    /// Field map keyed by `name`, `email` and `password`
    pub fn validate_registration(
        &self,
        command: RegisterCommand,
    ) -> Result<NewAccount, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = UserName::new(command.name, self.name_max_length)
            .map_err(|e| errors.add("name", e.to_string()))
            .ok();
        let email = EmailAddress::new(command.email, self.email_max_length)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let password = Password::new(command.password, self.password_min_length)
            .map_err(|e| errors.add("password", e.to_string()))
            .ok();

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => Ok(NewAccount {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }

    /// Validate a replacement password.
    ///
    /// # Errors
    /// Field map keyed by `password`
    pub fn validate_password(&self, password: String) -> Result<Password, ValidationErrors> {
        Password::new(password, self.password_min_length)
            .map_err(|e| ValidationErrors::single("password", e.to_string()))
    }
}

/// Raw signup input, exactly as received.
#[derive(Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Registration input that passed validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: Password,
}

/// Outcome of a successful signup.
///
/// `activation_token` is the only copy of the plaintext token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub activation_token: String,
}
