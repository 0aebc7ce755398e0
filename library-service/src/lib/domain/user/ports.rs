use async_trait::async_trait;

use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AccountError;
use crate::user::errors::MailerError;

/// Port for account and credential operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Sign up a new, not yet activated user.
    ///
    /// # Arguments
    /// * `command` - Raw name, email and password
    ///
    /// # Returns
    /// Created user and the plaintext activation token
    ///
    /// # Errors
    /// * `Validation` - One or more fields are invalid
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Registration, AccountError>;

    /// Verify an email/password pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountError>;

    /// Issue a remember token and store its digest.
    ///
    /// # Returns
    /// Plaintext remember token
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn remember(&self, id: &UserId) -> Result<String, AccountError>;

    /// Drop the remember digest.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn forget(&self, id: &UserId) -> Result<(), AccountError>;

    /// Check a remember token. False when no remember digest is stored.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn is_remembered(&self, id: &UserId, token: &str) -> Result<bool, AccountError>;

    /// Persistent login from a remember token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or token mismatch
    async fn login_with_remember_token(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<User, AccountError>;

    /// Activate the account and clear the activation digest. Idempotent.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn activate(&self, id: &UserId) -> Result<User, AccountError>;

    /// Activate from an emailed link.
    ///
    /// # Errors
    /// * `InvalidActivationLink` - Unknown user, already active, or token mismatch
    async fn activate_with_token(&self, id: &UserId, token: &str) -> Result<User, AccountError>;

    /// Issue a reset token, storing its digest and the issue time.
    ///
    /// # Returns
    /// Plaintext reset token
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn request_password_reset(&self, id: &UserId) -> Result<String, AccountError>;

    /// Look up a user by email, issue a reset token and mail it.
    ///
    /// # Errors
    /// * `NotFound` - No user with this email
    async fn forgot_password(&self, email: &str) -> Result<(), AccountError>;

    /// Whether the pending reset is older than the configured window.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn is_reset_expired(&self, id: &UserId) -> Result<bool, AccountError>;

    /// Clear reset digest and timestamp.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn clear_password_reset(&self, id: &UserId) -> Result<(), AccountError>;

    /// Replace the password using a reset token.
    ///
    /// # Errors
    /// * `InvalidResetLink` - Unknown/inactive user or token mismatch
    /// * `ExpiredToken` - Reset window elapsed; reset state is cleared
    /// * `Validation` - New password breaks the password rules
    async fn reset_password(
        &self,
        id: &UserId,
        token: &str,
        new_password: String,
    ) -> Result<User, AccountError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn get_user(&self, id: &UserId) -> Result<User, AccountError>;

    /// Delete a user; their borrow requests survive with no owner.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn delete_user(&self, id: &UserId) -> Result<(), AccountError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, AccountError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError>;

    /// Retrieve user by (lowercase) email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;

    /// Write back every mutable column of an existing user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    async fn update(&self, user: User) -> Result<User, AccountError>;

    /// Remove a user in a single transaction.
    ///
    /// Borrow requests of the user have their owner reference nulled;
    /// comments, bookmarks and followed authors are deleted with the user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn delete(&self, id: &UserId) -> Result<(), AccountError>;
}

/// Outgoing mail for account flows.
///
/// Failures are reported to the caller, which logs them; they never undo
/// the account change that triggered the mail.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Deliver the activation link.
    async fn send_activation_email(&self, user: &User, token: &str) -> Result<(), MailerError>;

    /// Deliver the password reset link.
    async fn send_password_reset_email(
        &self,
        user: &User,
        token: &str,
    ) -> Result<(), MailerError>;
}
