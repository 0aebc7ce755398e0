use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::errors::ValidationErrors;
use crate::domain::user::models::AccountPolicy;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::TokenKind;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AccountError;
use crate::user::ports::AccountServicePort;
use crate::user::ports::Mailer;
use crate::user::ports::UserRepository;

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
pub struct AccountService<UR, M>
where
    UR: UserRepository,
    M: Mailer,
{
    repository: Arc<UR>,
    mailer: Arc<M>,
    authenticator: Arc<Authenticator>,
    policy: AccountPolicy,
}

impl<UR, M> AccountService<UR, M>
where
    UR: UserRepository,
    M: Mailer,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `mailer` - Outgoing mail implementation
    /// * `authenticator` - Digest and token primitives
    /// * `policy` - Field limits and reset window
    pub fn new(
        repository: Arc<UR>,
        mailer: Arc<M>,
        authenticator: Arc<Authenticator>,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            repository,
            mailer,
            authenticator,
            policy,
        }
    }

    async fn load(&self, id: &UserId) -> Result<User, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    async fn issue_reset(&self, mut user: User) -> Result<(User, String), AccountError> {
        let issued = self.authenticator.issue_token()?;
        user.start_password_reset(issued.digest, Utc::now());
        let user = self.repository.update(user).await?;
        Ok((user, issued.token))
    }
}

fn email_taken() -> AccountError {
    AccountError::Validation(ValidationErrors::single("email", "has already been taken"))
}

#[async_trait]
impl<UR, M> AccountServicePort for AccountService<UR, M>
where
    UR: UserRepository,
    M: Mailer,
{
    async fn register(&self, command: RegisterCommand) -> Result<Registration, AccountError> {
        let account = self.policy.validate_registration(command)?;

        if self
            .repository
            .find_by_email(account.email.as_str())
            .await?
            .is_some()
        {
            return Err(email_taken());
        }

        let password_digest = self.authenticator.digest(account.password.as_str())?;
        let activation = self.authenticator.issue_token()?;

        let user = User::new(
            account.name,
            account.email,
            password_digest,
            activation.digest,
            Utc::now(),
        );

        let created_user = self
            .repository
            .create(user)
            .await
            .map_err(|e| match e {
                AccountError::EmailAlreadyExists(_) => email_taken(),
                other => other,
            })?;

        tracing::info!(user_id = %created_user.id, "User registered");

        if let Err(e) = self
            .mailer
            .send_activation_email(&created_user, &activation.token)
            .await
        {
            tracing::error!(
                user_id = %created_user.id,
                error = %e,
                "Failed to send activation email"
            );
        }

        Ok(Registration {
            user: created_user,
            activation_token: activation.token,
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let user = self
            .repository
            .find_by_email(&EmailAddress::normalize(email))
            .await?;

        match user {
            Some(user) if user.password_matches(password, &self.authenticator) => Ok(user),
            Some(_) => Err(AccountError::InvalidCredentials),
            None => {
                self.authenticator.reject(password);
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    async fn remember(&self, id: &UserId) -> Result<String, AccountError> {
        let mut user = self.load(id).await?;
        let issued = self.authenticator.issue_token()?;
        user.remember(issued.digest);
        self.repository.update(user).await?;
        Ok(issued.token)
    }

    async fn forget(&self, id: &UserId) -> Result<(), AccountError> {
        let mut user = self.load(id).await?;
        user.forget();
        self.repository.update(user).await?;
        Ok(())
    }

    async fn is_remembered(&self, id: &UserId, token: &str) -> Result<bool, AccountError> {
        let user = self.load(id).await?;
        Ok(user.authenticated(TokenKind::Remember, token, &self.authenticator))
    }

    async fn login_with_remember_token(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<User, AccountError> {
        match self.repository.find_by_id(id).await? {
            Some(user) if user.authenticated(TokenKind::Remember, token, &self.authenticator) => {
                Ok(user)
            }
            _ => Err(AccountError::InvalidCredentials),
        }
    }

    async fn activate(&self, id: &UserId) -> Result<User, AccountError> {
        let mut user = self.load(id).await?;
        if user.activate(Utc::now()) {
            self.repository.update(user).await
        } else {
            Ok(user)
        }
    }

    async fn activate_with_token(&self, id: &UserId, token: &str) -> Result<User, AccountError> {
        let mut user = match self.repository.find_by_id(id).await? {
            Some(user)
                if !user.activated
                    && user.authenticated(TokenKind::Activation, token, &self.authenticator) =>
            {
                user
            }
            _ => return Err(AccountError::InvalidActivationLink),
        };

        user.activate(Utc::now());
        let user = self.repository.update(user).await?;
        tracing::info!(user_id = %user.id, "Account activated");
        Ok(user)
    }

    async fn request_password_reset(&self, id: &UserId) -> Result<String, AccountError> {
        let user = self.load(id).await?;
        let (_, token) = self.issue_reset(user).await?;
        Ok(token)
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let email = EmailAddress::normalize(email);
        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AccountError::NotFound(email.clone()))?;

        let (user, token) = self.issue_reset(user).await?;

        if let Err(e) = self.mailer.send_password_reset_email(&user, &token).await {
            tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to send password reset email"
            );
        }

        Ok(())
    }

    async fn is_reset_expired(&self, id: &UserId) -> Result<bool, AccountError> {
        let user = self.load(id).await?;
        Ok(user.reset_expired_at(Utc::now(), self.policy.reset_expiry))
    }

    async fn clear_password_reset(&self, id: &UserId) -> Result<(), AccountError> {
        let mut user = self.load(id).await?;
        user.clear_password_reset();
        self.repository.update(user).await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        id: &UserId,
        token: &str,
        new_password: String,
    ) -> Result<User, AccountError> {
        let mut user = match self.repository.find_by_id(id).await? {
            Some(user)
                if user.activated
                    && user.authenticated(TokenKind::Reset, token, &self.authenticator) =>
            {
                user
            }
            _ => return Err(AccountError::InvalidResetLink),
        };

        if user.reset_expired_at(Utc::now(), self.policy.reset_expiry) {
            user.clear_password_reset();
            self.repository.update(user).await?;
            return Err(AccountError::ExpiredToken);
        }

        let password = self.policy.validate_password(new_password)?;
        user.password_digest = Some(self.authenticator.digest(password.as_str())?);
        user.clear_password_reset();
        // Sessions remembered with the old password must not survive the change.
        user.forget();

        let user = self.repository.update(user).await?;
        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, AccountError> {
        self.load(id).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), AccountError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::HashCost;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::UserName;
    use crate::user::errors::MailerError;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, AccountError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;
            async fn update(&self, user: User) -> Result<User, AccountError>;
            async fn delete(&self, id: &UserId) -> Result<(), AccountError>;
        }
    }

    mock! {
        pub TestMailer {}

        #[async_trait]
        impl Mailer for TestMailer {
            async fn send_activation_email(&self, user: &User, token: &str) -> Result<(), MailerError>;
            async fn send_password_reset_email(&self, user: &User, token: &str) -> Result<(), MailerError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::with_cost(b"test_secret_key_at_least_32_bytes!", HashCost::minimum())
                .unwrap(),
        )
    }

    fn service(
        repository: MockTestUserRepository,
        mailer: MockTestMailer,
        authenticator: Arc<Authenticator>,
    ) -> AccountService<MockTestUserRepository, MockTestMailer> {
        AccountService::new(
            Arc::new(repository),
            Arc::new(mailer),
            authenticator,
            AccountPolicy::default(),
        )
    }

    fn stored_user(authenticator: &Authenticator, password: &str) -> User {
        let mut user = User::new(
            UserName::new("Alice".to_string(), 50).unwrap(),
            EmailAddress::new("alice@example.com".to_string(), 255).unwrap(),
            authenticator.digest(password).unwrap(),
            authenticator.digest("activation").unwrap(),
            Utc::now(),
        );
        user.activate(Utc::now());
        user
    }

    #[tokio::test]
    async fn test_register_success() {
        let authenticator = authenticator();
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "alice@example.com"
                    && !user.activated
                    && user.activation_digest.is_some()
                    && user.password_digest.as_deref().unwrap().starts_with("$argon2")
            })
            .times(1)
            .returning(|user| Ok(user));
        mailer
            .expect_send_activation_email()
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(repository, mailer, Arc::clone(&authenticator));

        let registration = service
            .register(RegisterCommand::new("Alice", "alice@EXAMPLE.com", "secret1"))
            .await
            .expect("registration failed");

        let user = registration.user;
        assert_eq!(user.email.as_str(), "alice@example.com");
        assert!(!user.activated);
        assert!(user.authenticated(
            TokenKind::Activation,
            &registration.activation_token,
            &authenticator
        ));
        assert_ne!(
            user.activation_digest.as_deref(),
            Some(registration.activation_token.as_str())
        );
    }

    #[tokio::test]
    async fn test_register_invalid_fields_persist_nothing() {
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository.expect_find_by_email().times(0);
        repository.expect_create().times(0);
        mailer.expect_send_activation_email().times(0);

        let service = service(repository, mailer, authenticator());

        let result = service
            .register(RegisterCommand::new("a".repeat(51), "alice@", "12345"))
            .await;

        match result {
            Err(AccountError::Validation(errors)) => {
                assert!(errors.contains("name"));
                assert!(errors.contains("email"));
                assert!(errors.contains("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let authenticator = authenticator();
        let existing = stored_user(&authenticator, "secret1");
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_create().times(0);
        mailer.expect_send_activation_email().times(0);

        let service = service(repository, mailer, authenticator);

        let result = service
            .register(RegisterCommand::new("Alice", "ALICE@example.com", "secret1"))
            .await;

        match result {
            Err(AccountError::Validation(errors)) => {
                assert_eq!(errors.get("email"), ["has already been taken".to_string()])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository.expect_find_by_email().returning(|_| Ok(None));
        repository.expect_create().returning(|user| Ok(user));
        mailer
            .expect_send_activation_email()
            .times(1)
            .returning(|_, _| Err(MailerError::DeliveryFailed("smtp down".to_string())));

        let service = service(repository, mailer, authenticator());

        let result = service
            .register(RegisterCommand::new("Alice", "alice@example.com", "secret1"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_success_with_mixed_case_email() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "secret1");
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service.authenticate("Alice@Example.COM", "secret1").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password_and_unknown_email_look_alike() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "secret1");
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .returning(move |email| {
                if email == "alice@example.com" {
                    Ok(Some(user.clone()))
                } else {
                    Ok(None)
                }
            });

        let service = service(repository, MockTestMailer::new(), authenticator);

        let wrong_password = service.authenticate("alice@example.com", "secret1x").await;
        let unknown_email = service.authenticate("bob@example.com", "secret1").await;

        assert!(matches!(wrong_password, Err(AccountError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_without_password_digest_fails() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.password_digest = None;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service.authenticate("alice@example.com", "").await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_remember_stores_digest_of_returned_token() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "secret1");
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .withf(|user| {
                user.remember_digest
                    .as_deref()
                    .is_some_and(|digest| digest.starts_with("$argon2id$"))
            })
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let token = service.remember(&user_id).await.unwrap();
        assert_eq!(token.len(), 43);
    }

    #[tokio::test]
    async fn test_forget_clears_digest() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.remember(authenticator.digest("token").unwrap());
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .withf(|user| user.remember_digest.is_none())
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), authenticator);
        assert!(service.forget(&user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_is_remembered() {
        let authenticator = authenticator();
        let mut remembered = stored_user(&authenticator, "secret1");
        remembered.remember(authenticator.digest("remember-me").unwrap());
        let forgotten = stored_user(&authenticator, "secret1");
        let remembered_id = remembered.id;
        let forgotten_id = forgotten.id;
        let mut repository = MockTestUserRepository::new();

        repository.expect_find_by_id().returning(move |id| {
            if *id == remembered_id {
                Ok(Some(remembered.clone()))
            } else {
                Ok(Some(forgotten.clone()))
            }
        });

        let service = service(repository, MockTestMailer::new(), authenticator);

        assert!(service
            .is_remembered(&remembered_id, "remember-me")
            .await
            .unwrap());
        assert!(!service
            .is_remembered(&remembered_id, "remember-me!")
            .await
            .unwrap());
        assert!(!service
            .is_remembered(&forgotten_id, "remember-me")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_login_with_remember_token_rejects_mismatch() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "secret1");
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service.login_with_remember_token(&user_id, "guess").await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_activate_twice_is_safe() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.activated = false;
        user.activated_at = None;
        user.activation_digest = Some(authenticator.digest("activation").unwrap());
        let user_id = user.id;
        let pending = user.clone();
        let mut active = user;
        active.activate(Utc::now());

        let mut repository = MockTestUserRepository::new();
        let mut calls = 0;
        repository.expect_find_by_id().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(Some(pending.clone()))
            } else {
                Ok(Some(active.clone()))
            }
        });
        repository
            .expect_update()
            .times(1)
            .withf(|user| user.activated && user.activation_digest.is_none())
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let first = service.activate(&user_id).await.unwrap();
        let second = service.activate(&user_id).await.unwrap();

        assert!(first.activated);
        assert!(second.activated);
        assert!(second.activation_digest.is_none());
    }

    #[tokio::test]
    async fn test_activation_token_cannot_be_replayed() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        // Already activated: digest is gone.
        assert!(user.activation_digest.is_none());
        user.activated = true;
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update().times(0);

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service.activate_with_token(&user_id, "activation").await;
        assert!(matches!(result, Err(AccountError::InvalidActivationLink)));
    }

    #[tokio::test]
    async fn test_activate_with_token_success() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.activated = false;
        user.activated_at = None;
        user.activation_digest = Some(authenticator.digest("activation").unwrap());
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let user = service
            .activate_with_token(&user_id, "activation")
            .await
            .unwrap();
        assert!(user.activated);
        assert!(user.activated_at.is_some());
        assert!(user.activation_digest.is_none());
    }

    #[tokio::test]
    async fn test_forgot_password_mails_reset_token() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "secret1");
        let verifier = Arc::clone(&authenticator);
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .withf(|user| user.reset_digest.is_some() && user.reset_sent_at.is_some())
            .returning(|user| Ok(user));
        mailer
            .expect_send_password_reset_email()
            .times(1)
            .withf(move |user, token| {
                verifier.matches(token, user.reset_digest.as_deref())
            })
            .returning(|_, _| Ok(()));

        let service = service(repository, mailer, authenticator);

        assert!(service.forgot_password(" Alice@Example.com ").await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository.expect_find_by_email().returning(|_| Ok(None));
        mailer.expect_send_password_reset_email().times(0);

        let service = service(repository, mailer, authenticator());

        let result = service.forgot_password("nobody@example.com").await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_is_reset_expired() {
        let authenticator = authenticator();
        let mut fresh = stored_user(&authenticator, "secret1");
        fresh.start_password_reset("d".to_string(), Utc::now() - Duration::minutes(90));
        let mut stale = fresh.clone();
        stale.id = UserId::new();
        stale.reset_sent_at = Some(Utc::now() - Duration::minutes(130));
        let fresh_id = fresh.id;
        let stale_id = stale.id;
        let mut repository = MockTestUserRepository::new();

        repository.expect_find_by_id().returning(move |id| {
            if *id == fresh_id {
                Ok(Some(fresh.clone()))
            } else {
                Ok(Some(stale.clone()))
            }
        });

        let service = service(repository, MockTestMailer::new(), authenticator);

        assert!(!service.is_reset_expired(&fresh_id).await.unwrap());
        assert!(service.is_reset_expired(&stale_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_success() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.start_password_reset(authenticator.digest("reset").unwrap(), Utc::now());
        user.remember(authenticator.digest("remember").unwrap());
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .withf(|user| {
                user.reset_digest.is_none()
                    && user.reset_sent_at.is_none()
                    && user.remember_digest.is_none()
            })
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), Arc::clone(&authenticator));

        let user = service
            .reset_password(&user_id, "reset", "new-secret".to_string())
            .await
            .unwrap();

        assert!(user.password_matches("new-secret", &authenticator));
        assert!(!user.password_matches("secret1", &authenticator));
    }

    #[tokio::test]
    async fn test_reset_password_expired_clears_state() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.start_password_reset(
            authenticator.digest("reset").unwrap(),
            Utc::now() - Duration::minutes(130),
        );
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .times(1)
            .withf(|user| user.reset_digest.is_none() && user.reset_sent_at.is_none())
            .returning(|user| Ok(user));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service
            .reset_password(&user_id, "reset", "new-secret".to_string())
            .await;
        assert!(matches!(result, Err(AccountError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_password() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.start_password_reset(authenticator.digest("reset").unwrap(), Utc::now());
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update().times(0);

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service
            .reset_password(&user_id, "reset", "123".to_string())
            .await;
        match result {
            Err(AccountError::Validation(errors)) => assert!(errors.contains("password")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_password_requires_activated_user() {
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "secret1");
        user.activated = false;
        user.start_password_reset(authenticator.digest("reset").unwrap(), Utc::now());
        let user_id = user.id;
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository, MockTestMailer::new(), authenticator);

        let result = service
            .reset_password(&user_id, "reset", "new-secret".to_string())
            .await;
        assert!(matches!(result, Err(AccountError::InvalidResetLink)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(1).returning(|_| Ok(None));

        let service = service(repository, MockTestMailer::new(), authenticator());

        let result = service.get_user(&UserId::new()).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user_propagates_not_found() {
        let mut repository = MockTestUserRepository::new();
        let user_id = UserId::new();

        repository
            .expect_delete()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Err(AccountError::NotFound(user_id.to_string())));

        let service = service(repository, MockTestMailer::new(), authenticator());

        let result = service.delete_user(&user_id).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }
}
