use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::HashCost;
use auth::SessionClaims;
use chrono::Utc;
use library_service::borrow_request::errors::BorrowRequestError;
use library_service::borrow_request::models::BorrowRequest;
use library_service::borrow_request::models::BorrowRequestId;
use library_service::borrow_request::models::BorrowStatus;
use library_service::borrow_request::ports::BorrowRequestRepository;
use library_service::borrow_request::query::BorrowRequestFilter;
use library_service::borrow_request::service::BorrowService;
use library_service::domain::user::models::AccountPolicy;
use library_service::domain::user::models::EmailAddress;
use library_service::domain::user::models::Role;
use library_service::domain::user::models::User;
use library_service::domain::user::models::UserId;
use library_service::domain::user::models::UserName;
use library_service::domain::user::service::AccountService;
use library_service::inbound::http::router::create_router;
use library_service::user::errors::AccountError;
use library_service::user::errors::MailerError;
use library_service::user::ports::Mailer;
use library_service::user::ports::UserRepository;
use serde_json::json;
use serde_json::Value;

const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Shared in-memory tables standing in for Postgres.
#[derive(Default)]
pub struct Store {
    pub users: Mutex<HashMap<UserId, User>>,
    pub borrow_requests: Mutex<Vec<BorrowRequest>>,
}

pub struct InMemoryUserRepository {
    store: Arc<Store>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.store.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AccountError::EmailAlreadyExists(user.email.as_str().to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError> {
        Ok(self.store.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        Ok(self
            .store
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.store.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(AccountError::NotFound(user.id.to_string())),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<(), AccountError> {
        let mut users = self.store.users.lock().unwrap();
        if users.remove(id).is_none() {
            return Err(AccountError::NotFound(id.to_string()));
        }
        for request in self.store.borrow_requests.lock().unwrap().iter_mut() {
            if request.user_id == Some(*id) {
                request.user_id = None;
            }
        }
        Ok(())
    }
}

pub struct InMemoryBorrowRequestRepository {
    store: Arc<Store>,
}

#[async_trait]
impl BorrowRequestRepository for InMemoryBorrowRequestRepository {
    async fn create(&self, request: BorrowRequest) -> Result<BorrowRequest, BorrowRequestError> {
        self.store
            .borrow_requests
            .lock()
            .unwrap()
            .push(request.clone());
        Ok(request)
    }

    async fn find_by_id(
        &self,
        id: &BorrowRequestId,
    ) -> Result<Option<BorrowRequest>, BorrowRequestError> {
        Ok(self
            .store
            .borrow_requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == *id)
            .cloned())
    }

    async fn find_where(
        &self,
        filter: &BorrowRequestFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowRequestError> {
        let requests = self.store.borrow_requests.lock().unwrap();
        Ok(filter.apply(&requests).to_vec())
    }

    async fn compare_and_set_status(
        &self,
        id: &BorrowRequestId,
        expected: BorrowStatus,
        expected_version: i64,
        next: BorrowStatus,
    ) -> Result<BorrowRequest, BorrowRequestError> {
        let mut requests = self.store.borrow_requests.lock().unwrap();
        let Some(request) = requests.iter_mut().find(|r| r.id == *id) else {
            return Err(BorrowRequestError::NotFound(id.to_string()));
        };
        if request.status != expected || request.version != expected_version {
            return Err(BorrowRequestError::Conflict(id.to_string()));
        }

        request.status = next;
        request.version += 1;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn delete(&self, id: &BorrowRequestId) -> Result<(), BorrowRequestError> {
        let mut requests = self.store.borrow_requests.lock().unwrap();
        let before = requests.len();
        requests.retain(|r| r.id != *id);
        if requests.len() == before {
            return Err(BorrowRequestError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailKind {
    Activation,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub user_id: UserId,
    pub token: String,
}

/// Mailer that keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn last(&self, kind: MailKind) -> Option<SentMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.kind == kind)
            .cloned()
    }

    fn record(&self, kind: MailKind, user: &User, token: &str) {
        self.sent.lock().unwrap().push(SentMail {
            kind,
            user_id: user.id,
            token: token.to_string(),
        });
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_activation_email(&self, user: &User, token: &str) -> Result<(), MailerError> {
        self.record(MailKind::Activation, user, token);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        user: &User,
        token: &str,
    ) -> Result<(), MailerError> {
        self.record(MailKind::PasswordReset, user, token);
        Ok(())
    }
}

/// Test application that spawns a real server over in-memory adapters
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub store: Arc<Store>,
    pub mailer: Arc<RecordingMailer>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(Store::default());
        let mailer = Arc::new(RecordingMailer::default());
        let authenticator = Arc::new(
            Authenticator::with_cost(JWT_SECRET, HashCost::minimum())
                .expect("Failed to create authenticator"),
        );

        let account_service = Arc::new(AccountService::new(
            Arc::new(InMemoryUserRepository {
                store: Arc::clone(&store),
            }),
            Arc::clone(&mailer),
            Arc::clone(&authenticator),
            AccountPolicy::default(),
        ));
        let borrow_service = Arc::new(BorrowService::new(Arc::new(
            InMemoryBorrowRequestRepository {
                store: Arc::clone(&store),
            },
        )));

        let router = create_router(
            account_service,
            borrow_service,
            Arc::clone(&authenticator),
            24,
        );

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            store,
            mailer,
            authenticator,
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(format!("{}{}", self.address, path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(format!("{}{}", self.address, path))
    }

    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.patch(path).bearer_auth(token)
    }

    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.delete(path).bearer_auth(token)
    }

    /// Sign up through the API. Returns the new user id.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .post("/api/users")
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Sign up and follow the emailed activation link. Returns (user id, session token).
    pub async fn register_active(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let user_id = self.register(name, email, password).await;
        let token = self.mailer.last(MailKind::Activation).unwrap().token;

        let response = self
            .post(&format!("/api/account_activations/{}", token))
            .json(&json!({ "user_id": user_id }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response");
        (user_id, body["data"]["token"].as_str().unwrap().to_string())
    }

    /// Insert an activated admin straight into the store and sign a session for it.
    pub fn admin_session(&self) -> String {
        let mut admin = User::new(
            UserName::new("Admin".to_string(), 50).unwrap(),
            EmailAddress::new(format!("admin-{}@example.com", UserId::new()), 255).unwrap(),
            self.authenticator.digest("admin-password").unwrap(),
            self.authenticator.digest("activation").unwrap(),
            Utc::now(),
        );
        admin.activate(Utc::now());
        admin.role = Role::Admin;

        let claims = SessionClaims::for_user(admin.id, admin.name.as_str(), "admin", 1);
        self.store.users.lock().unwrap().insert(admin.id, admin);
        self.authenticator.issue_session(&claims).unwrap()
    }

    /// Open a borrow request as `token`'s user. Returns the request id.
    pub async fn create_borrow_request(&self, token: &str, borrowed: &str, returned: &str) -> String {
        let response = self
            .post_authenticated("/api/borrow_requests", token)
            .json(&json!({
                "book_id": uuid::Uuid::new_v4().to_string(),
                "borrowed_date": borrowed,
                "return_date": returned,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
