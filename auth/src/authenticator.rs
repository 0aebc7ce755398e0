use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::SessionClaims;
use crate::password::HashCost;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::TokenIssuer;

/// Credential coordinator combining digests, random tokens and sessions.
///
/// Services hold one shared instance; every method takes `&self` and
/// none of them mutate internal state.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    jwt_handler: JwtHandler,
}

/// A freshly issued secret together with the digest to persist.
///
/// The plaintext `token` must be handed to the caller (mail, cookie) and
/// dropped; only `digest` is ever stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub digest: String,
}

impl Authenticator {
    /// Create a new authenticator with the default hash cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for session token signing
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
        }
    }

    /// Create an authenticator with an explicit hash cost.
    ///
    /// # Errors
    /// * `InvalidCost` - Cost parameters rejected by Argon2
    pub fn with_cost(jwt_secret: &[u8], cost: HashCost) -> Result<Self, PasswordError> {
        Ok(Self {
            password_hasher: PasswordHasher::with_cost(cost)?,
            token_issuer: TokenIssuer::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
        })
    }

    /// Digest a password or token for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn digest(&self, secret: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(secret)
    }

    /// Check a secret against an optional stored digest.
    ///
    /// Returns false when the digest is absent or malformed.
    pub fn matches(&self, secret: &str, digest: Option<&str>) -> bool {
        self.password_hasher.matches(secret, digest)
    }

    /// Spend one digest computation on `secret` and report no match.
    ///
    /// A lookup miss then costs as much as a failed password check.
    pub fn reject(&self, secret: &str) -> bool {
        let _ = self.password_hasher.hash(secret);
        false
    }

    /// Generate a random URL-safe token.
    pub fn new_token(&self) -> String {
        self.token_issuer.new_token()
    }

    /// Generate a token and its digest in one step.
    ///
    /// # Errors
    /// * `HashingFailed` - Digest could not be computed
    pub fn issue_token(&self) -> Result<IssuedToken, PasswordError> {
        let token = self.new_token();
        let digest = self.digest(&token)?;
        Ok(IssuedToken { token, digest })
    }

    /// Sign session claims.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_session(&self, claims: &SessionClaims) -> Result<String, JwtError> {
        self.jwt_handler.encode(claims)
    }

    /// Validate a session token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` / `InvalidToken` - Token rejected
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.jwt_handler.decode(token)
    }
}
