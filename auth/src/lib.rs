//! Credential utilities shared by the library services
//!
//! Provides:
//! - Password and token digests (Argon2id, configurable cost)
//! - URL-safe random tokens for activation, remember-me and reset links
//! - Signed session tokens (HS256)
//!
//! Services keep their own domain rules (who may log in, when a reset link
//! expires) and use these building blocks for the cryptography only.
//!
//! # Examples
//!
//! ## Digests
//! ```
//! use auth::{HashCost, PasswordHasher};
//!
//! let hasher = PasswordHasher::with_cost(HashCost::minimum()).unwrap();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.matches("my_password", Some(&digest)));
//! assert!(!hasher.matches("my_password", None));
//! ```
//!
//! ## Random tokens
//! ```
//! use auth::TokenIssuer;
//!
//! let token = TokenIssuer::new().new_token();
//! assert_eq!(token.len(), 43);
//! ```
//!
//! ## Issue and check a token
//! ```
//! use auth::{Authenticator, HashCost};
//!
//! let auth = Authenticator::with_cost(b"secret_key_at_least_32_bytes_long!", HashCost::minimum())
//!     .unwrap();
//! let issued = auth.issue_token().unwrap();
//! // store issued.digest, mail issued.token
//! assert!(auth.matches(&issued.token, Some(&issued.digest)));
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use authenticator::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SessionClaims;
pub use password::HashCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::TokenIssuer;
