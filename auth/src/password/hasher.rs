use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Work factor for the adaptive hash.
///
/// Digests record their own parameters, so changing the cost only affects
/// digests produced afterwards; existing ones keep verifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl HashCost {
    /// Cheapest cost Argon2 accepts. Meant for test suites only.
    pub fn minimum() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    fn params(&self) -> Result<Params, PasswordError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordError::InvalidCost(e.to_string()))
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// One-way hashing of passwords and tokens.
///
/// Provides salted Argon2id digests in PHC string format. Holds no mutable
/// state and is safe to share between threads.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a new hasher with the library's recommended cost.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a hasher with an explicit cost.
    ///
    /// # Arguments
    /// * `cost` - Memory, iteration and parallelism parameters
    ///
    /// # Errors
    /// * `InvalidCost` - Parameters are outside Argon2's accepted range
    pub fn with_cost(cost: HashCost) -> Result<Self, PasswordError> {
        Ok(Self {
            params: cost.params()?,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext secret securely.
    ///
    /// Uses Argon2id with random salt generation.
    ///
    /// # Arguments
    /// * `secret` - Plaintext password or token to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a secret against a stored digest.
    ///
    /// # Arguments
    /// * `secret` - Plaintext secret to verify
    /// * `digest` - Stored digest in PHC string format
    ///
    /// # Returns
    /// True if the secret matches, false otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - Digest format is invalid
    pub fn verify(&self, secret: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(digest).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Check a secret against an optional digest without failing.
    ///
    /// A missing digest means the credential channel was never established,
    /// so nothing can match it. A malformed digest never matches either.
    ///
    /// # Arguments
    /// * `secret` - Plaintext secret presented by the caller
    /// * `digest` - Stored digest, if any
    ///
    /// # Returns
    /// True only when a digest is present and the secret matches it
    pub fn matches(&self, secret: &str, digest: Option<&str>) -> bool {
        match digest {
            Some(digest) => self.verify(secret, digest).unwrap_or(false),
            None => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
