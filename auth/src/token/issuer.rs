use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Random token generator for activation, remember and reset links.
///
/// Every token is drawn straight from the operating system CSPRNG and
/// encoded with the URL-safe base64 alphabet, so it can travel in paths,
/// query strings and cookies without escaping.
#[derive(Debug, Clone, Copy)]
pub struct TokenIssuer {
    byte_length: usize,
}

impl TokenIssuer {
    /// Bytes of entropy per token (256 bits).
    pub const DEFAULT_BYTE_LENGTH: usize = 32;
    const MIN_BYTE_LENGTH: usize = 16;

    pub fn new() -> Self {
        Self {
            byte_length: Self::DEFAULT_BYTE_LENGTH,
        }
    }

    /// Create an issuer producing `byte_length` random bytes per token.
    ///
    /// Lengths below 16 bytes (128 bits) are raised to 16.
    pub fn with_byte_length(byte_length: usize) -> Self {
        Self {
            byte_length: byte_length.max(Self::MIN_BYTE_LENGTH),
        }
    }

    /// Generate a fresh URL-safe token.
    ///
    /// # Returns
    /// Base64url string without padding
    pub fn new_token(&self) -> String {
        let mut bytes = vec![0u8; self.byte_length];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}
