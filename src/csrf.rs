//! Per-form anti-forgery tokens.
//!
//! Tokens are drawn from the operating system RNG and rotated after every
//! accepted submission. Verification is the backend's job; this module only
//! issues, holds and rotates them.

use std::fmt;
use std::time::SystemTime;

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

use crate::secret::Secret;

/// Token length in characters. 64 alphanumerics carry about 381 bits.
pub const CSRF_TOKEN_LENGTH: usize = 64;

/// An opaque anti-forgery token bound to one form instance.
///
/// The value never appears in `Debug` or `Display` output.
pub struct CsrfToken {
    value: Secret<String>,
    issued_at: SystemTime,
}

impl CsrfToken {
    /// Returns the token value for transmission to the backend.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Returns when the token was issued.
    pub fn issued_at(&self) -> SystemTime {
        self.issued_at
    }

    /// Compares `candidate` with this token in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        self.value.matches(candidate)
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfToken")
            .field("value", &self.value)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Generates a fresh token.
///
/// # Examples
///
/// ```
/// use secure_form::{generate_csrf_token, CSRF_TOKEN_LENGTH};
///
/// let token = generate_csrf_token();
/// assert_eq!(token.expose().len(), CSRF_TOKEN_LENGTH);
/// assert!(!format!("{:?}", token).contains(token.expose()));
/// ```
pub fn generate_csrf_token() -> CsrfToken {
    let value: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect();

    CsrfToken {
        value: Secret::new(value),
        issued_at: SystemTime::now(),
    }
}

/// Holds the current token of one form instance and rotates it.
///
/// The controller calls [`rotate`](Self::rotate) exactly once per accepted
/// submission. A failed submission keeps the token, since nothing changed on
/// the server.
#[derive(Debug)]
pub struct CsrfTokenManager {
    current: CsrfToken,
    rotations: u64,
}

impl CsrfTokenManager {
    /// Creates a manager holding a freshly issued token.
    pub fn new() -> Self {
        Self {
            current: generate_csrf_token(),
            rotations: 0,
        }
    }

    /// Returns the token to attach to the next submission.
    pub fn current(&self) -> &CsrfToken {
        &self.current
    }

    /// Replaces the current token with a new one and returns it.
    ///
    /// The previous token is dropped; it is never handed out again.
    pub fn rotate(&mut self) -> &CsrfToken {
        let mut next = generate_csrf_token();
        // A token is never handed out twice.
        while next.matches(self.current.expose()) {
            next = generate_csrf_token();
        }
        self.current = next;
        self.rotations += 1;
        &self.current
    }

    /// Returns how many times the token has been rotated.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }
}

impl Default for CsrfTokenManager {
    fn default() -> Self {
        Self::new()
    }
}
