use std::fmt;

/// A wrapper that keeps sensitive values out of logs and error output.
///
/// CSRF token values are held in a `Secret` so that `Debug`-formatting a
/// token, the token manager or the whole controller never prints them.
/// Reading the value requires the explicit [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use secure_form::Secret;
///
/// let token = Secret::new("a1b2c3".to_string());
///
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(format!("{}", token), "[REDACTED]");
/// assert_eq!(token.expose_secret(), "a1b2c3");
/// ```
// Do NOT derive Clone, Copy or Default: duplicating a token must be a
// deliberate `expose_secret().clone()` at the call site.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// Never pass the result to a logger.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T: AsRef<[u8]>> Secret<T> {
    /// Compares against `candidate` in time independent of where they differ.
    ///
    /// Lengths are not secret; a length mismatch returns early.
    pub fn matches(&self, candidate: impl AsRef<[u8]>) -> bool {
        let ours = self.inner.as_ref();
        let theirs = candidate.as_ref();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.iter()
            .zip(theirs)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

// Debug and Display MUST stay unconditional: a token printed into a log is
// as good as leaked.
impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
