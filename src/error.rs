use std::fmt;
use std::time::Duration;

use crate::validator::ValidationError;

/// Message shown for any rejection that must not reveal its cause.
///
/// Honeypot hits surface with this exact text so an automated submitter
/// cannot distinguish bot detection from an ordinary failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Submission failed. Please try again.";

/// Errors produced by the secure form pipeline.
///
/// Only the submit handler may fail with an arbitrary error; the controller
/// converts that failure into [`FormError::SubmitFailed`] so nothing escapes
/// uncaught. Every other variant is a structured result of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// One or more fields failed validation. Recoverable by correcting input.
    Validation(Vec<ValidationError>),
    /// Too many submissions inside the active window.
    RateLimited {
        /// Human-readable reason suitable for display next to the submit control
        reason: String,
        /// Time until the oldest recorded attempt leaves the window
        retry_after: Duration,
    },
    /// Form-level failure. Carries either the handler's error message or the
    /// generic failure message.
    SubmitFailed {
        /// Message to render once above the submit control
        message: String,
    },
    /// A submission is already in flight for this form instance.
    InFlight,
    /// The controller was unmounted while the handler was running.
    Unmounted,
    /// A change was addressed to a field the form does not declare.
    UnknownField(String),
    /// A field policy pattern failed to compile.
    InvalidPattern {
        /// The field carrying the pattern
        field: String,
        /// Compiler message from the regex engine
        message: String,
    },
}

impl FormError {
    /// Returns the failure every rejected bot submission maps to.
    pub(crate) fn generic_failure() -> Self {
        FormError::SubmitFailed {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Returns true if retrying later (without changing input) may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FormError::RateLimited { .. } | FormError::InFlight)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Validation(errors) => {
                write!(f, "validation failed with {} issue(s)", errors.len())
            }
            FormError::RateLimited {
                reason,
                retry_after,
            } => write!(
                f,
                "{} (retry after {}s)",
                reason,
                retry_after.as_secs().max(1)
            ),
            FormError::SubmitFailed { message } => write!(f, "{}", message),
            FormError::InFlight => write!(f, "a submission is already in progress"),
            FormError::Unmounted => write!(f, "form was unmounted during submission"),
            FormError::UnknownField(name) => write!(f, "unknown field '{}'", name),
            FormError::InvalidPattern { field, message } => {
                write!(f, "invalid pattern for field '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for FormError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Severity;

    #[test]
    fn generic_failure_uses_neutral_message() {
        let err = FormError::generic_failure();

        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
        assert!(!err.to_string().to_lowercase().contains("bot"));
        assert!(!err.to_string().to_lowercase().contains("honeypot"));
    }

    #[test]
    fn rate_limited_display_includes_retry_hint() {
        let err = FormError::RateLimited {
            reason: "Too many submissions".to_string(),
            retry_after: Duration::from_secs(42),
        };

        assert_eq!(err.to_string(), "Too many submissions (retry after 42s)");
        assert!(err.is_transient());
    }

    #[test]
    fn sub_second_retry_rounds_up_in_display() {
        let err = FormError::RateLimited {
            reason: "Too many submissions".to_string(),
            retry_after: Duration::from_millis(300),
        };

        assert!(err.to_string().contains("retry after 1s"));
    }

    #[test]
    fn validation_display_counts_issues() {
        let err = FormError::Validation(vec![ValidationError::new(
            "email",
            "Email is required",
            Severity::Error,
        )]);

        assert_eq!(err.to_string(), "validation failed with 1 issue(s)");
        assert!(!err.is_transient());
    }
}
