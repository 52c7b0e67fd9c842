//! Audit event schema and types.

use std::fmt;

/// Kind of submit outcome being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// The handler accepted the submission
    Submission,
    /// The honeypot field was filled
    BotDetected,
    /// The rate limiter refused the submission
    RateLimited,
    /// One or more fields failed validation
    ValidationFailed,
    /// The handler rejected the submission
    HandlerFailed,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::Submission => write!(f, "submission"),
            AuditEventKind::BotDetected => write!(f, "bot_detected"),
            AuditEventKind::RateLimited => write!(f, "rate_limited"),
            AuditEventKind::ValidationFailed => write!(f, "validation_failed"),
            AuditEventKind::HandlerFailed => write!(f, "handler_failed"),
        }
    }
}

/// Outcome of an audited submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The submission reached the backend and succeeded
    Success,
    /// The pipeline refused the submission before the handler ran
    Denied,
    /// The handler ran and failed
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A structured audit event containing only safe metadata.
///
/// # Safety Invariants
///
/// - No field values are stored
/// - No CSRF tokens are included
/// - `detail` is a fixed phrase or a count, never user input
///
/// # Example
///
/// ```
/// use secure_form::audit::{AuditEvent, AuditEventKind, AuditOutcome};
///
/// let event = AuditEvent::new("contact", AuditEventKind::RateLimited, AuditOutcome::Denied)
///     .with_detail("retry in 42s");
///
/// assert_eq!(event.form_id(), "contact");
/// assert_eq!(event.detail(), Some("retry in 42s"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    form_id: String,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    detail: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event.
    pub fn new(form_id: impl Into<String>, kind: AuditEventKind, outcome: AuditOutcome) -> Self {
        Self {
            form_id: form_id.into(),
            kind,
            outcome,
            detail: None,
        }
    }

    /// Attaches a short description.
    ///
    /// Caller must ensure this does not contain field values or tokens.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the form identifier.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Returns the event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the detail, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, form_id={}",
            self.kind, self.outcome, self.form_id
        )?;
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(AuditEventKind::Submission.to_string(), "submission");
        assert_eq!(AuditEventKind::BotDetected.to_string(), "bot_detected");
        assert_eq!(AuditEventKind::ValidationFailed.to_string(), "validation_failed");
    }

    #[test]
    fn outcome_display() {
        assert_eq!(AuditOutcome::Success.to_string(), "success");
        assert_eq!(AuditOutcome::Denied.to_string(), "denied");
        assert_eq!(AuditOutcome::Error.to_string(), "error");
    }

    #[test]
    fn minimal_event_has_no_detail() {
        let event = AuditEvent::new("signup", AuditEventKind::Submission, AuditOutcome::Success);

        assert_eq!(event.form_id(), "signup");
        assert_eq!(event.kind(), AuditEventKind::Submission);
        assert_eq!(event.outcome(), AuditOutcome::Success);
        assert!(event.detail().is_none());
        assert_eq!(
            event.to_string(),
            "AuditEvent[kind=submission, outcome=success, form_id=signup]"
        );
    }

    #[test]
    fn display_includes_detail() {
        let event = AuditEvent::new("signup", AuditEventKind::ValidationFailed, AuditOutcome::Denied)
            .with_detail("2 field error(s)");

        assert!(event.to_string().ends_with(", detail=2 field error(s)]"));
    }
}
