//! The secure form controller.
//!
//! [`SecureForm`] is bound to one rendered form instance. It owns the field
//! values, the CSRF token and the honeypot, and drives every submission
//! through the same cycle:
//!
//! ```text
//! Idle -> Validating -> Blocked                  -> Idle
//!                    -> Failed                   -> Idle
//!                    -> Submitting -> Success    -> Idle
//!                                  -> Failed     -> Idle
//! ```
//!
//! The only suspension point is the submit handler. The state lock is
//! released before the handler is awaited and reacquired afterwards.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::audit::{AuditEventKind, AuditOutcome, AuditTrail, FormAudit};
use crate::clock::{Clock, SystemClock};
use crate::config::FormConfig;
use crate::csrf::CsrfTokenManager;
use crate::error::{FormError, GENERIC_FAILURE_MESSAGE};
use crate::field::{FieldDefinition, FieldKind, FieldValues};
use crate::honeypot::{create_honeypot, HoneypotField};
use crate::logging::FormLog;
use crate::payload::SanitizedPayload;
use crate::rate_limit::{RateLimitDecision, RateLimiter};
use crate::validator::{validate_and_sanitize_form, ValidationError};

/// Reason shown next to the submit control while a form is blocked.
pub const RATE_LIMIT_REASON: &str = "Too many submission attempts. Please wait before trying again.";

/// The external submit boundary.
///
/// Receives the sanitized field values and the current CSRF token. The
/// caller is responsible for transmitting the token to a backend that
/// verifies it.
///
/// Any `Fn(SanitizedPayload, String) -> Future<Output = Result<(), E>>`
/// with `E: Display` implements this trait.
pub trait SubmitHandler {
    /// Error reported by a failed submission. Its `Display` output becomes
    /// the form-level error message.
    type Error: fmt::Display;
    /// Future resolving once the submission completed.
    type Future: Future<Output = Result<(), Self::Error>>;

    /// Sends one submission.
    fn call(&self, data: SanitizedPayload, csrf_token: String) -> Self::Future;
}

impl<F, Fut, E> SubmitHandler for F
where
    F: Fn(SanitizedPayload, String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    type Error = E;
    type Future = Fut;

    fn call(&self, data: SanitizedPayload, csrf_token: String) -> Fut {
        self(data, csrf_token)
    }
}

/// Phase of the submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Accepting edits
    Idle,
    /// Running honeypot, rate limit and field checks
    Validating,
    /// Refused by the rate limiter
    Blocked,
    /// Waiting for the submit handler
    Submitting,
    /// The handler accepted the submission
    Success,
    /// Validation or the handler failed
    Failed,
}

impl FormPhase {
    fn is_outcome(self) -> bool {
        matches!(
            self,
            FormPhase::Blocked | FormPhase::Success | FormPhase::Failed
        )
    }
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormPhase::Idle => "idle",
            FormPhase::Validating => "validating",
            FormPhase::Blocked => "blocked",
            FormPhase::Submitting => "submitting",
            FormPhase::Success => "success",
            FormPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of one field for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    /// Field name
    pub name: String,
    /// Display label
    pub label: String,
    /// Field kind, which selects the element to draw
    pub kind: FieldKind,
    /// Current raw value
    pub value: String,
    /// First error from the last validation pass, if any
    pub error: Option<String>,
    /// Whether the field must not be empty
    pub required: bool,
    /// Placeholder text
    pub placeholder: Option<String>,
}

/// Returned by a successful [`SecureForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Number of fields handed to the submit handler, honeypot included
    pub fields_submitted: usize,
    /// Non-blocking findings from validation, such as truncated values
    pub warnings: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
struct Block {
    reason: String,
    since: Instant,
    retry_after: Duration,
}

impl Block {
    fn remaining(&self, now: Instant) -> Duration {
        self.retry_after
            .saturating_sub(now.saturating_duration_since(self.since))
    }
}

#[derive(Debug)]
struct FormState {
    phase: FormPhase,
    last_outcome: Option<FormPhase>,
    values: FieldValues,
    honeypot_value: String,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
    form_error: Option<String>,
    block: Option<Block>,
    csrf: CsrfTokenManager,
    mounted: bool,
}

/// Controller for one mounted form instance.
///
/// Wires the honeypot, CSRF token, rate limiter and validator together
/// around a caller-supplied [`SubmitHandler`]. The rate limiter is shared:
/// build it once and pass it to every form that should draw from it. The
/// form identifier is the limiter key.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use secure_form::{
///     FieldDefinition, FieldKind, FormConfig, RateLimiter, SanitizedPayload, SecureForm,
/// };
///
/// # async fn run() -> Result<(), secure_form::FormError> {
/// let config = FormConfig::new("newsletter")
///     .field(FieldDefinition::new("email", "Email", FieldKind::Email).required());
/// let limiter = Arc::new(RateLimiter::default());
///
/// let form = SecureForm::new(config, limiter, |data: SanitizedPayload, token: String| async move {
///     assert!(data.get("email").is_some());
///     assert!(!token.is_empty());
///     Ok::<(), String>(())
/// });
///
/// form.set_field("email", "ada@example.com")?;
/// form.submit().await?;
///
/// assert_eq!(form.field("email").map(|f| f.value), Some(String::new()));
/// # Ok(())
/// # }
/// ```
pub struct SecureForm<H, C: Clock = SystemClock> {
    config: FormConfig,
    limiter: Arc<RateLimiter<C>>,
    handler: H,
    honeypot: Option<HoneypotField>,
    state: Mutex<FormState>,
    log: FormLog,
    audit: FormAudit,
}

impl<H: SubmitHandler, C: Clock> SecureForm<H, C> {
    /// Mounts a form: issues its CSRF token and, if enabled, its honeypot.
    pub fn new(config: FormConfig, limiter: Arc<RateLimiter<C>>, handler: H) -> Self {
        let log = FormLog::new(config.form_id());
        let audit = FormAudit::new(config.form_id(), None);
        let honeypot = config.honeypot_enabled().then(create_honeypot);

        log.debug(format_args!(
            "mounted with {} field(s), honeypot={}, rate_limit={}",
            config.fields().len(),
            config.honeypot_enabled(),
            config.rate_limit_enabled()
        ));

        Self {
            config,
            limiter,
            handler,
            honeypot,
            state: Mutex::new(FormState {
                phase: FormPhase::Idle,
                last_outcome: None,
                values: FieldValues::new(),
                honeypot_value: String::new(),
                errors: Vec::new(),
                warnings: Vec::new(),
                form_error: None,
                block: None,
                csrf: CsrfTokenManager::new(),
                mounted: true,
            }),
            log,
            audit,
        }
    }

    /// Records the outcome of every submit cycle into `trail`.
    pub fn with_audit(mut self, trail: Arc<AuditTrail>) -> Self {
        self.audit = FormAudit::new(self.config.form_id(), Some(trail));
        self
    }

    /// Returns the form configuration.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Returns the logging handle bound to this form.
    pub fn log(&self) -> &FormLog {
        &self.log
    }

    /// Change handler for one field.
    ///
    /// Only mutates the value; no validation runs until the next submit.
    /// Edits addressed to the honeypot are accepted like any other.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] if the form declares no field
    /// called `name`.
    pub fn set_field(&self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let mut state = self.state.lock();
        if self
            .honeypot
            .as_ref()
            .is_some_and(|h| h.field_name() == name)
        {
            state.honeypot_value = value.into();
            return Ok(());
        }
        if self.config.find_field(name).is_none() {
            return Err(FormError::UnknownField(name.to_string()));
        }
        state.values.set(name, value);
        Ok(())
    }

    /// Returns the rendering snapshot of `name`.
    pub fn field(&self, name: &str) -> Option<FieldView> {
        let definition = self.config.find_field(name)?;
        let state = self.state.lock();
        Some(Self::view(definition, &state))
    }

    /// Returns rendering snapshots of every declared field, in order.
    pub fn fields(&self) -> Vec<FieldView> {
        let state = self.state.lock();
        self.config
            .fields()
            .iter()
            .map(|definition| Self::view(definition, &state))
            .collect()
    }

    fn view(definition: &FieldDefinition, state: &FormState) -> FieldView {
        FieldView {
            name: definition.name().to_string(),
            label: definition.label().to_string(),
            kind: definition.kind(),
            value: state.values.get(definition.name()).to_string(),
            error: state
                .errors
                .iter()
                .find(|e| e.field == definition.name())
                .map(|e| e.message.clone()),
            required: definition.is_required(),
            placeholder: definition.placeholder_text().map(str::to_string),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> FormPhase {
        self.state.lock().phase
    }

    /// Returns the phase the last submit cycle ended in, before going idle.
    pub fn last_outcome(&self) -> Option<FormPhase> {
        self.state.lock().last_outcome
    }

    /// Returns true while the submit handler is running.
    pub fn is_submitting(&self) -> bool {
        self.phase() == FormPhase::Submitting
    }

    /// Returns true while the rate limiter block is in force.
    pub fn is_blocked(&self) -> bool {
        self.active_block().is_some()
    }

    /// Returns why the form is blocked, while it is.
    pub fn block_reason(&self) -> Option<String> {
        self.active_block().map(|(reason, _)| reason)
    }

    /// Returns how long until the block lifts, while it is in force.
    pub fn retry_after(&self) -> Option<Duration> {
        self.active_block().map(|(_, remaining)| remaining)
    }

    fn active_block(&self) -> Option<(String, Duration)> {
        let now = self.limiter.now();
        let state = self.state.lock();
        state.block.as_ref().and_then(|block| {
            let remaining = block.remaining(now);
            (!remaining.is_zero()).then(|| (block.reason.clone(), remaining))
        })
    }

    /// Returns the field errors from the last validation pass.
    pub fn errors(&self) -> Vec<ValidationError> {
        self.state.lock().errors.clone()
    }

    /// Returns the warnings from the last validation pass.
    pub fn warnings(&self) -> Vec<ValidationError> {
        self.state.lock().warnings.clone()
    }

    /// Returns the form-level error from the last submit cycle.
    pub fn form_error(&self) -> Option<String> {
        self.state.lock().form_error.clone()
    }

    /// Returns the current CSRF token value, for a hidden field or header.
    pub fn csrf_token(&self) -> String {
        self.state.lock().csrf.current().expose().to_string()
    }

    /// Returns how many times the CSRF token has been rotated.
    pub fn csrf_rotations(&self) -> u64 {
        self.state.lock().csrf.rotations()
    }

    /// Returns the honeypot field, if enabled.
    pub fn honeypot(&self) -> Option<&HoneypotField> {
        self.honeypot.as_ref()
    }

    /// Tears the controller down.
    ///
    /// A handler still in flight runs to completion, but its result is
    /// discarded: no values are cleared and no token is rotated.
    pub fn unmount(&self) {
        let mut state = self.state.lock();
        if state.mounted {
            state.mounted = false;
            self.log.debug(format_args!("unmounted in phase {}", state.phase));
        }
    }

    /// Returns false once [`unmount`](Self::unmount) was called.
    pub fn is_mounted(&self) -> bool {
        self.state.lock().mounted
    }

    /// Runs one submit cycle.
    ///
    /// # Errors
    ///
    /// - [`FormError::InFlight`] if a submission is already running
    /// - [`FormError::SubmitFailed`] with the generic message if the
    ///   honeypot was filled, or with the handler's message if it failed
    /// - [`FormError::RateLimited`] if the form is over its budget
    /// - [`FormError::Validation`] if any field has an error
    /// - [`FormError::Unmounted`] if the form was torn down
    ///
    /// Field errors and honeypot hits do not count against the rate limit;
    /// an attempt is consumed only right before the handler is called.
    pub async fn submit(&self) -> Result<SubmitReceipt, FormError> {
        let (payload, token, warnings) = {
            let mut state = self.state.lock();
            if !state.mounted {
                return Err(FormError::Unmounted);
            }
            if state.phase == FormPhase::Submitting {
                self.log.debug(format_args!("submit ignored, already in flight"));
                return Err(FormError::InFlight);
            }
            self.transition(&mut state, FormPhase::Validating);
            state.form_error = None;
            // A block or bot rejection leaves no field findings behind.
            state.errors.clear();
            state.warnings.clear();

            if let Some(honeypot) = &self.honeypot {
                if honeypot.is_triggered(&state.honeypot_value) {
                    self.log.warn(format_args!("submission rejected"));
                    self.audit
                        .record(AuditEventKind::BotDetected, AuditOutcome::Denied, None);
                    state.form_error = Some(GENERIC_FAILURE_MESSAGE.to_string());
                    self.finish(&mut state, FormPhase::Failed);
                    return Err(FormError::generic_failure());
                }
            }

            if self.config.rate_limit_enabled() {
                let decision = self
                    .limiter
                    .check(self.config.form_id(), self.config.submission_limit());
                if !decision.admitted {
                    return Err(self.block(&mut state, decision));
                }
            }

            let report = validate_and_sanitize_form(&state.values, self.config.fields());
            state.warnings = report.warnings;
            if !report.is_valid {
                self.log.warn(format_args!(
                    "validation failed with {} error(s)",
                    report.errors.len()
                ));
                self.audit.record(
                    AuditEventKind::ValidationFailed,
                    AuditOutcome::Denied,
                    Some(format!("{} field error(s)", report.errors.len())),
                );
                state.errors = report.errors.clone();
                self.finish(&mut state, FormPhase::Failed);
                return Err(FormError::Validation(report.errors));
            }

            if self.config.rate_limit_enabled() {
                let decision = self
                    .limiter
                    .attempt_with_limit(self.config.form_id(), self.config.submission_limit());
                if !decision.admitted {
                    return Err(self.block(&mut state, decision));
                }
            }

            let mut payload = report.sanitized_data;
            if let Some(honeypot) = &self.honeypot {
                payload.insert_raw(honeypot.field_name(), state.honeypot_value.clone());
            }
            let token = state.csrf.current().expose().to_string();
            self.transition(&mut state, FormPhase::Submitting);
            (payload, token, state.warnings.clone())
        };

        let fields_submitted = payload.len();
        let outcome = self.handler.call(payload, token).await;

        let mut state = self.state.lock();
        if !state.mounted {
            self.log
                .debug(format_args!("discarding handler result after unmount"));
            return Err(FormError::Unmounted);
        }

        match outcome {
            Ok(()) => {
                state.values.clear();
                state.honeypot_value.clear();
                state.errors.clear();
                state.warnings.clear();
                state.form_error = None;
                state.csrf.rotate();
                self.log.info(format_args!(
                    "submission accepted with {} field(s)",
                    fields_submitted
                ));
                self.audit
                    .record(AuditEventKind::Submission, AuditOutcome::Success, None);
                self.finish(&mut state, FormPhase::Success);
                Ok(SubmitReceipt {
                    fields_submitted,
                    warnings,
                })
            }
            Err(error) => {
                let mut message = error.to_string();
                if message.trim().is_empty() {
                    message = GENERIC_FAILURE_MESSAGE.to_string();
                }
                self.log.warn(format_args!("submit handler failed"));
                self.audit
                    .record(AuditEventKind::HandlerFailed, AuditOutcome::Error, None);
                state.form_error = Some(message.clone());
                self.finish(&mut state, FormPhase::Failed);
                Err(FormError::SubmitFailed { message })
            }
        }
    }

    fn block(&self, state: &mut FormState, decision: RateLimitDecision) -> FormError {
        let retry_after = decision
            .retry_after
            .unwrap_or_else(|| self.limiter.config().window());
        let reason = RATE_LIMIT_REASON.to_string();

        self.log.warn(format_args!(
            "rate limited, retry in {}s",
            retry_after.as_secs().max(1)
        ));
        self.audit.record(
            AuditEventKind::RateLimited,
            AuditOutcome::Denied,
            Some(format!("retry in {}s", retry_after.as_secs().max(1))),
        );
        state.block = Some(Block {
            reason: reason.clone(),
            since: self.limiter.now(),
            retry_after,
        });
        self.finish(state, FormPhase::Blocked);

        FormError::RateLimited {
            reason,
            retry_after,
        }
    }

    fn finish(&self, state: &mut FormState, outcome: FormPhase) {
        self.transition(state, outcome);
        self.transition(state, FormPhase::Idle);
    }

    fn transition(&self, state: &mut FormState, to: FormPhase) {
        self.log.transition(state.phase, to);
        if to.is_outcome() {
            state.last_outcome = Some(to);
        }
        state.phase = to;
    }
}

impl<H, C: Clock> fmt::Debug for SecureForm<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureForm")
            .field("form_id", &self.config.form_id())
            .field("phase", &self.state.lock().phase)
            .field("honeypot", &self.honeypot)
            .finish_non_exhaustive()
    }
}
