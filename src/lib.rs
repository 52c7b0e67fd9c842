//! Secure form submission pipeline.
//!
//! This crate keeps hostile input from reaching a network boundary through:
//! - **Sanitization**: control characters, markup and script schemes are
//!   removed per field policy
//! - **Validation**: required fields, format checks and custom rules, with
//!   errors reported per field in declaration order
//! - **Bot detection**: a honeypot field with an unpredictable name
//! - **Anti-forgery tokens**: a CSRF token per form, rotated after every
//!   accepted submission
//! - **Rate limiting**: a shared sliding-window limiter keyed per form
//!
//! # Core Types
//!
//! - [`SecureForm`]: Controller for one mounted form instance
//! - [`FormConfig`]: Builder describing a form's fields and protections
//! - [`SanitizedPayload`]: The only shape in which values reach a handler
//! - [`RateLimiter`]: Process-wide limiter with an injectable [`Clock`]
//! - [`Secret<T>`]: Wrapper that redacts sensitive values in logs/output
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use secure_form::{
//!     FieldDefinition, FieldKind, FormConfig, FormError, RateLimiter, SanitizedPayload,
//!     SecureForm,
//! };
//!
//! # async fn run() {
//! let config = FormConfig::new("contact")
//!     .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
//!     .field(FieldDefinition::new("message", "Message", FieldKind::Textarea));
//! let limiter = Arc::new(RateLimiter::default());
//!
//! let form = SecureForm::new(config, limiter, |data: SanitizedPayload, _token: String| async move {
//!     // Markup never reaches the handler.
//!     assert_eq!(data.get("message"), Some("hello"));
//!     Ok::<(), String>(())
//! });
//!
//! form.set_field("message", "<script>steal()</script>hello").unwrap();
//! match form.submit().await {
//!     Err(FormError::Validation(errors)) => assert_eq!(errors[0].message, "Email is required"),
//!     other => panic!("unexpected {:?}", other),
//! }
//!
//! form.set_field("email", "ada@example.com").unwrap();
//! assert!(form.submit().await.is_ok());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod clock;
mod config;
mod controller;
mod csrf;
mod error;
mod field;
mod honeypot;
mod logging;
mod payload;
mod policy;
mod rate_limit;
mod sanitizer;
mod secret;
mod validator;

#[cfg(test)]
mod test_utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FormConfig;
pub use controller::{
    FieldView, FormPhase, SecureForm, SubmitHandler, SubmitReceipt, RATE_LIMIT_REASON,
};
pub use csrf::{generate_csrf_token, CsrfToken, CsrfTokenManager, CSRF_TOKEN_LENGTH};
pub use error::{FormError, GENERIC_FAILURE_MESSAGE};
pub use field::{FieldDefinition, FieldKind, FieldValues, RenderStrategy};
pub use honeypot::{create_honeypot, HoneypotField};
pub use logging::FormLog;
pub use payload::SanitizedPayload;
pub use policy::FieldPolicy;
pub use rate_limit::{
    RateLimitConfig, RateLimitDecision, RateLimiter, DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW,
};
pub use sanitizer::{sanitize, sanitize_report, SanitizeReport};
pub use secret::Secret;
pub use validator::{validate_and_sanitize_form, Severity, ValidationError, ValidationReport};
