use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use secure_form::audit::{AuditEventKind, AuditTrail};
use secure_form::{
    FieldDefinition, FieldKind, FieldPolicy, FormConfig, FormError, FormPhase, ManualClock,
    RateLimitConfig, RateLimiter, SanitizedPayload, SecureForm, Secret, Severity,
    GENERIC_FAILURE_MESSAGE,
};

type Submissions = Arc<Mutex<Vec<(SanitizedPayload, String)>>>;

fn recording_handler(
    submissions: Submissions,
) -> impl Fn(SanitizedPayload, String) -> std::future::Ready<Result<(), String>> {
    move |data, token| {
        submissions.lock().push((data, token));
        std::future::ready(Ok(()))
    }
}

fn manual_limiter() -> (ManualClock, Arc<RateLimiter<ManualClock>>) {
    let clock = ManualClock::new();
    let limiter = RateLimiter::with_clock(RateLimitConfig::default(), clock.clone());
    (clock, Arc::new(limiter))
}

fn contact_config() -> FormConfig {
    FormConfig::new("contact")
        .field(FieldDefinition::new("name", "Name", FieldKind::Text).required())
        .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
        .field(FieldDefinition::new("phone", "Phone", FieldKind::Tel))
        .field(
            FieldDefinition::new("message", "Message", FieldKind::Textarea)
                .with_policy(FieldPolicy::new("message").multiline(true).max_length(40)),
        )
}

#[test]
fn secret_is_fully_redacted() {
    let api_key = Secret::new("sk-secret123".to_string());

    let debug_out = format!("{:?}", api_key);
    assert_eq!(debug_out, "[REDACTED]");
    assert!(!debug_out.contains("String"));
    assert_eq!(format!("{}", api_key), "[REDACTED]");
}

#[tokio::test]
async fn single_submission_budget_scenario() {
    let (_clock, limiter) = manual_limiter();
    let submissions = Submissions::default();
    let config = FormConfig::new("newsletter")
        .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
        .max_submissions(1);
    let form = SecureForm::new(config, limiter, recording_handler(Arc::clone(&submissions)));
    let token_before = form.csrf_token();

    form.set_field("email", "a@b.com").unwrap();
    form.submit().await.unwrap();

    assert_eq!(submissions.lock().len(), 1);
    assert_eq!(form.last_outcome(), Some(FormPhase::Success));
    assert!(form.fields().iter().all(|f| f.value.is_empty()));
    assert_ne!(form.csrf_token(), token_before);

    form.set_field("email", "a@b.com").unwrap();
    let err = form.submit().await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(form.last_outcome(), Some(FormPhase::Blocked));
    assert!(form.retry_after().is_some_and(|d| d > Duration::ZERO));
    assert_eq!(submissions.lock().len(), 1);
}

#[tokio::test]
async fn empty_required_email_scenario() {
    let (_clock, limiter) = manual_limiter();
    let submissions = Submissions::default();
    let config = FormConfig::new("newsletter")
        .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
        .max_submissions(1);
    let form = SecureForm::new(config, Arc::clone(&limiter), recording_handler(Arc::clone(&submissions)));

    form.set_field("email", "").unwrap();
    let err = form.submit().await.unwrap_err();

    let FormError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "email");
    assert_eq!(errors[0].message, "Email is required");
    assert_eq!(errors[0].severity, Severity::Error);
    assert!(submissions.lock().is_empty());
    assert!(limiter.check("newsletter", 1).admitted);
}

#[tokio::test]
async fn hostile_contact_form_is_cleaned_before_handler() {
    let (_clock, limiter) = manual_limiter();
    let submissions = Submissions::default();
    let form = SecureForm::new(contact_config(), limiter, recording_handler(Arc::clone(&submissions)));

    form.set_field("name", "  Ada\u{200B} <b>Lovelace</b> ").unwrap();
    form.set_field("email", "ada@example.com").unwrap();
    form.set_field("phone", "+44 20 7946 0958").unwrap();
    form.set_field(
        "message",
        "Hi!\n<script>alert('x')</script><a href=\"javascript:steal()\">click</a> and more text here",
    )
    .unwrap();

    let receipt = form.submit().await.unwrap();

    let submissions = submissions.lock();
    let (payload, _) = &submissions[0];
    assert_eq!(payload.get("name"), Some("Ada Lovelace"));
    let message = payload.get("message").unwrap();
    assert!(message.starts_with("Hi!\n"));
    assert!(!message.contains('<'));
    assert!(!message.to_ascii_lowercase().contains("javascript:"));
    assert!(message.chars().count() <= 40);

    let warned: Vec<&str> = receipt.warnings.iter().map(|w| w.field.as_str()).collect();
    assert!(warned.contains(&"name"));
    assert!(warned.contains(&"message"));
    assert!(receipt.warnings.iter().all(|w| w.severity == Severity::Warning));
}

#[tokio::test]
async fn errors_follow_declaration_order() {
    let (_clock, limiter) = manual_limiter();
    let form = SecureForm::new(contact_config(), limiter, recording_handler(Submissions::default()));

    form.set_field("phone", "call me").unwrap();
    form.set_field("email", "nope").unwrap();
    let err = form.submit().await.unwrap_err();

    let FormError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "email", "phone"]);
    assert_eq!(form.field("email").unwrap().value, "nope");
}

#[tokio::test]
async fn bot_and_handler_failures_look_alike_to_callers() {
    let (_clock, limiter) = manual_limiter();
    let trail = Arc::new(AuditTrail::new());
    let form = SecureForm::new(
        contact_config(),
        limiter,
        |_data: SanitizedPayload, _token: String| async { Err::<(), _>(GENERIC_FAILURE_MESSAGE) },
    )
    .with_audit(Arc::clone(&trail));
    let honeypot = form.honeypot().unwrap().field_name().to_string();

    form.set_field("name", "Ada").unwrap();
    form.set_field("email", "ada@example.com").unwrap();
    form.set_field(&honeypot, "buy now").unwrap();
    let bot = form.submit().await.unwrap_err();

    form.set_field(&honeypot, "").unwrap();
    let failure = form.submit().await.unwrap_err();

    assert_eq!(bot, failure);
    let kinds: Vec<AuditEventKind> = trail.events().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![AuditEventKind::BotDetected, AuditEventKind::HandlerFailed]
    );
}

#[tokio::test]
async fn shared_limiter_isolates_form_ids() {
    let (clock, limiter) = manual_limiter();
    let config = |id: &str| {
        FormConfig::new(id)
            .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
            .max_submissions(1)
    };
    let login = SecureForm::new(config("login"), Arc::clone(&limiter), recording_handler(Submissions::default()));
    let signup = SecureForm::new(config("signup"), Arc::clone(&limiter), recording_handler(Submissions::default()));

    login.set_field("email", "a@b.com").unwrap();
    signup.set_field("email", "a@b.com").unwrap();
    assert!(login.submit().await.is_ok());
    assert!(signup.submit().await.is_ok());
    assert_eq!(limiter.len(), 2);

    clock.advance(Duration::from_secs(61));
    assert_eq!(limiter.evict_expired(), 2);
    assert!(limiter.is_empty());
}

#[test]
fn limiter_shared_across_threads_never_over_admits() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(
        10,
        Duration::from_secs(3600),
    )));

    let admitted: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                s.spawn(move || (0..20).filter(|_| limiter.attempt("shared").admitted).count())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(admitted, 10);
}
