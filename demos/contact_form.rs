//! A contact form walked through a full submit cycle.
//!
//! Run with `cargo run --example contact_form`. Logging is set to debug so
//! phase transitions and audit events show up next to the output.

use std::sync::Arc;

use secure_form::audit::AuditTrail;
use secure_form::{
    FieldDefinition, FieldKind, FormConfig, FormError, RateLimiter, SanitizedPayload, SecureForm,
};

async fn send_to_backend(data: SanitizedPayload, csrf_token: String) -> Result<(), String> {
    println!("POST /contact  X-CSRF-Token: {}...", &csrf_token[..8]);
    for (name, value) in data.iter() {
        println!("  {name} = {value:?}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(true)
        .init();

    let config = FormConfig::new("contact")
        .field(FieldDefinition::new("name", "Name", FieldKind::Text).required())
        .field(
            FieldDefinition::new("email", "Email", FieldKind::Email)
                .required()
                .placeholder("you@example.com"),
        )
        .field(FieldDefinition::new("message", "Message", FieldKind::Textarea))
        .max_submissions(2);
    let limiter = Arc::new(RateLimiter::default());
    let trail = Arc::new(AuditTrail::with_limit(64));
    let form = SecureForm::new(config, limiter, send_to_backend).with_audit(Arc::clone(&trail));

    if let Some(honeypot) = form.honeypot() {
        println!("honeypot field: {:?}", honeypot.attributes());
    }

    println!("\n-- missing fields --");
    if let Err(FormError::Validation(errors)) = form.submit().await {
        for error in errors {
            println!("  {error}");
        }
    }

    println!("\n-- hostile input --");
    form.set_field("name", "Mallory <img src=x onerror=alert(1)>").ok();
    form.set_field("email", "mallory@example.com").ok();
    form.set_field("message", "Hello\n<script>document.cookie</script>world").ok();
    match form.submit().await {
        Ok(receipt) => {
            for warning in receipt.warnings {
                println!("  warning: {warning}");
            }
        }
        Err(err) => println!("  rejected: {err}"),
    }

    println!("\n-- repeated submits --");
    for _ in 0..2 {
        form.set_field("name", "Ada").ok();
        form.set_field("email", "ada@example.com").ok();
        match form.submit().await {
            Ok(_) => println!("  accepted"),
            Err(err) => println!("  {err}"),
        }
    }
    println!("  blocked: {:?}", form.block_reason());

    println!("\n-- audit trail --");
    for event in trail.events() {
        println!("  {event}");
    }
}
