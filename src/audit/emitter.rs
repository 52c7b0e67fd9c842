//! Per-form audit emitter.

use std::sync::Arc;

use super::{AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};

/// Emits audit events for one form instance.
///
/// Every event is logged through `tracing` under the `secure_form_audit`
/// target and, if a trail is attached, recorded there too.
#[derive(Debug, Clone)]
pub struct FormAudit {
    form_id: String,
    trail: Option<Arc<AuditTrail>>,
}

impl FormAudit {
    /// This is `pub(crate)` - only the controller creates emitters.
    pub(crate) fn new(form_id: impl Into<String>, trail: Option<Arc<AuditTrail>>) -> Self {
        Self {
            form_id: form_id.into(),
            trail,
        }
    }

    /// Returns the attached trail, if any.
    pub fn trail(&self) -> Option<&Arc<AuditTrail>> {
        self.trail.as_ref()
    }

    /// Builds, emits and records an event for this form.
    pub(crate) fn record(&self, kind: AuditEventKind, outcome: AuditOutcome, detail: Option<String>) {
        let mut event = AuditEvent::new(self.form_id.as_str(), kind, outcome);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.emit(&event);
        if let Some(trail) = &self.trail {
            trail.record(event);
        }
    }

    /// Emits an event through the tracing infrastructure.
    pub fn emit(&self, event: &AuditEvent) {
        tracing::info!(
            target: "secure_form_audit",
            form_id = %event.form_id(),
            kind = %event.kind(),
            outcome = %event.outcome(),
            detail = ?event.detail(),
            "audit event"
        );
    }
}
