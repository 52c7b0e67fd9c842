//! Security audit trail for form submissions.
//!
//! This module provides:
//! - `AuditEvent`: structured record of one submit cycle's outcome
//! - `AuditTrail`: shared in-memory recorder
//! - `FormAudit`: per-form emitter that logs events through `tracing`
//!
//! Events are safe by default: they carry the form identifier, the outcome
//! and a short fixed detail string. Field values and tokens are never
//! recorded.

mod emitter;
mod event;
mod trail;

pub use emitter::FormAudit;
pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
