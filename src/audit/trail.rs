//! In-memory audit trail recorder.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::AuditEvent;

/// Shared recorder for audit events.
///
/// A trail is usually wrapped in an `Arc` and handed to every form that
/// should report into it. An unbounded trail keeps every event until
/// [`drain`](Self::drain) or [`clear`](Self::clear) is called, so long-lived
/// processes should either drain it into a persistent audit log or build it
/// with [`with_limit`](Self::with_limit), which drops the oldest events.
///
/// # Example
///
/// ```
/// use secure_form::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new("contact", AuditEventKind::BotDetected, AuditOutcome::Denied));
///
/// assert_eq!(trail.len(), 1);
/// assert_eq!(trail.events()[0].kind(), AuditEventKind::BotDetected);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<VecDeque<AuditEvent>>,
    limit: Option<usize>,
}

impl AuditTrail {
    /// Creates an empty, unbounded audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty trail holding at most `limit` events.
    ///
    /// Once full, each new event evicts the oldest one. A limit of zero
    /// keeps nothing.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            limit: Some(limit),
        }
    }

    /// Returns the event limit, if the trail is bounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Records an event. Events keep the order they were recorded in.
    pub fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        events.push_back(event);
        if let Some(limit) = self.limit {
            while events.len() > limit {
                events.pop_front();
            }
        }
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Removes and returns all recorded events.
    pub fn drain(&self) -> Vec<AuditEvent> {
        self.events.lock().drain(..).collect()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
