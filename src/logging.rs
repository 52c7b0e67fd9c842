use std::fmt;

/// Logging handle bound to one form instance.
///
/// `FormLog` is created by the controller and attaches the form identifier
/// to every event, so log lines from concurrently mounted forms can be told
/// apart.
///
/// Field values and tokens are never passed to it. A [`Secret`](crate::Secret)
/// logged by accident still prints as `[REDACTED]` through its `Debug` and
/// `Display` implementations.
#[derive(Debug, Clone)]
pub struct FormLog {
    form_id: String,
}

impl FormLog {
    /// Creates a logger for `form_id`.
    ///
    /// This is `pub(crate)` - only the controller creates it.
    pub(crate) fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
        }
    }

    /// Returns the form identifier attached to every event.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Logs an info-level message with the form ID.
    ///
    /// Use with `format_args!`:
    /// ```no_run
    /// # use secure_form::FormLog;
    /// # fn example(log: &FormLog) {
    /// log.info(format_args!("submission accepted"));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(form_id = %self.form_id, "{}", args);
    }

    /// Logs a warning-level message with the form ID.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(form_id = %self.form_id, "{}", args);
    }

    /// Logs a debug-level message with the form ID.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(form_id = %self.form_id, "{}", args);
    }

    /// Logs a phase transition at debug level.
    pub(crate) fn transition(&self, from: impl fmt::Display, to: impl fmt::Display) {
        tracing::debug!(form_id = %self.form_id, from = %from, to = %to, "form phase changed");
    }
}
