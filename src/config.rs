use crate::field::FieldDefinition;
use crate::rate_limit::DEFAULT_MAX_SUBMISSIONS;

/// Per-instance configuration of a secure form.
///
/// `FormConfig` is the only way to describe a form to
/// [`SecureForm`](crate::SecureForm). Build it with the consuming builder
/// methods; the result is immutable once the form is mounted.
///
/// # Examples
///
/// ```
/// use secure_form::{FieldDefinition, FieldKind, FormConfig};
///
/// let config = FormConfig::new("contact")
///     .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
///     .field(FieldDefinition::new("message", "Message", FieldKind::Textarea))
///     .max_submissions(5);
///
/// assert_eq!(config.form_id(), "contact");
/// assert_eq!(config.fields().len(), 2);
/// assert!(config.honeypot_enabled());
/// assert_eq!(config.submission_limit(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct FormConfig {
    form_id: String,
    fields: Vec<FieldDefinition>,
    enable_honeypot: bool,
    enable_rate_limit: bool,
    max_submissions: u32,
}

impl FormConfig {
    /// Creates a configuration with no fields and the default protections.
    ///
    /// `form_id` is also the rate limiter key, so forms sharing an id share
    /// a submission budget.
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            fields: Vec::new(),
            enable_honeypot: true,
            enable_rate_limit: true,
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
        }
    }

    /// Adds a field, deduplicating by name.
    ///
    /// If a field with the same name is already declared the new definition
    /// is ignored; the first declaration wins.
    ///
    /// ```
    /// use secure_form::{FieldDefinition, FieldKind, FormConfig};
    ///
    /// let config = FormConfig::new("signup")
    ///     .field(FieldDefinition::new("email", "Email", FieldKind::Email).required())
    ///     .field(FieldDefinition::new("email", "Other", FieldKind::Text));
    ///
    /// assert_eq!(config.fields().len(), 1);
    /// assert_eq!(config.fields()[0].label(), "Email");
    /// ```
    pub fn field(mut self, field: FieldDefinition) -> Self {
        if !self.fields.iter().any(|f| f.name() == field.name()) {
            self.fields.push(field);
        }
        self
    }

    /// Enables or disables the honeypot field.
    pub fn honeypot(mut self, enabled: bool) -> Self {
        self.enable_honeypot = enabled;
        self
    }

    /// Enables or disables submission rate limiting.
    pub fn rate_limit(mut self, enabled: bool) -> Self {
        self.enable_rate_limit = enabled;
        self
    }

    /// Sets how many submissions are admitted per rate limit window.
    pub fn max_submissions(mut self, max: u32) -> Self {
        self.max_submissions = max;
        self
    }

    /// Returns the form identifier.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Returns the declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns the declared field called `name`.
    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns true if a honeypot field is rendered and checked.
    pub fn honeypot_enabled(&self) -> bool {
        self.enable_honeypot
    }

    /// Returns true if submissions go through the rate limiter.
    pub fn rate_limit_enabled(&self) -> bool {
        self.enable_rate_limit
    }

    /// Returns the per-window submission budget.
    pub fn submission_limit(&self) -> u32 {
        self.max_submissions
    }
}
