use regex::Regex;

use crate::error::FormError;

/// Per-field sanitization and validation rules.
///
/// A `FieldPolicy` is owned by the form definition and never changes after
/// the form is mounted. Build it with the consuming builder methods:
///
/// ```
/// use secure_form::FieldPolicy;
///
/// let policy = FieldPolicy::new("username")
///     .required(true)
///     .min_length(3)
///     .max_length(32)
///     .pattern(r"^[a-z0-9_]+$", "Only lowercase letters, digits and underscores")
///     .expect("pattern compiles");
///
/// assert!(policy.is_required());
/// assert_eq!(policy.max_len(), Some(32));
/// ```
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    name: String,
    required: bool,
    sanitize: bool,
    multiline: bool,
    pattern: Option<Regex>,
    pattern_message: Option<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl FieldPolicy {
    /// Creates a policy for `name` with sanitization on and no other rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            sanitize: true,
            multiline: false,
            pattern: None,
            pattern_message: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Enables or disables markup removal for this field.
    ///
    /// Control characters are stripped and length bounds enforced either way.
    pub fn sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    /// Allows newlines and tabs to survive sanitization.
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Sets the minimum length in characters.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Sets the maximum length in characters. Longer values are truncated.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Adds a custom pattern the trimmed value must match.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidPattern`] if the expression does not compile.
    pub fn pattern(
        mut self,
        pattern: &str,
        message: impl Into<String>,
    ) -> Result<Self, FormError> {
        let regex = Regex::new(pattern).map_err(|e| FormError::InvalidPattern {
            field: self.name.clone(),
            message: e.to_string(),
        })?;
        self.pattern = Some(regex);
        self.pattern_message = Some(message.into());
        Ok(self)
    }

    /// Returns the field name this policy applies to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if an empty value is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns true if markup removal is enabled.
    pub fn sanitizes(&self) -> bool {
        self.sanitize
    }

    /// Returns true if newlines and tabs are kept.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Returns the custom pattern, if any.
    pub fn pattern_regex(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Returns the message reported when the custom pattern does not match.
    pub fn pattern_message(&self) -> &str {
        self.pattern_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("Invalid format")
    }

    /// Returns the minimum length, if any.
    pub fn min_len(&self) -> Option<usize> {
        self.min_length
    }

    /// Returns the maximum length, if any.
    pub fn max_len(&self) -> Option<usize> {
        self.max_length
    }
}
