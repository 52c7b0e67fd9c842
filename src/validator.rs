//! Whole-form validation and sanitization.

use std::collections::BTreeMap;
use std::fmt;

use crate::field::{FieldDefinition, FieldValues};
use crate::payload::SanitizedPayload;
use crate::sanitizer::sanitize_report;

/// Whether a finding blocks submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks submission
    Error,
    /// Informational only
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A field-level finding from one validation pass.
///
/// Produced per pass and never persisted. Messages never echo the
/// offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the field the finding belongs to
    pub field: String,
    /// Message to render next to the field
    pub message: String,
    /// Whether the finding blocks submission
    pub severity: Severity,
}

impl ValidationError {
    /// Creates a finding.
    pub fn new(field: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
        }
    }

    fn error(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, message, Severity::Error)
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, message, Severity::Warning)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.severity, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result of [`validate_and_sanitize_form`].
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// True iff `errors` holds no error-severity entry.
    pub is_valid: bool,
    /// A cleaned value for every declared field, valid or not.
    pub sanitized_data: SanitizedPayload,
    /// Blocking findings, in field declaration order.
    pub errors: Vec<ValidationError>,
    /// Non-blocking findings, in field declaration order.
    pub warnings: Vec<ValidationError>,
}

impl ValidationReport {
    /// Returns the first error for `field`, if any.
    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

/// Validates and sanitizes every declared field.
///
/// Fields are processed in declaration order, so errors come out in a
/// deterministic order regardless of how values were entered. For each
/// field:
///
/// 1. An empty (or whitespace-only) value on a required field yields
///    `"<label> is required"`; the field is then skipped and sent as `""`.
/// 2. The trimmed value is checked against the field kind's format, the
///    policy's minimum length and its custom pattern.
/// 3. The raw value goes through the sanitizer. Truncation and markup
///    removal become warnings. A required value that sanitizes to nothing
///    is an error, and a value whose markup removal breaks its format is
///    rechecked.
///
/// # Examples
///
/// ```
/// use secure_form::{validate_and_sanitize_form, FieldDefinition, FieldKind, FieldValues};
///
/// let fields = vec![FieldDefinition::new("email", "Email", FieldKind::Email).required()];
/// let values: FieldValues = [("email", "")].into_iter().collect();
///
/// let report = validate_and_sanitize_form(&values, &fields);
///
/// assert!(!report.is_valid);
/// assert_eq!(report.errors[0].field, "email");
/// assert_eq!(report.errors[0].message, "Email is required");
/// ```
pub fn validate_and_sanitize_form(
    values: &FieldValues,
    fields: &[FieldDefinition],
) -> ValidationReport {
    let mut sanitized = BTreeMap::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in fields {
        let name = field.name();
        let policy = field.policy();
        let subject = subject(field);
        let raw = values.get(name);
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            if policy.is_required() {
                errors.push(ValidationError::error(name, format!("{} is required", subject)));
            }
            sanitized.insert(name.to_string(), String::new());
            continue;
        }

        // Non-sanitizing fields keep their spaces, so their rules see them too.
        let checked = if policy.sanitizes() { trimmed } else { raw };
        let format_error = field.kind().check_format(trimmed);
        if let Some(message) = format_error {
            errors.push(ValidationError::error(name, message));
        }
        if let Some(min) = policy.min_len() {
            if checked.chars().count() < min {
                errors.push(ValidationError::error(
                    name,
                    format!("{} must be at least {} characters", subject, min),
                ));
            }
        }
        if let Some(pattern) = policy.pattern_regex() {
            if !pattern.is_match(checked) {
                errors.push(ValidationError::error(name, policy.pattern_message()));
            }
        }

        let report = sanitize_report(raw, policy);
        if report.truncated {
            let max = policy.max_len().unwrap_or_default();
            warnings.push(ValidationError::warning(
                name,
                format!("{} was truncated to {} characters", subject, max),
            ));
        }
        if report.value.is_empty() {
            if policy.is_required() {
                errors.push(ValidationError::error(
                    name,
                    format!("{} contains no usable content", subject),
                ));
            } else {
                warnings.push(ValidationError::warning(
                    name,
                    format!("{} contained only unsafe content and was cleared", subject),
                ));
            }
        } else if report.neutralized {
            warnings.push(ValidationError::warning(
                name,
                format!("{} contained markup that was removed", subject),
            ));
            // Removing markup can break a value that passed the format check.
            if format_error.is_none() {
                if let Some(message) = field.kind().check_format(&report.value) {
                    errors.push(ValidationError::error(name, message));
                }
            }
        }
        sanitized.insert(name.to_string(), report.value);
    }

    let is_valid = !errors.iter().any(|e| e.severity == Severity::Error);
    ValidationReport {
        is_valid,
        sanitized_data: SanitizedPayload::new(sanitized),
        errors,
        warnings,
    }
}

fn subject(field: &FieldDefinition) -> &str {
    let label = field.label().trim();
    if label.is_empty() {
        "Field"
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::policy::FieldPolicy;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs.iter().copied().collect()
    }

    fn contact_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("name", "Name", FieldKind::Text).required(),
            FieldDefinition::new("email", "Email", FieldKind::Email).required(),
            FieldDefinition::new("website", "Website", FieldKind::Url),
            FieldDefinition::new("message", "Message", FieldKind::Textarea),
        ]
    }

    #[test]
    fn valid_form_produces_clean_payload() {
        let report = validate_and_sanitize_form(
            &values(&[
                ("name", "  Ada Lovelace "),
                ("email", "ada@example.com"),
                ("message", "Hello\nthere"),
            ]),
            &contact_fields(),
        );

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.sanitized_data.get("name"), Some("Ada Lovelace"));
        assert_eq!(report.sanitized_data.get("message"), Some("Hello\nthere"));
        assert_eq!(report.sanitized_data.get("website"), Some(""));
    }

    #[test]
    fn required_fields_report_once_in_declaration_order() {
        let report = validate_and_sanitize_form(&values(&[("email", "   ")]), &contact_fields());

        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0], ValidationError::new("name", "Name is required", Severity::Error));
        assert_eq!(report.errors[1].field, "email");
        assert_eq!(report.errors[1].message, "Email is required");
        assert_eq!(report.sanitized_data.get("email"), Some(""));
    }

    #[test]
    fn blank_label_falls_back_to_generic_message() {
        let fields = vec![FieldDefinition::new("code", " ", FieldKind::Text).required()];
        let report = validate_and_sanitize_form(&FieldValues::new(), &fields);

        assert_eq!(report.errors[0].message, "Field is required");
    }

    #[test]
    fn optional_empty_fields_skip_rules() {
        let fields = vec![FieldDefinition::new("site", "Site", FieldKind::Url)
            .with_policy(FieldPolicy::new("site").min_length(10))];
        let report = validate_and_sanitize_form(&FieldValues::new(), &fields);

        assert!(report.is_valid);
    }

    #[test]
    fn format_errors_block_submission() {
        let report = validate_and_sanitize_form(
            &values(&[("name", "Ada"), ("email", "not-an-email"), ("website", "example.com")]),
            &contact_fields(),
        );

        assert!(!report.is_valid);
        assert_eq!(
            report.error_for("email").map(|e| e.message.as_str()),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            report.error_for("website").map(|e| e.message.as_str()),
            Some("Please enter a valid URL")
        );
    }

    #[test]
    fn min_length_and_pattern_rules() {
        let policy = FieldPolicy::new("username")
            .min_length(3)
            .pattern(r"^[a-z]+$", "Lowercase letters only")
            .expect("valid pattern");
        let fields = vec![FieldDefinition::new("username", "Username", FieldKind::Text).with_policy(policy)];

        let report = validate_and_sanitize_form(&values(&[("username", "A1")]), &fields);

        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Username must be at least 3 characters", "Lowercase letters only"]
        );
    }

    #[test]
    fn truncation_is_a_warning_not_an_error() {
        let fields = vec![FieldDefinition::new("name", "Name", FieldKind::Text)
            .with_policy(FieldPolicy::new("name").max_length(4))];

        let report = validate_and_sanitize_form(&values(&[("name", "Alexander")]), &fields);

        assert!(report.is_valid);
        assert_eq!(report.sanitized_data.get("name"), Some("Alex"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].severity, Severity::Warning);
        assert_eq!(report.warnings[0].message, "Name was truncated to 4 characters");
    }

    #[test]
    fn markup_removal_is_a_warning() {
        let report = validate_and_sanitize_form(
            &values(&[("name", "Ada <b>L</b>"), ("email", "ada@example.com")]),
            &contact_fields(),
        );

        assert!(report.is_valid);
        assert_eq!(report.sanitized_data.get("name"), Some("Ada L"));
        assert_eq!(report.warnings[0].message, "Name contained markup that was removed");
    }

    #[test]
    fn unsafe_only_optional_value_is_cleared_with_warning() {
        let report = validate_and_sanitize_form(
            &values(&[
                ("name", "Ada"),
                ("email", "ada@example.com"),
                ("message", "<script>alert(1)</script>"),
            ]),
            &contact_fields(),
        );

        assert!(report.is_valid);
        assert_eq!(report.sanitized_data.get("message"), Some(""));
        assert_eq!(
            report.warnings[0].message,
            "Message contained only unsafe content and was cleared"
        );
    }

    #[test]
    fn unsafe_only_required_value_is_an_error() {
        let report = validate_and_sanitize_form(
            &values(&[("name", "<script>x</script>"), ("email", "ada@example.com")]),
            &contact_fields(),
        );

        assert!(!report.is_valid);
        assert_eq!(report.errors[0].message, "Name contains no usable content");
    }

    #[test]
    fn password_keeps_surrounding_spaces() {
        let fields = vec![FieldDefinition::new("password", "Password", FieldKind::Password).required()];

        let report = validate_and_sanitize_form(&values(&[("password", "  hunter2  ")]), &fields);

        assert!(report.is_valid);
        assert_eq!(report.sanitized_data.get("password"), Some("  hunter2  "));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn whitespace_only_password_is_still_missing() {
        let fields = vec![FieldDefinition::new("password", "Password", FieldKind::Password).required()];

        let report = validate_and_sanitize_form(&values(&[("password", "   ")]), &fields);

        assert_eq!(report.errors[0].message, "Password is required");
    }

    #[test]
    fn format_is_rechecked_after_markup_removal() {
        let report = validate_and_sanitize_form(
            &values(&[("name", "Ada"), ("email", "<x>@b.com")]),
            &contact_fields(),
        );

        assert!(!report.is_valid);
        assert_eq!(
            report.error_for("email").map(|e| e.message.as_str()),
            Some("Please enter a valid email address")
        );
        assert_eq!(report.errors.iter().filter(|e| e.field == "email").count(), 1);
    }

    #[test]
    fn blank_pattern_message_falls_back() {
        let policy = FieldPolicy::new("zip")
            .pattern(r"^\d{5}$", "")
            .expect("valid pattern");
        let fields = vec![FieldDefinition::new("zip", "ZIP", FieldKind::Text).with_policy(policy)];

        let report = validate_and_sanitize_form(&values(&[("zip", "abc")]), &fields);

        assert_eq!(report.errors[0].message, "Invalid format");
    }

    #[test]
    fn undeclared_values_are_ignored() {
        let report = validate_and_sanitize_form(
            &values(&[("name", "Ada"), ("email", "ada@example.com"), ("admin", "true")]),
            &contact_fields(),
        );

        assert!(report.sanitized_data.get("admin").is_none());
        assert_eq!(report.sanitized_data.len(), 4);
    }

    #[test]
    fn messages_do_not_echo_input() {
        let secret = "<img src=x onerror=steal()>";
        let report = validate_and_sanitize_form(
            &values(&[("name", "Ada"), ("email", secret)]),
            &contact_fields(),
        );

        for finding in report.errors.iter().chain(report.warnings.iter()) {
            assert!(!finding.message.contains("steal"));
        }
    }

    mod proptests {
        use super::*;
        use crate::test_utils::arb_plain_value;
        use proptest::prelude::*;

        proptest! {
            /// Property: any required field left empty makes the form invalid
            /// and is named in the errors, whatever the other fields hold
            #[test]
            fn proptest_required_field_invariant(
                filled in prop::collection::vec(any::<bool>(), 1..6),
                text in arb_plain_value(20),
                whitespace in "[ \t]{0,3}",
            ) {
                let fields: Vec<FieldDefinition> = (0..filled.len())
                    .map(|i| FieldDefinition::new(format!("f{i}"), format!("F{i}"), FieldKind::Text).required())
                    .collect();
                let values: FieldValues = filled
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| (format!("f{i}"), if f { text.clone() } else { whitespace.clone() }))
                    .collect();

                let report = validate_and_sanitize_form(&values, &fields);

                prop_assert_eq!(report.is_valid, filled.iter().all(|&f| f));
                for (i, &f) in filled.iter().enumerate() {
                    let name = format!("f{i}");
                    prop_assert_eq!(report.error_for(&name).is_some(), !f);
                }
            }
        }
    }
}
