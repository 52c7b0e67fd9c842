//! Field kinds and declarations.
//!
//! The security pipeline never looks at how a field renders; [`FieldKind`]
//! only tells the rendering layer which element to draw and supplies the
//! kind's format check and default policy.

use std::collections::BTreeMap;
use std::fmt;

use crate::policy::FieldPolicy;

/// Closed set of supported field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single-line free text
    Text,
    /// Email address
    Email,
    /// Password; never altered by markup removal
    Password,
    /// Multi-line free text
    Textarea,
    /// Telephone number
    Tel,
    /// Absolute http(s) URL
    Url,
}

/// How the rendering layer should draw a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// An `<input>` element with the given `type` attribute.
    Input {
        /// Value of the `type` attribute
        input_type: &'static str,
    },
    /// A `<textarea>` element.
    TextArea {
        /// Suggested visible rows
        rows: u16,
    },
}

impl FieldKind {
    /// Returns the element the rendering layer should draw.
    pub fn render_strategy(self) -> RenderStrategy {
        match self {
            FieldKind::Text => RenderStrategy::Input { input_type: "text" },
            FieldKind::Email => RenderStrategy::Input {
                input_type: "email",
            },
            FieldKind::Password => RenderStrategy::Input {
                input_type: "password",
            },
            FieldKind::Textarea => RenderStrategy::TextArea { rows: 4 },
            FieldKind::Tel => RenderStrategy::Input { input_type: "tel" },
            FieldKind::Url => RenderStrategy::Input { input_type: "url" },
        }
    }

    /// Returns the `autocomplete` hint for this kind.
    pub fn autocomplete(self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Password => "current-password",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
            FieldKind::Text | FieldKind::Textarea => "on",
        }
    }

    /// Returns the `inputmode` hint, if the kind has one.
    pub fn input_mode(self) -> Option<&'static str> {
        match self {
            FieldKind::Email => Some("email"),
            FieldKind::Tel => Some("tel"),
            FieldKind::Url => Some("url"),
            _ => None,
        }
    }

    /// Returns the default policy for a field of this kind.
    pub fn default_policy(self, name: &str) -> FieldPolicy {
        let policy = FieldPolicy::new(name);
        match self {
            FieldKind::Text => policy.max_length(255),
            FieldKind::Email => policy.max_length(254),
            FieldKind::Password => policy.sanitize(false).max_length(128),
            FieldKind::Textarea => policy.multiline(true).max_length(5000),
            FieldKind::Tel => policy.max_length(32),
            FieldKind::Url => policy.max_length(2048),
        }
    }

    /// Checks the kind's format on a trimmed, non-empty value.
    ///
    /// Returns the message to report when the value does not fit.
    pub(crate) fn check_format(self, value: &str) -> Option<&'static str> {
        let ok = match self {
            FieldKind::Email => is_email(value),
            FieldKind::Url => is_http_url(value),
            FieldKind::Tel => is_phone(value),
            FieldKind::Text | FieldKind::Password | FieldKind::Textarea => true,
        };
        if ok {
            return None;
        }
        match self {
            FieldKind::Email => Some("Please enter a valid email address"),
            FieldKind::Url => Some("Please enter a valid URL"),
            FieldKind::Tel => Some("Please enter a valid phone number"),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
            FieldKind::Textarea => "textarea",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
        };
        f.write_str(name)
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(head, _)| !head.is_empty())
        && !domain.ends_with('.')
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_phone(value: &str) -> bool {
    let body = value.strip_prefix('+').unwrap_or(value);
    let digits = body.chars().filter(char::is_ascii_digit).count();
    body.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
        && (7..=15).contains(&digits)
}

/// Declaration of one form field.
///
/// ```
/// use secure_form::{FieldDefinition, FieldKind, RenderStrategy};
///
/// let email = FieldDefinition::new("email", "Email", FieldKind::Email)
///     .required()
///     .placeholder("you@example.com");
///
/// assert!(email.is_required());
/// assert!(email.policy().is_required());
/// assert_eq!(
///     email.kind().render_strategy(),
///     RenderStrategy::Input { input_type: "email" }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    name: String,
    label: String,
    kind: FieldKind,
    required: bool,
    placeholder: Option<String>,
    policy: FieldPolicy,
}

impl FieldDefinition {
    /// Declares a field with the kind's default policy.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let policy = kind.default_policy(&name);
        Self {
            name,
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            policy,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self.policy = self.policy.required(true);
        self
    }

    /// Sets the placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Replaces the kind's default policy.
    ///
    /// The field stays required if either the definition or the policy says so.
    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.required = self.required || policy.is_required();
        self.policy = policy.required(self.required);
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns true if the field must not be empty.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the placeholder text, if any.
    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns the effective policy.
    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }
}

/// Current raw values of a form's fields, keyed by field name.
///
/// Mutated on every change event and reset after a successful submit.
/// Missing fields read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: BTreeMap<String, String>,
}

impl FieldValues {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value of `name`, or `""` if it was never set.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Empties every field.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Returns true if every field is empty.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(String::is_empty)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
