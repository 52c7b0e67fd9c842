use std::collections::BTreeMap;

/// Field values that have been through the validator and sanitizer.
///
/// `SanitizedPayload` is the only shape in which form data reaches the
/// submit handler. It has no public constructor and no `From` conversions,
/// so a handler can rely on every value having been cleaned.
///
/// Ownership moves into the handler; the controller keeps no copy.
///
/// ```compile_fail
/// use secure_form::SanitizedPayload;
///
/// // No public constructor:
/// let payload = SanitizedPayload::new(Default::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedPayload {
    fields: BTreeMap<String, String>,
}

impl SanitizedPayload {
    /// Only the validator and controller build payloads.
    pub(crate) fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Adds a field that bypasses sanitization, such as the honeypot.
    pub(crate) fn insert_raw(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the cleaned value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the payload and returns the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl AsRef<BTreeMap<String, String>> for SanitizedPayload {
    fn as_ref(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}
