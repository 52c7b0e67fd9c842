//! Honeypot fields for bot detection.
//!
//! A honeypot is a real form field that humans never see or reach. Scripted
//! submitters that fill every input they find will fill it too, which marks
//! the submission as automated.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

/// Plausible stems so the decoy looks like any other optional field.
const NAME_STEMS: [&str; 6] = [
    "website",
    "company_url",
    "fax_number",
    "middle_name",
    "address_line3",
    "nickname",
];

const SUFFIX_LEN: usize = 8;

/// Keeps the field off-screen with no visual footprint and no pointer target.
const HIDDEN_STYLE: &str = "position:absolute;left:-10000px;top:auto;width:1px;height:1px;overflow:hidden;opacity:0;pointer-events:none";

/// A decoy field bound to one form instance.
///
/// The name is generated per instance so bots cannot keep a list of known
/// honeypot names. The expected value is always the empty string.
///
/// # Examples
///
/// ```
/// use secure_form::create_honeypot;
///
/// let honeypot = create_honeypot();
///
/// assert!(!honeypot.is_triggered(""));
/// assert!(honeypot.is_triggered("http://spam.example"));
/// assert!(honeypot.attributes().iter().any(|(k, v)| *k == "tabindex" && v == "-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoneypotField {
    field_name: String,
}

impl HoneypotField {
    /// Returns the generated field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Returns the value a human submission carries, always `""`.
    pub fn expected_value(&self) -> &'static str {
        ""
    }

    /// Returns true if `value` indicates an automated fill.
    ///
    /// Any non-empty value counts, including whitespace.
    pub fn is_triggered(&self, value: &str) -> bool {
        value != self.expected_value()
    }

    /// Attributes the rendering layer must put on the input element.
    ///
    /// They remove the field from the tab order, from assistive technology and
    /// from pointer input, and give it zero visual footprint, while leaving it
    /// a genuine input whose value is serialized with the form.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.field_name.clone()),
            ("type", "text".to_string()),
            ("tabindex", "-1".to_string()),
            ("autocomplete", "off".to_string()),
            ("aria-hidden", "true".to_string()),
            ("style", HIDDEN_STYLE.to_string()),
        ]
    }
}

/// Creates a honeypot field with an unpredictable name.
pub fn create_honeypot() -> HoneypotField {
    let mut rng = rand::thread_rng();
    let stem = NAME_STEMS.choose(&mut rng).copied().unwrap_or("website");
    let suffix: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    HoneypotField {
        field_name: format!("{}_{}", stem, suffix),
    }
}
