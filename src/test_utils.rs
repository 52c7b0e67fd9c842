//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::policy::FieldPolicy;

/// Strings mixing ordinary text with markup, schemes and control characters.
pub(crate) fn arb_hostile_string() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 ]{0,8}").unwrap(),
        Just("<script>".to_string()),
        Just("</script>".to_string()),
        Just("<style>".to_string()),
        Just("<b>".to_string()),
        Just("</".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        Just("javascript:".to_string()),
        Just("java".to_string()),
        Just("script:".to_string()),
        Just("&lt;".to_string()),
        Just("\n".to_string()),
        Just("\t".to_string()),
        Just("\u{0}".to_string()),
        Just("\u{200B}".to_string()),
        Just("世界".to_string()),
        Just("  ".to_string()),
    ];
    prop::collection::vec(fragment, 0..12).prop_map(|parts| parts.concat())
}

/// Non-empty strings of printable ASCII that the sanitizer leaves unchanged.
pub(crate) fn arb_plain_value(max_len: usize) -> impl Strategy<Value = String> {
    prop::string::string_regex(&format!("[a-zA-Z0-9]([a-zA-Z0-9 _.-]{{0,{}}}[a-zA-Z0-9])?", max_len.saturating_sub(2)))
        .unwrap()
}

/// Policies covering every combination of the sanitizer's switches.
pub(crate) fn arb_policy() -> impl Strategy<Value = FieldPolicy> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::option::of(0usize..32),
    )
        .prop_map(|(sanitize, multiline, max)| {
            let policy = FieldPolicy::new("field")
                .sanitize(sanitize)
                .multiline(multiline);
            match max {
                Some(max) => policy.max_length(max),
                None => policy,
            }
        })
}
