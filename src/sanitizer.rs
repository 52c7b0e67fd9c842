//! Field value sanitization.
//!
//! [`sanitize`] turns an untrusted field value into a string that is safe to
//! store or display. It is pure, never fails and is idempotent:
//! `sanitize(&sanitize(x, p), p) == sanitize(x, p)` for every input.

use crate::policy::FieldPolicy;

/// URL schemes that execute code when rendered as a link target.
const DANGEROUS_SCHEMES: [&str; 2] = ["javascript:", "vbscript:"];

/// Elements whose whole body is removed, not just the tags.
const BLOCK_ELEMENTS: [&str; 2] = ["script", "style"];

/// Result of sanitizing one value, with flags describing what changed.
///
/// The sanitizer never reports anything itself; callers such as the form
/// validator turn these flags into warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeReport {
    /// The cleaned value.
    pub value: String,
    /// The value was cut to the policy's maximum length.
    pub truncated: bool,
    /// Markup or script-bearing content was removed or escaped.
    pub neutralized: bool,
}

/// Sanitizes `value` according to `policy`.
///
/// # Examples
///
/// ```
/// use secure_form::{sanitize, FieldPolicy};
///
/// let policy = FieldPolicy::new("comment");
/// let cleaned = sanitize("  <b>hi</b><script>alert(1)</script> a < b ", &policy);
///
/// assert_eq!(cleaned, "hi a &lt; b");
/// assert_eq!(sanitize(&cleaned, &policy), cleaned);
/// ```
pub fn sanitize(value: &str, policy: &FieldPolicy) -> String {
    sanitize_report(value, policy).value
}

/// Sanitizes `value` and reports whether it was truncated or neutralized.
///
/// Steps, in order:
/// 1. Drop control characters (newlines and tabs survive on multi-line
///    policies) and invisible formatting characters.
/// 2. When the policy sanitizes: remove `<script>`/`<style>` blocks, markup
///    tags and executable URL schemes until nothing changes, then escape any
///    leftover angle brackets.
/// 3. When the policy sanitizes, trim surrounding whitespace. Values of
///    non-sanitizing fields such as passwords keep their spaces.
/// 4. Truncate to the policy's maximum length in characters.
pub fn sanitize_report(value: &str, policy: &FieldPolicy) -> SanitizeReport {
    let multiline = policy.is_multiline();
    let mut cleaned: String = value
        .chars()
        .filter(|&c| is_allowed_char(c, multiline))
        .collect();

    let mut neutralized = false;
    if policy.sanitizes() {
        let escaped = escape_angle_brackets(&strip_markup(&cleaned));
        neutralized = escaped != cleaned;
        cleaned = escaped;
    }

    let trim = policy.sanitizes();
    let trimmed = if trim { cleaned.trim() } else { cleaned.as_str() };
    let (value, truncated) = match policy.max_len() {
        Some(max) if trimmed.chars().count() > max => {
            let cut: String = trimmed.chars().take(max).collect();
            let cut = if trim { cut.trim_end().to_string() } else { cut };
            (cut, true)
        }
        _ => (trimmed.to_string(), false),
    };

    SanitizeReport {
        value,
        truncated,
        neutralized,
    }
}

fn is_allowed_char(c: char, multiline: bool) -> bool {
    if multiline && matches!(c, '\n' | '\t') {
        return true;
    }
    !c.is_control() && !is_invisible_formatting(c)
}

/// Zero-width and bidirectional override characters.
fn is_invisible_formatting(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
            | '\u{E0000}'..='\u{E007F}'
    )
}

fn strip_markup(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut next = current.clone();
        for element in BLOCK_ELEMENTS {
            next = remove_blocks(&next, element);
        }
        next = strip_schemes(&strip_tags(&next));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Removes `<tag ...>...</tag>` blocks. An unclosed block runs to the end.
fn remove_blocks(input: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(rel) = lower[pos..].find(&open) {
        let start = pos + rel;
        let after = start + open.len();
        if lower[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            // `<scripts>` is a different element.
            out.push_str(&input[pos..after]);
            pos = after;
            continue;
        }

        out.push_str(&input[pos..start]);
        pos = match lower[after..].find(&close) {
            Some(rel_close) => {
                let close_start = after + rel_close;
                match lower[close_start..].find('>') {
                    Some(gt) => close_start + gt + 1,
                    None => input.len(),
                }
            }
            None => input.len(),
        };
    }
    out.push_str(&input[pos..]);
    out
}

/// Removes anything shaped like a tag: `<` followed by a letter, `/`, `!`
/// or `?`, up to the next `>`. Bare `<` characters are left for escaping.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(lt) = rest.find('<') {
        let tail = &rest[lt + 1..];
        let starts_tag = tail
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        match (starts_tag, tail.find('>')) {
            (true, Some(gt)) => {
                out.push_str(&rest[..lt]);
                rest = &tail[gt + 1..];
            }
            _ => {
                out.push_str(&rest[..=lt]);
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_schemes(input: &str) -> String {
    let mut out = input.to_string();
    for scheme in DANGEROUS_SCHEMES {
        while let Some(idx) = out.to_ascii_lowercase().find(scheme) {
            out.replace_range(idx..idx + scheme.len(), "");
        }
    }
    out
}

fn escape_angle_brackets(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
