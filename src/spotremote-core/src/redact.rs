//! Masks session credentials before URLs or response bodies reach the logs.
//!
//! The helper protocol carries its CSRF and OAuth tokens as plain query
//! parameters, and the bootstrap endpoints return them in small JSON bodies,
//! so both shapes are covered here.

use std::borrow::Cow;

const MASK: &str = "[REDACTED]";

/// Query parameter names whose values are credentials.
const SENSITIVE_PARAMS: &[&str] = &["csrf", "oauth", "token", "access_token"];

/// JSON keys whose string values are credentials.
const SENSITIVE_JSON_KEYS: &[&str] = &["\"t\"", "\"token\"", "\"access_token\""];

/// Redact credentials from a URL, query string or JSON snippet.
///
/// # Examples
/// ```
/// use spotremote_core::redact::redact_secrets;
///
/// let url = "https://abc.spotilocal.com:4370/remote/status.json?csrf=c0ffee&oauth=NQ";
/// let output = redact_secrets(url);
/// assert!(!output.contains("c0ffee"));
/// assert!(output.contains("csrf=[REDACTED]"));
/// ```
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut result = Cow::Borrowed(input);

    if let Some(redacted) = redact_query_params(&result) {
        result = Cow::Owned(redacted);
    }

    for key in SENSITIVE_JSON_KEYS {
        if result.contains(key) {
            result = Cow::Owned(redact_json_value(&result, key));
        }
    }

    result
}

/// Returns true when [`redact_secrets`] would change the input.
pub fn contains_sensitive(input: &str) -> bool {
    matches!(redact_secrets(input), Cow::Owned(ref s) if s != input)
}

fn redact_query_params(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut changed = false;
    let mut rest = input;

    while let Some(eq) = rest.find('=') {
        let key_start = rest[..eq]
            .char_indices()
            .rev()
            .find(|&(_, c)| c == '?' || c == '&' || c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let key = &rest[key_start..eq];
        let value_len = rest[eq + 1..]
            .find(|c: char| c == '&' || c == '#' || c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(rest.len() - eq - 1);

        out.push_str(&rest[..=eq]);
        if SENSITIVE_PARAMS.contains(&key) && value_len > 0 {
            out.push_str(MASK);
            changed = true;
        } else {
            out.push_str(&rest[eq + 1..eq + 1 + value_len]);
        }
        rest = &rest[eq + 1 + value_len..];
    }

    if !changed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}

/// Replace the quoted value following `key:` with the mask.
fn redact_json_value(input: &str, key: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(pos) = remaining.find(key) {
        let after_key = &remaining[pos + key.len()..];
        let trimmed = after_key.trim_start();
        let Some(after_colon) = trimmed.strip_prefix(':') else {
            result.push_str(&remaining[..pos + key.len()]);
            remaining = after_key;
            continue;
        };
        let value = after_colon.trim_start();
        let Some(quoted) = value.strip_prefix('"') else {
            result.push_str(&remaining[..pos + key.len()]);
            remaining = after_key;
            continue;
        };
        let Some(end) = quoted.find('"') else {
            result.push_str(&remaining[..pos + key.len()]);
            remaining = after_key;
            continue;
        };

        result.push_str(&remaining[..pos]);
        result.push_str(key);
        result.push_str(":\"");
        result.push_str(MASK);
        result.push('"');
        remaining = &quoted[end + 1..];
    }

    result.push_str(remaining);
    result
}
