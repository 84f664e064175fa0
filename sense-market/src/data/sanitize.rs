//! Tolerance for non-standard JSON number literals.
//!
//! The historical endpoint serialises rolling-window gaps as bare `NaN`
//! (and occasionally `Infinity`), which strict JSON parsers reject. These
//! tokens are rewritten to `null` outside string literals so the payload
//! parses and the gaps surface as invalid points.

use std::borrow::Cow;

const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Replace bare `NaN` / `Infinity` / `-Infinity` tokens with `null`.
pub fn sanitize_non_finite(body: &str) -> Cow<'_, str> {
    if !body.contains("NaN") && !body.contains("Infinity") {
        return Cow::Borrowed(body);
    }

    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut copied_to = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }

        if let Some(token) = TOKENS.iter().find(|t| bytes[i..].starts_with(t.as_bytes())) {
            out.push_str(&body[copied_to..i]);
            out.push_str("null");
            i += token.len();
            copied_to = i;
            continue;
        }

        i += 1;
    }

    out.push_str(&body[copied_to..]);
    Cow::Owned(out)
}
