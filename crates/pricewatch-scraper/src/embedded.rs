//! Carving a JSON object out of script text that is not itself JSON.
//!
//! Server-rendered pages hand their data to the client inside a function
//! call expression, so the object has no delimiter a JSON parser could use.
//! The object is found by its key marker and cut out with a depth scan.

use std::borrow::Cow;

use crate::error::ParseError;

/// Key that precedes the data object in the transport `push` call.
pub const REHYDRATE_MARKER: &str = "\"rehydrate\":";

/// Returns the JSON object that starts right after the first `marker` in
/// `text`.
///
/// The scan counts `{`/`}` depth and ends where depth first returns to zero.
/// Braces inside string literals are skipped.
///
/// # Errors
///
/// Returns [`ParseError::MalformedPayload`] when the marker is absent, is not
/// followed by an object, or the braces never balance.
pub fn carve_json_object<'a>(text: &'a str, marker: &str) -> Result<&'a str, ParseError> {
    let marker_at = text
        .find(marker)
        .ok_or_else(|| ParseError::MalformedPayload(format!("marker {marker} not found")))?;
    let rest = text[marker_at + marker.len()..].trim_start();
    if !rest.starts_with('{') {
        return Err(ParseError::MalformedPayload(format!(
            "marker {marker} is not followed by an object"
        )));
    }

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in rest.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&rest[..=i]);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::MalformedPayload(
        "braces never balance before end of script".to_owned(),
    ))
}

/// Rewrites the bare `undefined` value token as `null`.
///
/// Only `:undefined` outside string literals and not followed by an
/// identifier character is touched, so `"undefined"` as a string value and
/// keys such as `:undefinedBehaviour` survive unchanged.
#[must_use]
pub fn repair_undefined(json: &str) -> Cow<'_, str> {
    const TOKEN: &str = ":undefined";

    if !json.contains(TOKEN) {
        return Cow::Borrowed(json);
    }

    let bytes = json.as_bytes();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape = false;
    let mut copied_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if escape {
            escape = false;
        } else if in_string {
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(TOKEN.as_bytes()) {
            let end = i + TOKEN.len();
            let bounded = bytes
                .get(end)
                .is_none_or(|next| !(next.is_ascii_alphanumeric() || matches!(next, b'_' | b'$')));
            if bounded {
                out.push_str(&json[copied_to..i]);
                out.push_str(":null");
                copied_to = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    if copied_to == 0 {
        return Cow::Borrowed(json);
    }
    out.push_str(&json[copied_to..]);
    Cow::Owned(out)
}
