//! JSON payload extraction from free-form model output
//!
//! Providers are instructed to return bare JSON, but responses still
//! arrive wrapped in markdown fences or surrounded by prose often enough
//! that extraction has to be defensive.

/// Extract the JSON payload from raw model output.
///
/// Preference order:
/// 1. Content of the first fenced code block (```json ... ``` or ``` ... ```)
/// 2. The earliest-starting well-matched `{...}` or `[...]` span
/// 3. The trimmed input unchanged (parsing will fail downstream and
///    trigger a retry)
pub fn extract_json(raw: &str) -> &str {
    if let Some(fenced) = fenced_block(raw) {
        return fenced;
    }

    let obj = matched_span(raw, '{', '}');
    let arr = matched_span(raw, '[', ']');

    // When both an object and an array are present, whichever starts
    // first wins.
    match (obj, arr) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                &raw[a.0..a.1]
            } else {
                &raw[o.0..o.1]
            }
        }
        (Some(o), None) => &raw[o.0..o.1],
        (None, Some(a)) => &raw[a.0..a.1],
        (None, None) => raw.trim(),
    }
}

/// Content of the first complete fenced code block, with an optional
/// language tag stripped
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_open = &raw[open + 3..];
    let close = after_open.find("```")?;
    let mut content = &after_open[..close];

    // Strip a leading language tag line ("json", "JSON", ...)
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("json")
        .or_else(|| trimmed.strip_prefix("JSON"))
    {
        if rest.starts_with(['\n', '\r']) || rest.is_empty() {
            content = rest;
        }
    }
    Some(content.trim())
}

/// Byte range `[start, end)` of the first well-matched span opened by
/// `open`, respecting string literals and escapes. Returns `None` when no
/// opener exists or the span never closes.
fn matched_span(raw: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = raw.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((start, start + offset + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_with_language_tag() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(extract_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_block_without_language_tag() {
        let raw = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_json(raw), "[1, 2, 3]");
    }

    #[test]
    fn test_raw_json_passes_through() {
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(extract_json("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn test_json_surrounded_by_prose() {
        let raw = "The result is {\"elements\": []} as requested.";
        assert_eq!(extract_json(raw), "{\"elements\": []}");
    }

    #[test]
    fn test_array_before_object_picks_array() {
        let raw = "[{\"a\": 1}] trailing {\"b\": 2}";
        assert_eq!(extract_json(raw), "[{\"a\": 1}]");
    }

    #[test]
    fn test_object_before_array_picks_object() {
        let raw = "{\"a\": [1, 2]} and then [3, 4]";
        assert_eq!(extract_json(raw), "{\"a\": [1, 2]}");
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let raw = "{\"quote\": \"a } inside\", \"n\": 1}";
        assert_eq!(extract_json(raw), raw);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let raw = "noise {\"quote\": \"she said \\\"}\\\"\"} more noise";
        assert_eq!(extract_json(raw), "{\"quote\": \"she said \\\"}\\\"\"}");
    }

    #[test]
    fn test_no_json_returns_trimmed_input() {
        assert_eq!(extract_json("  no json here  "), "no json here");
    }
}
