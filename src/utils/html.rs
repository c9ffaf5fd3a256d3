//! HTML escaping for rendered fragments.

use std::borrow::Cow;

/// Escape text for use in HTML element content or a quoted attribute value.
///
/// Returns the input unchanged (borrowed) when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    // Fast path: check if escaping is needed
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape text and push it onto an output buffer.
#[inline]
pub fn push_escaped(out: &mut String, s: &str) {
    out.push_str(&escape(s));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_is_borrowed() {
        assert!(matches!(escape("hello world"), Cow::Borrowed("hello world")));
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
        assert_eq!(escape("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
    }

    #[test]
    fn test_push_escaped_appends() {
        let mut out = String::from("<p>");
        push_escaped(&mut out, "1 < 2");
        assert_eq!(out, "<p>1 &lt; 2");
    }
}
