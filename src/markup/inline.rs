//! Inline tokenizer and renderer.
//!
//! Recognized spans, in precedence order at any position:
//!
//! | Markup | HTML |
//! |--------|------|
//! | `` `code` `` | `<code>code</code>` (contents never re-parsed) |
//! | `***both***` | `<strong><em>both</em></strong>` |
//! | `**strong**` | `<strong>strong</strong>` |
//! | `~~strike~~` | `<s>strike</s>` |
//! | `*em*` | `<em>em</em>` |
//! | `[text](url)` | `<a href="url">text</a>` |
//!
//! Delimiters without a matching closer are kept as literal text. All text is
//! HTML-escaped. Closer searches are remembered per delimiter, so a long run
//! of unclosed openers is scanned once.

use crate::utils::html::push_escaped;

/// An inline span of markup text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline<'a> {
    Text(&'a str),
    Code(&'a str),
    Strong(Vec<Inline<'a>>),
    Em(Vec<Inline<'a>>),
    Strike(Vec<Inline<'a>>),
    Link { label: Vec<Inline<'a>>, url: &'a str },
}

/// Tokenize a run of inline text.
pub fn parse(text: &str) -> Vec<Inline<'_>> {
    Scanner::new(text).parse()
}

/// Render inline nodes as HTML onto `out`.
pub fn render(nodes: &[Inline<'_>], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(text) => push_escaped(out, text),
            Inline::Code(code) => {
                out.push_str("<code>");
                push_escaped(out, code);
                out.push_str("</code>");
            }
            Inline::Strong(children) => wrap(out, "strong", children),
            Inline::Em(children) => wrap(out, "em", children),
            Inline::Strike(children) => wrap(out, "s", children),
            Inline::Link { label, url } => {
                out.push_str("<a href=\"");
                push_escaped(out, url);
                out.push_str("\">");
                render(label, out);
                out.push_str("</a>");
            }
        }
    }
}

/// Tokenize and render a run of inline text.
pub fn to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    render(&parse(text), &mut out);
    out
}

fn wrap(out: &mut String, tag: &str, children: &[Inline<'_>]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render(children, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

// ============================================================================
// Span Matching
// ============================================================================

/// Closing delimiters searched for while scanning.
#[derive(Debug, Clone, Copy)]
enum Closer {
    Backtick,
    Triple,
    Double,
    Tilde,
    Star,
    Bracket,
    Paren,
}

impl Closer {
    const COUNT: usize = 7;
}

/// Last search per closer: start offset and the match found from there.
///
/// A match at `at` found from `from` answers every search starting in
/// `from..=at`, and a failed search answers every later start, which keeps
/// runs of unclosed openers linear.
type Memo = [Option<(usize, Option<usize>)>; Closer::COUNT];

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    memo: Memo,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, bytes: text.as_bytes(), memo: [None; Closer::COUNT] }
    }

    fn parse(mut self) -> Vec<Inline<'a>> {
        let text = self.text;
        let bytes = self.bytes;
        let mut nodes = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            // All delimiters are ASCII, so byte offsets are always char boundaries
            let matched = match bytes[i] {
                b'`' => self
                    .find(Closer::Backtick, i + 1)
                    .map(|end| (Inline::Code(&text[i + 1..end]), end + 1)),
                b'*' if bytes.get(i + 1) == Some(&b'*') => self.strong(i),
                b'~' if bytes.get(i + 1) == Some(&b'~') => self
                    .wrapped(i, Closer::Tilde, 2)
                    .map(|(inner, next)| (Inline::Strike(parse(inner)), next)),
                b'*' => self
                    .find(Closer::Star, i + 1)
                    .filter(|&end| is_span_content(&text[i + 1..end]))
                    .map(|end| (Inline::Em(parse(&text[i + 1..end])), end + 1)),
                b'[' => self.link(i),
                _ => None,
            };

            match matched {
                Some((node, next)) => {
                    if literal_start < i {
                        nodes.push(Inline::Text(&text[literal_start..i]));
                    }
                    nodes.push(node);
                    i = next;
                    literal_start = next;
                }
                None => i += 1,
            }
        }

        if literal_start < bytes.len() {
            nodes.push(Inline::Text(&text[literal_start..]));
        }
        nodes
    }

    /// First closer at or after `from`.
    fn find(&mut self, closer: Closer, from: usize) -> Option<usize> {
        if let Some((searched, at)) = self.memo[closer as usize]
            && searched <= from
            && at.is_none_or(|at| from <= at)
        {
            return at;
        }

        let at = match closer {
            Closer::Backtick => find_byte(self.bytes, from, b'`'),
            Closer::Triple => find_str(self.text, from, "***"),
            Closer::Double => find_str(self.text, from, "**"),
            Closer::Tilde => find_str(self.text, from, "~~"),
            Closer::Star => find_single_star(self.bytes, from),
            Closer::Bracket => find_byte(self.bytes, from, b']'),
            Closer::Paren => find_byte(self.bytes, from, b')'),
        };
        self.memo[closer as usize] = Some((from, at));
        at
    }

    /// `***both***`, else `**strong**`.
    fn strong(&mut self, start: usize) -> Option<(Inline<'a>, usize)> {
        if self.bytes.get(start + 2) == Some(&b'*')
            && let Some((inner, next)) = self.wrapped(start, Closer::Triple, 3)
        {
            return Some((Inline::Strong(vec![Inline::Em(parse(inner))]), next));
        }
        self.wrapped(start, Closer::Double, 2)
            .map(|(inner, next)| (Inline::Strong(parse(inner)), next))
    }

    /// Match `delim inner delim` starting at `start`; returns inner text and
    /// the offset just past the closing delimiter.
    fn wrapped(&mut self, start: usize, closer: Closer, len: usize) -> Option<(&'a str, usize)> {
        let open_end = start + len;
        let close = self.find(closer, open_end)?;
        let inner = &self.text[open_end..close];
        is_span_content(inner).then_some((inner, close + len))
    }

    /// Match `[label](url)` starting at `start`.
    fn link(&mut self, start: usize) -> Option<(Inline<'a>, usize)> {
        let label_end = self.find(Closer::Bracket, start + 1)?;
        if self.bytes.get(label_end + 1) != Some(&b'(') {
            return None;
        }
        let url_end = self.find(Closer::Paren, label_end + 2)?;
        let label = &self.text[start + 1..label_end];
        let url = self.text[label_end + 2..url_end].trim();
        if label.is_empty() || url.is_empty() {
            return None;
        }
        Some((Inline::Link { label: parse(label), url }, url_end + 1))
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes.get(from..)?.iter().position(|&b| b == needle).map(|p| from + p)
}

fn find_str(text: &str, from: usize, needle: &str) -> Option<usize> {
    text.get(from..)?.find(needle).map(|p| from + p)
}

/// Span content may not be empty or start/end with whitespace (`a * b * c`).
fn is_span_content(inner: &str) -> bool {
    !inner.is_empty() && inner.trim() == inner
}

/// Find a closing single `*`, skipping over `**` pairs inside the span.
fn find_single_star(bytes: &[u8], from: usize) -> Option<usize> {
    let mut k = from;
    while k < bytes.len() {
        if bytes[k] == b'*' {
            if bytes.get(k + 1) == Some(&b'*') {
                k += 2;
                continue;
            }
            return Some(k);
        }
        k += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(to_html("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_emphasis_spans() {
        assert_eq!(
            to_html("Some *em* and **bold** and ~~gone~~."),
            "Some <em>em</em> and <strong>bold</strong> and <s>gone</s>."
        );
    }

    #[test]
    fn test_nested_emphasis() {
        assert_eq!(to_html("**bold *em* end**"), "<strong>bold <em>em</em> end</strong>");
        assert_eq!(to_html("*em **bold** end*"), "<em>em <strong>bold</strong> end</em>");
    }

    #[test]
    fn test_code_span_protects_markup() {
        assert_eq!(to_html("use `**x** <y>` here"), "use <code>**x** &lt;y&gt;</code> here");
    }

    #[test]
    fn test_unmatched_delimiters_are_literal() {
        assert_eq!(to_html("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(to_html("a ** b"), "a ** b");
        assert_eq!(to_html("tick ` alone"), "tick ` alone");
        assert_eq!(to_html("~single~"), "~single~");
    }

    #[test]
    fn test_spaced_stars_are_not_emphasis() {
        assert_eq!(to_html("a * b * c"), "a * b * c");
    }

    #[test]
    fn test_link() {
        assert_eq!(
            to_html("see [the **docs**](https://x.dev/a?b=1&c=2) now"),
            "see <a href=\"https://x.dev/a?b=1&amp;c=2\">the <strong>docs</strong></a> now"
        );
    }

    #[test]
    fn test_link_attribute_is_escaped() {
        assert_eq!(to_html("[x](a\"b)"), "<a href=\"a&quot;b\">x</a>");
    }

    #[test]
    fn test_incomplete_link_is_literal() {
        assert_eq!(to_html("[x] (y)"), "[x] (y)");
        assert_eq!(to_html("[x](y"), "[x](y");
        assert_eq!(to_html("[](y)"), "[](y)");
    }

    #[test]
    fn test_strong_em_combined() {
        assert_eq!(to_html("***x***"), "<strong><em>x</em></strong>");
        assert_eq!(to_html("a ***b c*** d"), "a <strong><em>b c</em></strong> d");
        assert_eq!(to_html("***a** b"), "<strong>*a</strong> b");
    }

    #[test]
    fn test_long_runs_of_unclosed_openers_stay_literal() {
        for unit in ["**a ", "[a", "*a ", "~~a ", "[a](b "] {
            let text = unit.repeat(50_000);
            assert_eq!(to_html(&text), text, "unit {unit:?}");
        }
    }

    #[test]
    fn test_closers_found_after_failed_openers() {
        assert_eq!(to_html("[a] [b](u)"), "[a] <a href=\"u\">b</a>");
        assert_eq!(to_html("** a **b**"), "** a <strong>b</strong>");
        assert_eq!(to_html("*a **b** c* *d*"), "<em>a <strong>b</strong> c</em> <em>d</em>");
    }

    #[test]
    fn test_unicode_text_preserved() {
        assert_eq!(to_html("你好 *世界*"), "你好 <em>世界</em>");
    }
}
