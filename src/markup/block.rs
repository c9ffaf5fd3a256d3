//! Block-level tokenizer.
//!
//! Splits markup source into a flat list of [`Block`]s in a single pass over
//! its lines. Inline markup inside blocks is left untouched here.

use regex::Regex;
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})[ \t]+(.*)$").unwrap());
static RE_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>[ \t]?(.*)$").unwrap());
static RE_UNORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[*+-][ \t]+(.+)$").unwrap());
static RE_ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[0-9]+\.[ \t]+(.+)$").unwrap());

const FENCE: &str = "```";

/// A block-level element of markup source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    /// Fenced code; the body is raw text, never inline-processed.
    Code { lang: Option<&'a str>, body: String },
    /// `#`, `##` or `###` heading.
    Heading { level: u8, text: &'a str },
    /// Contiguous `> ` lines.
    Quote(Vec<&'a str>),
    /// Contiguous items of one list kind.
    List { ordered: bool, items: Vec<&'a str> },
    /// Consecutive plain lines up to a blank line or another block.
    Paragraph(Vec<&'a str>),
}

/// Classification of one non-fence source line.
enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Quote(&'a str),
    Item { ordered: bool, text: &'a str },
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(caps) = RE_HEADING.captures(line) {
        let level = caps[1].len() as u8;
        let text = caps.get(2).map_or("", |m| m.as_str().trim());
        return Line::Heading(level, text);
    }
    if let Some(caps) = RE_QUOTE.captures(line) {
        return Line::Quote(caps.get(1).map_or("", |m| m.as_str().trim()));
    }
    if let Some(caps) = RE_UNORDERED.captures(line) {
        return Line::Item { ordered: false, text: caps.get(1).map_or("", |m| m.as_str().trim()) };
    }
    if let Some(caps) = RE_ORDERED.captures(line) {
        return Line::Item { ordered: true, text: caps.get(1).map_or("", |m| m.as_str().trim()) };
    }
    Line::Text(line.trim())
}

/// Tokenize markup source into blocks.
pub fn tokenize(source: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut pending: Option<Block<'_>> = None;
    let mut lines = source.lines();

    while let Some(line) = lines.next() {
        if let Some(rest) = line.trim_start().strip_prefix(FENCE) {
            blocks.extend(pending.take());
            let lang = Some(rest.trim()).filter(|s| !s.is_empty());
            let body: Vec<&str> = lines
                .by_ref()
                .take_while(|l| !l.trim_start().starts_with(FENCE))
                .collect();
            blocks.push(Block::Code { lang, body: body.join("\n") });
            continue;
        }

        match classify(line) {
            Line::Blank => blocks.extend(pending.take()),
            Line::Heading(level, text) => {
                blocks.extend(pending.take());
                blocks.push(Block::Heading { level, text });
            }
            Line::Quote(text) => match &mut pending {
                Some(Block::Quote(lines)) => lines.push(text),
                _ => {
                    blocks.extend(pending.take());
                    pending = Some(Block::Quote(vec![text]));
                }
            },
            Line::Item { ordered, text } => match &mut pending {
                Some(Block::List { ordered: kind, items }) if *kind == ordered => items.push(text),
                _ => {
                    blocks.extend(pending.take());
                    pending = Some(Block::List { ordered, items: vec![text] });
                }
            },
            Line::Text(text) => match &mut pending {
                Some(Block::Paragraph(lines)) => lines.push(text),
                _ => {
                    blocks.extend(pending.take());
                    pending = Some(Block::Paragraph(vec![text]));
                }
            },
        }
    }

    blocks.extend(pending);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_headings_longest_prefix() {
        let blocks = tokenize("# One\n## Two\n### Three\n#### Four");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "One" },
                Block::Heading { level: 2, text: "Two" },
                Block::Heading { level: 3, text: "Three" },
                Block::Paragraph(vec!["#### Four"]),
            ]
        );
    }

    #[test]
    fn test_tokenize_hash_without_space_is_text() {
        assert_eq!(tokenize("#hashtag"), vec![Block::Paragraph(vec!["#hashtag"])]);
    }

    #[test]
    fn test_tokenize_paragraphs_split_on_blank_lines() {
        let blocks = tokenize("a\nb\n\n\nc");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec!["a", "b"]), Block::Paragraph(vec!["c"])]
        );
    }

    #[test]
    fn test_tokenize_list_kinds_close_each_other() {
        let blocks = tokenize("- a\n* b\n1. c\n2. d\n+ e");
        assert_eq!(
            blocks,
            vec![
                Block::List { ordered: false, items: vec!["a", "b"] },
                Block::List { ordered: true, items: vec!["c", "d"] },
                Block::List { ordered: false, items: vec!["e"] },
            ]
        );
    }

    #[test]
    fn test_tokenize_list_closed_by_text() {
        let blocks = tokenize("- a\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::List { ordered: false, items: vec!["a"] },
                Block::Paragraph(vec!["after"]),
            ]
        );
    }

    #[test]
    fn test_tokenize_emphasis_line_is_not_list() {
        assert_eq!(
            tokenize("**bold** start"),
            vec![Block::Paragraph(vec!["**bold** start"])]
        );
    }

    #[test]
    fn test_tokenize_quote_lines_grouped() {
        let blocks = tokenize("> one\n> two\ntext");
        assert_eq!(
            blocks,
            vec![Block::Quote(vec!["one", "two"]), Block::Paragraph(vec!["text"])]
        );
    }

    #[test]
    fn test_tokenize_fence_keeps_body_raw() {
        let blocks = tokenize("intro\n```rust\nlet x = *y*;\n\n# not a heading\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec!["intro"]),
                Block::Code { lang: Some("rust"), body: "let x = *y*;\n\n# not a heading".into() },
                Block::Paragraph(vec!["after"]),
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_fence_runs_to_end() {
        let blocks = tokenize("```\ncode\nmore");
        assert_eq!(blocks, vec![Block::Code { lang: None, body: "code\nmore".into() }]);
    }

    #[test]
    fn test_tokenize_crlf_lines() {
        let blocks = tokenize("# T\r\n\r\nbody\r\n");
        assert_eq!(
            blocks,
            vec![Block::Heading { level: 1, text: "T" }, Block::Paragraph(vec!["body"])]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("\n  \n").is_empty());
    }
}
