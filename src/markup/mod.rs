//! Lightweight markup to HTML conversion.
//!
//! # Architecture
//!
//! ```text
//! source ──► block::tokenize() ──► Vec<Block> ──► render_block() ──► HTML
//!                                      │
//!                                      └── inline text ──► inline::parse() ──► Vec<Inline>
//! ```
//!
//! Blocks are recognized in one pass over the source lines, so text emitted
//! for one construct is never re-matched by another. Fenced code bodies are
//! escaped verbatim and never see inline processing.
//!
//! # Supported Markup
//!
//! | Markup | HTML |
//! |--------|------|
//! | ```` ``` ```` fenced block (optional language) | `<pre><code>` |
//! | `# `, `## `, `### ` | `<h1>`..`<h3>` |
//! | `> quote` lines | `<blockquote>` |
//! | `- `/`* `/`+ ` items | `<ul><li>` |
//! | `1. ` items | `<ol><li>` |
//! | other lines, split on blank lines | `<p>` |
//!
//! See [`inline`] for span-level markup.

pub mod block;
pub mod inline;

use crate::utils::html::push_escaped;
use block::Block;

/// Convert markup text to an HTML fragment.
///
/// Deterministic and infallible: empty input yields an empty string and text
/// without markup is still wrapped in paragraphs.
pub fn to_html(source: &str) -> String {
    let blocks = block::tokenize(source);
    let mut out = String::with_capacity(source.len() + source.len() / 4);

    for block in &blocks {
        let start = out.len();
        if start > 0 {
            out.push('\n');
        }
        if !render_block(block, &mut out) {
            out.truncate(start);
        }
    }
    out
}

/// Render one block; returns `false` when it produced nothing worth keeping.
fn render_block(block: &Block<'_>, out: &mut String) -> bool {
    match block {
        Block::Code { lang, body } => {
            out.push_str("<pre><code");
            if let Some(lang) = lang {
                out.push_str(" class=\"language-");
                push_escaped(out, lang);
                out.push('"');
            }
            out.push('>');
            push_escaped(out, body);
            out.push_str("</code></pre>");
        }
        Block::Heading { level, text } => {
            out.push_str(&format!("<h{level}>"));
            inline::render(&inline::parse(text), out);
            out.push_str(&format!("</h{level}>"));
        }
        Block::Quote(lines) => {
            out.push_str("<blockquote>");
            inline::render(&inline::parse(&lines.join(" ")), out);
            out.push_str("</blockquote>");
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push_str(&format!("<{tag}>\n"));
            for item in items {
                out.push_str("<li>");
                inline::render(&inline::parse(item), out);
                out.push_str("</li>\n");
            }
            out.push_str(&format!("</{tag}>"));
        }
        Block::Paragraph(lines) => {
            let text = lines.join(" ");
            if text.trim().is_empty() {
                return false;
            }
            out.push_str("<p>");
            inline::render(&inline::parse(&text), out);
            out.push_str("</p>");
        }
    }
    true
}
