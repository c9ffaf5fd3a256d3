//! Field rendering by type tag.
//!
//! | Type | Output |
//! |------|--------|
//! | `text`, `textarea`, `slider`, `range` | escaped scalar |
//! | `markdown` | markup converted to HTML |
//! | `file` | `<img>` (or `<figure>` with caption) per file |
//! | `select`, `radio` | escaped option label, falling back to the value |
//! | `checkbox` | `<span class="checkbox-item">` per checked value |
//! | `tags` | `<span class="tag">` per tag |
//! | `structure`, `collection` | the raw list, for the host to iterate |
//! | `switch`, `toggle` | `"1"` or `""` |
//!
//! Null or missing values render as an empty string (or an empty list), never
//! an error.

use crate::blueprint::{Blueprint, TypeTag};
use crate::markup;
use crate::media::MediaLibrary;
use crate::utils::html::{escape, push_escaped};
use crate::utils::value::{is_truthy, scalar_to_string};
use serde_json::Value;
use std::fmt;

/// Result of rendering a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// HTML-safe fragment (or plain canonical string for switches).
    Html(String),
    /// Raw list value of a `structure`/`collection` field.
    List(Vec<Value>),
}

impl Rendered {
    pub const fn empty() -> Self {
        Self::Html(String::new())
    }

    /// HTML text; lists have none.
    pub fn as_html(&self) -> &str {
        match self {
            Self::Html(html) => html,
            Self::List(_) => "",
        }
    }

    pub fn into_html(self) -> String {
        match self {
            Self::Html(html) => html,
            Self::List(_) => String::new(),
        }
    }

    /// List items; HTML has none.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Self::Html(_) => Vec::new(),
            Self::List(items) => items,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Html(html) => html.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl Default for Rendered {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for Rendered {
    fn from(html: String) -> Self {
        Self::Html(html)
    }
}

impl From<&str> for Rendered {
    fn from(html: &str) -> Self {
        Self::Html(html.to_owned())
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_html())
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders raw field values according to their type tag.
///
/// Holds an optional media library so `file` fields without alt text can pick
/// it up from stored metadata.
#[derive(Default)]
pub struct FieldRenderer<'a> {
    media: Option<MediaLibrary<'a>>,
}

impl<'a> FieldRenderer<'a> {
    pub fn new(media: Option<MediaLibrary<'a>>) -> Self {
        Self { media }
    }

    /// Render `value` of field `key` as type `tag`.
    pub fn render(&self, value: &Value, tag: TypeTag, blueprint: Option<&Blueprint>, key: &str) -> Rendered {
        let html = match tag {
            TypeTag::Markdown => markup::to_html(&scalar_to_string(value)),
            TypeTag::File => match value {
                Value::Array(items) if items.first().is_some_and(is_file_like) => {
                    items.iter().map(|item| self.file(item)).collect()
                }
                other => self.file(other),
            },
            TypeTag::Select | TypeTag::Radio => {
                let raw = scalar_to_string(value);
                let label = blueprint
                    .and_then(|b| b.option_label(key, &raw))
                    .unwrap_or(raw.as_ref());
                escape(label).into_owned()
            }
            TypeTag::Checkbox => match value {
                Value::Array(items) if !items.is_empty() => span_list(items, "checkbox-item"),
                other => escape(&scalar_to_string(other)).into_owned(),
            },
            TypeTag::Tags => tag_list(value),
            TypeTag::Structure | TypeTag::Collection => {
                return match value {
                    Value::Array(items) => Rendered::List(items.clone()),
                    _ => Rendered::List(Vec::new()),
                };
            }
            TypeTag::Switch | TypeTag::Toggle => {
                let flag = if is_truthy(value) { "1" } else { "" };
                flag.to_owned()
            }
            TypeTag::Text | TypeTag::Textarea | TypeTag::Slider | TypeTag::Range => {
                escape(&scalar_to_string(value)).into_owned()
            }
        };
        Rendered::Html(html)
    }

    /// Render one file value (path string or `{src|url, alt, caption}` object).
    pub fn file(&self, value: &Value) -> String {
        let (src, alt, caption) = match value {
            Value::String(src) => (src.trim(), "", ""),
            Value::Object(obj) => {
                let text = |key: &str| obj.get(key).and_then(Value::as_str).map_or("", str::trim);
                let src = Some(text("src")).filter(|s| !s.is_empty()).unwrap_or_else(|| text("url"));
                (src, text("alt"), text("caption"))
            }
            _ => return String::new(),
        };
        if src.is_empty() {
            return String::new();
        }

        let stored = match (&self.media, alt.is_empty()) {
            (Some(media), true) => media.lookup(src),
            _ => None,
        };
        let alt = stored.as_ref().map_or(alt, |meta| meta.alt.as_str());
        let caption = match (caption, &stored) {
            ("", Some(meta)) => meta.caption.as_str(),
            (caption, _) => caption,
        };

        image_fragment(src, alt, caption)
    }
}

/// `<img>` fragment, wrapped in a `<figure>` when there is a caption.
pub fn image_fragment(src: &str, alt: &str, caption: &str) -> String {
    let mut out = String::new();
    if !caption.is_empty() {
        out.push_str("<figure>");
    }
    out.push_str("<img src=\"");
    push_escaped(&mut out, src);
    out.push_str("\" alt=\"");
    push_escaped(&mut out, alt);
    out.push_str("\">");
    if !caption.is_empty() {
        out.push_str("<figcaption>");
        push_escaped(&mut out, caption);
        out.push_str("</figcaption></figure>");
    }
    out
}

/// `<span class="tag">` per element of a list value; empty for anything else.
pub fn tag_list(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => span_list(items, "tag"),
        _ => String::new(),
    }
}

fn span_list(items: &[Value], class: &str) -> String {
    items
        .iter()
        .map(|item| format!("<span class=\"{class}\">{}</span>", escape(&scalar_to_string(item))))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_file_like(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(obj) => obj.contains_key("src"),
        _ => false,
    }
}
