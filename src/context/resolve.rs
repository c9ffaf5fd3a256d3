//! Field reference resolution against the render context.
//!
//! # Priority
//!
//! ```text
//! resolve("title", default, source)
//!   │
//!   ├─ nav scope active?            (Content source only) ─► escaped value | default
//!   ├─ structure scope active?      ─► item value, typed by the item blueprint | default
//!   ├─ collection item active?      ─► item value, typed by the collection blueprint | default
//!   ├─ file item active + has key?  ─► image passthrough, tag spans, date, escaped
//!   └─ explicit data source         ─► page content or site settings
//! ```
//!
//! The first active scope owns the key: when it lacks the key the default is
//! returned and lower-priority sources are never consulted. The file item
//! scope is the exception, it only owns the keys its record has.

use super::{RenderContext, Scope, ScopeKind};
use crate::blueprint::{BlueprintSource, ContentType, field_type};
use crate::render::{FieldRenderer, Rendered, tag_list};
use crate::storage::Record;
use crate::utils::{
    date,
    html::escape,
    value::{is_reserved, lookup_path, scalar_to_string},
};
use serde_json::Value;

/// Explicit data source consulted after all scopes.
#[derive(Debug, Clone, Copy)]
pub enum DataSource<'a> {
    /// Page or collection item content, typed by its content type's blueprint.
    Content { record: &'a Record, content_type: ContentType<'a> },
    /// Site settings, typed by the `site` blueprint.
    Site(&'a Record),
    /// No explicit source: only scopes can answer.
    None,
}

impl<'a> DataSource<'a> {
    pub fn page(record: &'a Record, name: &'a str) -> Self {
        Self::Content { record, content_type: ContentType::Page(name) }
    }

    pub fn collection_item(record: &'a Record, collection: &'a str) -> Self {
        Self::Content { record, content_type: ContentType::Collection(collection) }
    }

    fn record(&self) -> Option<&'a Record> {
        match *self {
            Self::Content { record, .. } | Self::Site(record) => Some(record),
            Self::None => None,
        }
    }

    fn content_type(&self) -> Option<ContentType<'a>> {
        match *self {
            Self::Content { content_type, .. } => Some(content_type),
            Self::Site(_) => Some(ContentType::Site),
            Self::None => None,
        }
    }

    /// Whether navigation items may answer for this source.
    const fn permits_nav(&self) -> bool {
        !matches!(self, Self::Site(_))
    }
}

/// Optional formatting arguments of a field reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// strftime pattern applied to date-like string values.
    pub date_format: Option<&'a str>,
    /// Joins list values (escaped elements) instead of type-rendering them.
    pub separator: Option<&'a str>,
}

impl<'a> ResolveOptions<'a> {
    pub const fn date(format: &'a str) -> Self {
        Self { date_format: Some(format), separator: None }
    }

    pub const fn joined(separator: &'a str) -> Self {
        Self { date_format: None, separator: Some(separator) }
    }

    /// `(date_format, separator)`, reading a separator-like `date_format`
    /// as the separator.
    fn effective(self) -> (Option<&'a str>, Option<&'a str>) {
        match (self.date_format, self.separator) {
            (Some(fmt), None) if date::is_separator_like(fmt) => (None, Some(fmt)),
            other => other,
        }
    }
}

/// Resolves bare field references for one render pass.
pub struct Resolver<'a> {
    ctx: &'a RenderContext,
    renderer: &'a FieldRenderer<'a>,
    blueprints: &'a dyn BlueprintSource,
}

impl<'a> Resolver<'a> {
    pub fn new(ctx: &'a RenderContext, renderer: &'a FieldRenderer<'a>, blueprints: &'a dyn BlueprintSource) -> Self {
        Self { ctx, renderer, blueprints }
    }

    /// Resolve `key` (a dotted path) to its rendered value.
    ///
    /// Missing keys, reserved keys and `null` values yield `default`.
    pub fn resolve(&self, key: &str, default: &str, source: DataSource<'_>, options: ResolveOptions<'_>) -> Rendered {
        let key = key.trim();
        if key.is_empty() || is_reserved(key) {
            return Rendered::from(default);
        }
        let (date_format, separator) = options.effective();

        if source.permits_nav()
            && let Some(scope) = self.ctx.active(ScopeKind::Nav)
        {
            return match find(&scope.record, key) {
                Some(value) => Rendered::Html(escape(&scalar_to_string(value)).into_owned()),
                None => Rendered::from(default),
            };
        }

        if let Some(scope) = self.ctx.active(ScopeKind::Structure) {
            return self.resolve_item(&scope, key, default, date_format, separator);
        }

        if let Some(scope) = self.ctx.active(ScopeKind::CollectionItem) {
            if key == "url" {
                return match find(&scope.record, key) {
                    Some(url) => Rendered::Html(escape(&scalar_to_string(url)).into_owned()),
                    None => Rendered::from(default),
                };
            }
            return self.resolve_item(&scope, key, default, date_format, separator);
        }

        if let Some(scope) = self.ctx.active(ScopeKind::FileItem)
            && let Some(value) = find(&scope.record, key)
        {
            let html = match key {
                "image" => scalar_to_string(value).into_owned(),
                "tags" => tag_list(value),
                _ => formatted_date(value, date_format)
                    .unwrap_or_else(|| escape(&scalar_to_string(value)).into_owned()),
            };
            return Rendered::Html(html);
        }

        self.resolve_source(key, default, source, date_format, separator)
    }

    /// Steps shared by structure and collection item scopes.
    fn resolve_item(
        &self,
        scope: &Scope,
        key: &str,
        default: &str,
        date_format: Option<&str>,
        separator: Option<&str>,
    ) -> Rendered {
        let Some(value) = find(&scope.record, key) else {
            return Rendered::from(default);
        };
        if let Some(joined) = join_list(value, separator) {
            return Rendered::Html(joined);
        }
        if let Some(formatted) = formatted_date(value, date_format) {
            return Rendered::Html(formatted);
        }
        let blueprint = scope.blueprint.as_deref();
        self.renderer.render(value, field_type(key, blueprint), blueprint, key)
    }

    fn resolve_source(
        &self,
        key: &str,
        default: &str,
        source: DataSource<'_>,
        date_format: Option<&str>,
        separator: Option<&str>,
    ) -> Rendered {
        let Some(value) = source.record().and_then(|record| find(record, key)) else {
            return Rendered::from(default);
        };

        if key == "items"
            && let Value::Array(items) = value
        {
            return Rendered::List(items.clone());
        }
        if let Some(joined) = join_list(value, separator) {
            return Rendered::Html(joined);
        }
        if let Some(formatted) = formatted_date(value, date_format) {
            return Rendered::Html(formatted);
        }

        let blueprint = source
            .content_type()
            .and_then(|content_type| self.blueprints.get_blueprint(&content_type.blueprint_name()));
        let blueprint = blueprint.as_deref();
        self.renderer.render(value, field_type(key, blueprint), blueprint, key)
    }
}

/// Non-null value at `key`.
fn find<'r>(record: &'r Record, key: &str) -> Option<&'r Value> {
    lookup_path(record, key).filter(|value| !value.is_null())
}

fn join_list(value: &Value, separator: Option<&str>) -> Option<String> {
    let (Value::Array(items), Some(separator)) = (value, separator) else {
        return None;
    };
    let joined = items
        .iter()
        .map(|item| escape(&scalar_to_string(item)).into_owned())
        .collect::<Vec<_>>()
        .join(separator);
    Some(joined)
}

fn formatted_date(value: &Value, date_format: Option<&str>) -> Option<String> {
    let formatted = date::format(value.as_str()?, date_format?)?;
    Some(escape(&formatted).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Blueprint, StaticBlueprints};
    use crate::context::ScopedIter;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn blueprint(value: Value) -> Blueprint {
        serde_json::from_value(value).unwrap()
    }

    struct Fixture {
        ctx: RenderContext,
        renderer: FieldRenderer<'static>,
        blueprints: StaticBlueprints,
    }

    impl Fixture {
        fn new() -> Self {
            let blueprints = StaticBlueprints::new()
                .with("pages/home", blueprint(json!({"fields": {
                    "body": {"type": "markdown"},
                    "tags": {"type": "tags"},
                    "gallery": {"type": "structure", "fields": {"caption": {"type": "markdown"}}}
                }})))
                .with("site", blueprint(json!({"fields": {"footer": {"type": "markdown"}}})));
            Self { ctx: RenderContext::new(), renderer: FieldRenderer::default(), blueprints }
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver::new(&self.ctx, &self.renderer, &self.blueprints)
        }

        fn resolve(&self, key: &str, source: DataSource<'_>) -> String {
            self.resolver().resolve(key, "DEFAULT", source, ResolveOptions::default()).into_html()
        }
    }

    fn home() -> Record {
        record(json!({
            "title": "Home",
            "body": "**hello**",
            "tags": ["a", "b"],
            "items": [1, 2],
            "published": "2024-03-01",
            "seo": {"title": "SEO"},
            "_status": "published"
        }))
    }

    #[test]
    fn test_data_source_typed_by_blueprint() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        assert_eq!(f.resolve("title", source), "Home");
        assert_eq!(f.resolve("body", source), "<p><strong>hello</strong></p>");
        assert_eq!(f.resolve("tags", source), r#"<span class="tag">a</span> <span class="tag">b</span>"#);
        assert_eq!(f.resolve("seo.title", source), "SEO");
        assert_eq!(f.resolve("missing", source), "DEFAULT");
    }

    #[test]
    fn test_site_source_uses_site_blueprint() {
        let f = Fixture::new();
        let site = record(json!({"footer": "*made*"}));
        assert_eq!(f.resolve("footer", DataSource::Site(&site)), "<p><em>made</em></p>");
    }

    #[test]
    fn test_reserved_keys_resolve_to_default() {
        let f = Fixture::new();
        let page = home();
        assert_eq!(f.resolve("_status", DataSource::page(&page, "home")), "DEFAULT");
        assert_eq!(f.resolve("_meta.updated", DataSource::page(&page, "home")), "DEFAULT");
    }

    #[test]
    fn test_items_returns_raw_list() {
        let f = Fixture::new();
        let page = home();
        let resolved = f.resolver().resolve("items", "", DataSource::page(&page, "home"), ResolveOptions::default());
        assert_eq!(resolved, Rendered::List(vec![json!(1), json!(2)]));
    }

    #[test]
    fn test_separator_and_date_format() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let resolver = f.resolver();
        assert_eq!(resolver.resolve("tags", "", source, ResolveOptions::joined(" | ")).into_html(), "a | b");
        // Separator-like date format acts as separator
        assert_eq!(resolver.resolve("tags", "", source, ResolveOptions::date(", ")).into_html(), "a, b");
        assert_eq!(
            resolver.resolve("published", "", source, ResolveOptions::date("%d/%m/%Y")).into_html(),
            "01/03/2024"
        );
        // Unparsable dates fall through to rendering
        assert_eq!(resolver.resolve("title", "", source, ResolveOptions::date("%Y")).into_html(), "Home");
    }

    #[test]
    fn test_collection_scope_wins_over_content() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let post = record(json!({"title": "Post <1>", "url": "/posts/a/?x=1&y=2"}));

        let _guard = f.ctx.push(ScopeKind::CollectionItem, Scope::new(post));
        assert_eq!(f.resolve("title", source), "Post &lt;1&gt;");
        assert_eq!(f.resolve("url", source), "/posts/a/?x=1&amp;y=2");
        // Owned by the scope even when absent there
        assert_eq!(f.resolve("body", source), "DEFAULT");
    }

    #[test]
    fn test_scope_priority_order() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let _file = f.ctx.push(ScopeKind::FileItem, Scope::new(record(json!({"title": "file"}))));
        assert_eq!(f.resolve("title", source), "file");
        let _item = f.ctx.push(ScopeKind::CollectionItem, Scope::new(record(json!({"title": "item"}))));
        assert_eq!(f.resolve("title", source), "item");
        let _structure = f.ctx.push(ScopeKind::Structure, Scope::new(record(json!({"title": "structure"}))));
        assert_eq!(f.resolve("title", source), "structure");
        let _nav = f.ctx.push(ScopeKind::Nav, Scope::new(record(json!({"title": "nav"}))));
        assert_eq!(f.resolve("title", source), "nav");
        // Site hint skips nav
        let site = record(json!({}));
        assert_eq!(f.resolve("title", DataSource::Site(&site)), "structure");
    }

    #[test]
    fn test_nav_values_are_never_rendered() {
        let f = Fixture::new();
        let page = home();
        let _nav = f.ctx.push(ScopeKind::Nav, Scope::new(record(json!({"body": "**x**"}))));
        assert_eq!(f.resolve("body", DataSource::page(&page, "home")), "**x**");
    }

    #[test]
    fn test_structure_item_typed_by_item_blueprint() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let item_blueprint = f
            .blueprints
            .get_blueprint("pages/home")
            .and_then(|b| b.item_blueprint("gallery").cloned())
            .map(std::sync::Arc::new);

        let iter = ScopedIter::structure(&f.ctx, vec![json!({"caption": "*one*"})], item_blueprint);
        for _ in iter {
            assert_eq!(f.resolve("caption", source), "<p><em>one</em></p>");
        }
        assert_eq!(f.resolve("caption", source), "DEFAULT");
    }

    #[test]
    fn test_file_item_falls_through_when_key_absent() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let file = record(json!({
            "image": "<img src=\"/a.jpg\" alt=\"\">",
            "tags": ["x"],
            "uploaded": "2024-01-02T03:04:05Z",
            "name": "a & b.jpg"
        }));
        let _guard = f.ctx.push(ScopeKind::FileItem, Scope::new(file));

        assert_eq!(f.resolve("image", source), "<img src=\"/a.jpg\" alt=\"\">");
        assert_eq!(f.resolve("tags", source), r#"<span class="tag">x</span>"#);
        assert_eq!(f.resolve("name", source), "a &amp; b.jpg");
        assert_eq!(
            f.resolver().resolve("uploaded", "", source, ResolveOptions::date("%Y")).into_html(),
            "2024"
        );
        // Not on the file record: content answers
        assert_eq!(f.resolve("title", source), "Home");
    }

    #[test]
    fn test_scope_leakage_after_exhaustion_and_drop() {
        let f = Fixture::new();
        let page = home();
        let source = DataSource::page(&page, "home");
        let posts = vec![record(json!({"title": "A"})), record(json!({"title": "B"}))];

        let mut iter = ScopedIter::collection(&f.ctx, posts.clone(), None);
        while iter.next().is_some() {
            assert_ne!(f.resolve("title", source), "Home");
        }
        // Exhausted but not yet dropped
        assert_eq!(f.resolve("title", source), "Home");
        drop(iter);

        let mut iter = ScopedIter::collection(&f.ctx, posts, None);
        iter.next();
        assert_eq!(f.resolve("title", source), "A");
        drop(iter);
        assert_eq!(f.resolve("title", source), "Home");
    }

    #[test]
    fn test_null_value_is_missing() {
        let f = Fixture::new();
        let page = record(json!({"title": null}));
        assert_eq!(f.resolve("title", DataSource::page(&page, "home")), "DEFAULT");
        assert_eq!(f.resolve("title", DataSource::None), "DEFAULT");
    }
}
