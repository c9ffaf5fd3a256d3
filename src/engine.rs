//! The query surface used by page assembly.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────── Engine ─────────────────────┐
//!  resolve_field ─┤ Resolver ──► FieldRenderer ──► markup, media    │
//!  query_*       ─┤ Collections ──► ScopedIter (collection item)    │
//!  iterate_pages ─┤ Pages ──► ScopedIter (nav)                      │
//!  iterate_*     ─┤ structure / media ──► ScopedIter                │
//!  pagination_*  ─┤ paginate() ──► pagination_controls()            │
//!                 │                                                 │
//!                 │ RenderContext (one per engine, one render pass) │
//!                 └──────┬─────────────────────────┬────────────────┘
//!                        ▼                         ▼
//!                   dyn Storage            dyn BlueprintSource
//! ```
//!
//! Every operation degrades to a default or empty value instead of failing:
//! a missing record, blueprint or field never aborts a render pass.

use crate::blueprint::{Blueprint, BlueprintSource, ContentType, FsBlueprints, field_type};
use crate::config::SiteConfig;
use crate::context::{DataSource, RenderContext, ResolveOptions, Resolver, ScopeKind, ScopedIter};
use crate::markup;
use crate::media::{MediaLibrary, normalize_path};
use crate::pagination::{PageInfo, pagination_controls, paginate};
use crate::query::{Collections, Filter, Lookup, Pages, Paging};
use crate::render::{FieldRenderer, Rendered, image_fragment};
use crate::storage::{FsStorage, Record, Storage};
use crate::utils::value::{lookup_path, non_empty_str};
use serde_json::Value;
use std::sync::Arc;

/// Result of [`Engine::query_collection`].
pub enum QueryOutput<'c> {
    /// Items, with the collection item scope following iteration.
    Items(ScopedIter<'c>),
    /// Slug lookup without a field.
    Record(Option<Record>),
    /// Slug lookup projected to one rendered field.
    Field(Rendered),
}

impl<'c> QueryOutput<'c> {
    pub fn into_items(self) -> Option<ScopedIter<'c>> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => record,
            _ => None,
        }
    }

    pub fn into_field(self) -> Rendered {
        match self {
            Self::Field(rendered) => rendered,
            _ => Rendered::empty(),
        }
    }
}

/// Content rendering and query engine for one site.
pub struct Engine {
    config: SiteConfig,
    storage: Box<dyn Storage>,
    blueprints: Box<dyn BlueprintSource>,
    site: Record,
    ctx: RenderContext,
    current_page: usize,
}

impl Engine {
    pub fn new(config: SiteConfig, storage: Box<dyn Storage>, blueprints: Box<dyn BlueprintSource>) -> Self {
        let site = storage.read_record(&config.content.site).unwrap_or_default();
        Self {
            config,
            storage,
            blueprints,
            site,
            ctx: RenderContext::new(),
            current_page: 1,
        }
    }

    /// Engine over the on-disk content tree described by `config`.
    pub fn from_config(config: SiteConfig) -> Self {
        let storage = FsStorage::new(config.content_root());
        let blueprints = FsBlueprints::new(config.blueprints_dir());
        Self::new(config, Box::new(storage), Box::new(blueprints))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Site settings record (empty when absent).
    pub fn site(&self) -> &Record {
        &self.site
    }

    /// Set the 1-based page number requested by the visitor.
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn media(&self) -> MediaLibrary<'_> {
        MediaLibrary::new(self.storage.as_ref(), &self.config.content.media)
    }

    fn renderer(&self) -> FieldRenderer<'_> {
        FieldRenderer::new(Some(self.media()))
    }

    fn collections(&self) -> Collections<'_> {
        Collections::new(self.storage.as_ref(), &self.config.content.collections, &self.config.base.base_path)
    }

    fn pages(&self) -> Pages<'_> {
        Pages::new(self.storage.as_ref(), &self.config.content.pages, &self.config.base.base_path)
    }

    fn paging(&self) -> Paging {
        if self.config.is_static() { Paging::disabled() } else { Paging::page(self.current_page) }
    }

    fn blueprint(&self, content_type: ContentType<'_>) -> Option<Arc<Blueprint>> {
        self.blueprints.get_blueprint(&content_type.blueprint_name())
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    /// Resolve a field reference against the active scopes, then `source`.
    pub fn resolve_field(&self, key: &str, default: &str, source: DataSource<'_>, options: ResolveOptions<'_>) -> Rendered {
        let renderer = self.renderer();
        Resolver::new(&self.ctx, &renderer, self.blueprints.as_ref()).resolve(key, default, source, options)
    }

    /// Content of page `name`.
    pub fn load_page(&self, name: &str) -> Option<Record> {
        self.pages().get(name)
    }

    /// Convert markup text to HTML.
    pub fn to_html(&self, text: &str) -> String {
        markup::to_html(text)
    }

    // ------------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------------

    /// Query a collection.
    ///
    /// | Lookup | `field` | Output |
    /// |--------|---------|--------|
    /// | `All` / `Filter` | ignored | `Items` |
    /// | `Slug` | `None` | `Record` |
    /// | `Slug` | `Some` | `Field`, rendered with the collection blueprint |
    pub fn query_collection(&self, name: &str, lookup: Lookup<'_>, field: Option<&str>) -> QueryOutput<'_> {
        let filter = match lookup {
            Lookup::Slug(slug) => {
                let item = self.collections().find(name, slug);
                return match field {
                    None => QueryOutput::Record(item),
                    Some(field) => QueryOutput::Field(self.render_item_field(name, item.as_ref(), field)),
                };
            }
            Lookup::All => None,
            Lookup::Filter(filter) => Some(filter),
        };

        let items = self.collections().select(name, filter.as_ref(), self.paging());
        let blueprint = self.blueprint(ContentType::Collection(name));
        QueryOutput::Items(ScopedIter::collection(&self.ctx, items, blueprint))
    }

    fn render_item_field(&self, collection: &str, item: Option<&Record>, field: &str) -> Rendered {
        let Some(value) = item.and_then(|item| lookup_path(item, field)) else {
            return Rendered::empty();
        };
        let blueprint = self.blueprint(ContentType::Collection(collection));
        let blueprint = blueprint.as_deref();
        self.renderer().render(value, field_type(field, blueprint), blueprint, field)
    }

    /// Items matching `filter`, ignoring limit and offset.
    pub fn count_collection(&self, name: &str, filter: Option<&Filter>) -> usize {
        self.collections().count(name, filter)
    }

    // ------------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------------

    /// Navigation pages: published pages in listing order without a filter.
    pub fn iterate_pages(&self, filter: Option<&Filter>) -> ScopedIter<'_> {
        ScopedIter::nav(&self.ctx, self.pages().select(filter))
    }

    /// Items of a `structure`/`collection` field.
    ///
    /// The field is read from the active structure or collection item when
    /// there is one, otherwise from `source`.
    pub fn iterate_structure(&self, key: &str, source: DataSource<'_>) -> ScopedIter<'_> {
        let (items, blueprint) = self.structure_items(key, source);
        ScopedIter::structure(&self.ctx, items, blueprint.map(Arc::new))
    }

    fn structure_items(&self, key: &str, source: DataSource<'_>) -> (Vec<Value>, Option<Blueprint>) {
        let list = |record: &Record| match lookup_path(record, key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        for kind in [ScopeKind::Structure, ScopeKind::CollectionItem] {
            if let Some(scope) = self.ctx.active(kind) {
                let blueprint = scope.blueprint.as_deref().and_then(|b| b.item_blueprint(key)).cloned();
                return (list(&scope.record), blueprint);
            }
        }

        let (record, content_type) = match source {
            DataSource::Content { record, content_type } => (record, content_type),
            DataSource::Site(record) => (record, ContentType::Site),
            DataSource::None => return (Vec::new(), None),
        };
        let blueprint = self
            .blueprint(content_type)
            .and_then(|b| b.item_blueprint(key).cloned());
        (list(record), blueprint)
    }

    /// Stored media files, optionally only those tagged `tag`.
    ///
    /// Each file item exposes `url`, `name`, `alt`, `caption`, `tags`,
    /// `uploaded` and a pre-rendered `image` fragment.
    pub fn iterate_media(&self, tag: Option<&str>) -> ScopedIter<'_> {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty());
        let files = self
            .media()
            .list()
            .iter()
            .filter_map(file_item)
            .filter(|file| tag.is_none_or(|tag| has_tag(file, tag)))
            .collect();
        ScopedIter::files(&self.ctx, files)
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    /// Page state of a collection listing.
    ///
    /// The page size is the filter's `limit`, else `[pagination.per_page]`.
    pub fn page_info(&self, collection: &str, filter: Option<&Filter>) -> PageInfo {
        let total = self.count_collection(collection, filter);
        paginate(total, self.per_page(filter), self.current_page, self.config.pagination.max_visible)
    }

    /// Pagination `<nav>` for a collection listing at `base_url`.
    pub fn pagination_controls(&self, collection: &str, filter: Option<&Filter>, base_url: &str) -> String {
        let total = self.count_collection(collection, filter);
        let per_page = self.per_page(filter);
        let info = paginate(total, per_page, self.current_page, self.config.pagination.max_visible);
        pagination_controls(collection, total, per_page, &info, &self.config.pagination.controls(base_url))
    }

    fn per_page(&self, filter: Option<&Filter>) -> usize {
        filter
            .and_then(|f| f.limit)
            .unwrap_or(self.config.pagination.per_page)
            .max(1)
    }
}

/// File item record for a stored media metadata record.
fn file_item(meta: &Record) -> Option<Record> {
    let path = normalize_path(non_empty_str(meta, "path")?);
    let url = format!("/{path}");
    let name = path.rsplit('/').next().unwrap_or_default().to_owned();
    let alt = non_empty_str(meta, "alt").unwrap_or_default();
    let caption = non_empty_str(meta, "caption").unwrap_or_default();
    let uploaded = non_empty_str(meta, "uploaded")
        .or_else(|| non_empty_str(meta, "updated"))
        .unwrap_or_default();
    let tags = match meta.get("tags") {
        Some(Value::Array(tags)) => tags.clone(),
        _ => Vec::new(),
    };

    let mut file = Record::new();
    file.insert("image".into(), Value::String(image_fragment(&url, alt, caption)));
    file.insert("url".into(), Value::String(url));
    file.insert("name".into(), Value::String(name));
    file.insert("alt".into(), Value::String(alt.to_owned()));
    file.insert("caption".into(), Value::String(caption.to_owned()));
    file.insert("tags".into(), Value::Array(tags));
    file.insert("uploaded".into(), Value::String(uploaded.to_owned()));
    Some(file)
}

fn has_tag(file: &Record, tag: &str) -> bool {
    file.get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().filter_map(Value::as_str).any(|t| t.eq_ignore_ascii_case(tag)))
}
