//! Blueprints: per-content-type field schemas.
//!
//! A blueprint maps field names to a [`FieldDescriptor`] whose [`TypeTag`]
//! selects the rendering strategy. Blueprints are authored outside the core and
//! are read-only here.
//!
//! # Naming
//!
//! | Content | Blueprint name | File (under the blueprints dir) |
//! |---------|----------------|---------------------------------|
//! | page `about` | `pages/about` | `pages/about.json` or `pages/about.toml` |
//! | collection `posts` | `collections/posts` | `collections/posts.json` or `.toml` |
//! | site settings | `site` | `site.json` or `site.toml` |
//!
//! # Example
//!
//! ```json
//! {
//!   "title": "Blog post",
//!   "fields": {
//!     "body":     { "type": "markdown" },
//!     "category": { "type": "select", "options": { "news": "News", "dev": "Development" } },
//!     "gallery":  { "type": "structure", "fields": { "image": { "type": "file" } } }
//!   }
//! }
//! ```

use crate::log;
use crate::utils::value::scalar_to_string;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// Name of the site settings blueprint.
pub const SITE_BLUEPRINT: &str = "site";

// ============================================================================
// Type Tags
// ============================================================================

/// Rendering strategy declared for a field.
///
/// Unknown tags and fields absent from the blueprint are [`TypeTag::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeTag {
    #[default]
    Text,
    Textarea,
    Markdown,
    File,
    Select,
    Radio,
    Checkbox,
    Tags,
    Structure,
    Collection,
    Slider,
    Range,
    Switch,
    Toggle,
}

impl TypeTag {
    pub const ALL: [Self; 14] = [
        Self::Text,
        Self::Textarea,
        Self::Markdown,
        Self::File,
        Self::Select,
        Self::Radio,
        Self::Checkbox,
        Self::Tags,
        Self::Structure,
        Self::Collection,
        Self::Slider,
        Self::Range,
        Self::Switch,
        Self::Toggle,
    ];

    /// Parse a tag name, case-insensitively. Unknown names are `Text`.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Markdown => "markdown",
            Self::File => "file",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Tags => "tags",
            Self::Structure => "structure",
            Self::Collection => "collection",
            Self::Slider => "slider",
            Self::Range => "range",
            Self::Switch => "switch",
            Self::Toggle => "toggle",
        }
    }

    /// Whether values of this type are lists iterated by the host.
    pub const fn is_list(self) -> bool {
        matches!(self, Self::Structure | Self::Collection)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ============================================================================
// Blueprints
// ============================================================================

/// Schema entry for one field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type", default)]
    pub type_tag: TypeTag,

    #[serde(default)]
    pub label: Option<String>,

    /// Choice labels keyed by stored value (`select`/`radio`/`checkbox`).
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: BTreeMap<String, String>,

    /// Item schema for `structure`/`collection` fields.
    #[serde(default, deserialize_with = "deserialize_item_fields")]
    pub fields: Option<Blueprint>,
}

/// Field schema for one content type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl Blueprint {
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.get(key)
    }

    pub fn field_type(&self, key: &str) -> TypeTag {
        self.field(key).map(|f| f.type_tag).unwrap_or_default()
    }

    /// Label for a stored choice value, if the field declares one.
    pub fn option_label(&self, key: &str, value: &str) -> Option<&str> {
        self.field(key)?.options.get(value).map(String::as_str)
    }

    /// Item schema of a `structure`/`collection` field.
    pub fn item_blueprint(&self, key: &str) -> Option<&Blueprint> {
        self.field(key)?.fields.as_ref()
    }
}

/// Type of `key` under an optional blueprint; `Text` when unknown.
#[inline]
pub fn field_type(key: &str, blueprint: Option<&Blueprint>) -> TypeTag {
    blueprint.map(|b| b.field_type(key)).unwrap_or_default()
}

/// Item schemas are written as a bare field map.
fn deserialize_item_fields<'de, D>(deserializer: D) -> Result<Option<Blueprint>, D::Error>
where
    D: Deserializer<'de>,
{
    let fields = Option::<BTreeMap<String, FieldDescriptor>>::deserialize(deserializer)?;
    Ok(fields.map(|fields| Blueprint { title: None, fields }))
}

/// Accept options as `{ "value": "Label" }`, `["a", "b"]` or
/// `[{ "value": "a", "label": "A" }]`.
fn deserialize_options<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOptions {
        Map(BTreeMap<String, Value>),
        List(Vec<Value>),
    }

    let options = match Option::<RawOptions>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(RawOptions::Map(map)) => map
            .into_iter()
            .map(|(value, label)| {
                let label = scalar_to_string(&label).into_owned();
                (value, label)
            })
            .collect(),
        Some(RawOptions::List(list)) => list
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => {
                    let value = scalar_to_string(obj.get("value")?).into_owned();
                    let label = obj
                        .get("label")
                        .map(|l| scalar_to_string(l).into_owned())
                        .unwrap_or_else(|| value.clone());
                    Some((value, label))
                }
                other => {
                    let value = scalar_to_string(other).into_owned();
                    Some((value.clone(), value))
                }
            })
            .collect(),
    };
    Ok(options)
}

// ============================================================================
// Content Types
// ============================================================================

/// Which content type a record belongs to, for blueprint lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType<'a> {
    Page(&'a str),
    Collection(&'a str),
    Site,
}

impl ContentType<'_> {
    pub fn blueprint_name(&self) -> String {
        match self {
            Self::Page(name) => format!("pages/{name}"),
            Self::Collection(name) => format!("collections/{name}"),
            Self::Site => SITE_BLUEPRINT.to_owned(),
        }
    }
}

// ============================================================================
// Blueprint Sources
// ============================================================================

/// Blueprint collaborator: look up a schema by content-type name.
pub trait BlueprintSource {
    fn get_blueprint(&self, name: &str) -> Option<Arc<Blueprint>>;
}

/// Errors raised while loading blueprint files.
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("malformed blueprint `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("malformed blueprint `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),
}

/// Blueprints stored as `<name>.json` or `<name>.toml` files, cached per name.
#[derive(Debug)]
pub struct FsBlueprints {
    dir: PathBuf,
    cache: RwLock<FxHashMap<String, Option<Arc<Blueprint>>>>,
}

impl FsBlueprints {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Drop cached schemas so edited files are re-read.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    fn load(&self, name: &str) -> Result<Option<Blueprint>, BlueprintError> {
        // Names are relative; refuse anything that could escape the directory
        let escapes = Path::new(name)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Ok(None);
        }

        let json = self.dir.join(format!("{name}.json"));
        if let Some(content) = read_optional(&json)? {
            let blueprint = serde_json::from_str(&content).map_err(|err| BlueprintError::Json(json, err))?;
            return Ok(Some(blueprint));
        }

        let toml_path = self.dir.join(format!("{name}.toml"));
        if let Some(content) = read_optional(&toml_path)? {
            let blueprint = toml::from_str(&content).map_err(|err| BlueprintError::Toml(toml_path, err))?;
            return Ok(Some(blueprint));
        }

        Ok(None)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, BlueprintError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(BlueprintError::Io(path.to_path_buf(), err)),
    }
}

impl BlueprintSource for FsBlueprints {
    fn get_blueprint(&self, name: &str) -> Option<Arc<Blueprint>> {
        if let Some(cached) = self.cache.read().get(name) {
            return cached.clone();
        }

        let loaded = self
            .load(name)
            .unwrap_or_else(|err| {
                log!("blueprint"; "{err}");
                None
            })
            .map(Arc::new);
        self.cache.write().insert(name.to_owned(), loaded.clone());
        loaded
    }
}

/// Blueprints registered in memory.
#[derive(Debug, Default)]
pub struct StaticBlueprints {
    blueprints: FxHashMap<String, Arc<Blueprint>>,
}

impl StaticBlueprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, blueprint: Blueprint) {
        self.blueprints.insert(name.into(), Arc::new(blueprint));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, blueprint: Blueprint) -> Self {
        self.insert(name, blueprint);
        self
    }
}

impl BlueprintSource for StaticBlueprints {
    fn get_blueprint(&self, name: &str) -> Option<Arc<Blueprint>> {
        self.blueprints.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn blueprint(value: Value) -> Blueprint {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_type_tag_parse() {
        assert_eq!(TypeTag::parse("markdown"), TypeTag::Markdown);
        assert_eq!(TypeTag::parse("Toggle"), TypeTag::Toggle);
        assert_eq!(TypeTag::parse(" tags "), TypeTag::Tags);
        assert_eq!(TypeTag::parse("wysiwyg"), TypeTag::Text);
        assert_eq!(TypeTag::parse(""), TypeTag::Text);
    }

    #[test]
    fn test_type_tag_name_roundtrip() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::parse(tag.name()), tag);
        }
    }

    #[test]
    fn test_field_type_defaults_to_text() {
        let bp = blueprint(json!({"fields": {"body": {"type": "markdown"}, "odd": {"type": "nope"}}}));
        assert_eq!(bp.field_type("body"), TypeTag::Markdown);
        assert_eq!(bp.field_type("odd"), TypeTag::Text);
        assert_eq!(bp.field_type("missing"), TypeTag::Text);
        assert_eq!(field_type("body", None), TypeTag::Text);
        assert_eq!(field_type("body", Some(&bp)), TypeTag::Markdown);
    }

    #[test]
    fn test_field_without_type_is_text() {
        let bp = blueprint(json!({"fields": {"title": {"label": "Title"}}}));
        assert_eq!(bp.field_type("title"), TypeTag::Text);
        assert_eq!(bp.field("title").unwrap().label.as_deref(), Some("Title"));
    }

    #[test]
    fn test_options_as_map() {
        let bp = blueprint(json!({"fields": {"c": {"type": "select", "options": {"dev": "Development", "1": 2}}}}));
        assert_eq!(bp.option_label("c", "dev"), Some("Development"));
        assert_eq!(bp.option_label("c", "1"), Some("2"));
        assert_eq!(bp.option_label("c", "other"), None);
    }

    #[test]
    fn test_options_as_list() {
        let bp = blueprint(json!({"fields": {
            "a": {"type": "radio", "options": ["red", "blue"]},
            "b": {"type": "radio", "options": [{"value": "s", "label": "Small"}, {"value": "m"}]}
        }}));
        assert_eq!(bp.option_label("a", "red"), Some("red"));
        assert_eq!(bp.option_label("b", "s"), Some("Small"));
        assert_eq!(bp.option_label("b", "m"), Some("m"));
    }

    #[test]
    fn test_item_blueprint() {
        let bp = blueprint(json!({"fields": {"gallery": {"type": "structure", "fields": {"image": {"type": "file"}}}}}));
        let item = bp.item_blueprint("gallery").unwrap();
        assert_eq!(item.field_type("image"), TypeTag::File);
        assert!(bp.field_type("gallery").is_list());
    }

    #[test]
    fn test_content_type_blueprint_name() {
        assert_eq!(ContentType::Page("about").blueprint_name(), "pages/about");
        assert_eq!(ContentType::Collection("posts").blueprint_name(), "collections/posts");
        assert_eq!(ContentType::Site.blueprint_name(), "site");
    }

    #[test]
    fn test_fs_blueprints_json_and_toml() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("collections")).unwrap();
        fs::write(
            dir.path().join("collections/posts.json"),
            r#"{"fields": {"body": {"type": "markdown"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("site.toml"),
            "[fields.logo]\ntype = \"file\"\n",
        )
        .unwrap();

        let source = FsBlueprints::new(dir.path());
        let posts = source.get_blueprint("collections/posts").unwrap();
        assert_eq!(posts.field_type("body"), TypeTag::Markdown);
        let site = source.get_blueprint("site").unwrap();
        assert_eq!(site.field_type("logo"), TypeTag::File);
        assert!(source.get_blueprint("pages/none").is_none());
    }

    #[test]
    fn test_fs_blueprints_malformed_is_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.json"), "{ broken").unwrap();
        let source = FsBlueprints::new(dir.path());
        assert!(source.get_blueprint("site").is_none());
    }

    #[test]
    fn test_fs_blueprints_rejects_escaping_names() {
        let dir = TempDir::new().unwrap();
        let source = FsBlueprints::new(dir.path().join("blueprints"));
        fs::write(dir.path().join("secret.json"), "{}").unwrap();
        assert!(source.get_blueprint("../secret").is_none());
        assert!(source.get_blueprint("").is_none());
    }

    #[test]
    fn test_fs_blueprints_cache_clear() {
        let dir = TempDir::new().unwrap();
        let source = FsBlueprints::new(dir.path());
        assert!(source.get_blueprint("site").is_none());

        fs::write(dir.path().join("site.json"), r#"{"fields": {}}"#).unwrap();
        // Cached miss until cleared
        assert!(source.get_blueprint("site").is_none());
        source.clear();
        assert!(source.get_blueprint("site").is_some());
    }

    #[test]
    fn test_static_blueprints() {
        let source = StaticBlueprints::new().with("site", Blueprint::default());
        assert!(source.get_blueprint("site").is_some());
        assert!(source.get_blueprint("other").is_none());
    }
}
