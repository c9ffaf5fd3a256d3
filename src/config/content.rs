//! `[content]` section configuration.
//!
//! All paths except `root` are relative to `root`, which is itself relative
//! to the project root.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in folio.toml - on-disk layout of records.
///
/// # Example
/// ```toml
/// [content]
/// root = "content"
/// pages = "pages"                # pages/<name>.json
/// collections = "collections"    # collections/<name>/<item>.json
/// blueprints = "blueprints"      # blueprints/{pages,collections}/<name>.{json,toml}
/// media = "media/_meta"
/// site = "site.json"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    #[serde(default = "defaults::content::root")]
    #[educe(Default = defaults::content::root())]
    pub root: PathBuf,

    #[serde(default = "defaults::content::pages")]
    #[educe(Default = defaults::content::pages())]
    pub pages: PathBuf,

    #[serde(default = "defaults::content::collections")]
    #[educe(Default = defaults::content::collections())]
    pub collections: PathBuf,

    #[serde(default = "defaults::content::blueprints")]
    #[educe(Default = defaults::content::blueprints())]
    pub blueprints: PathBuf,

    /// Content-addressed media metadata records.
    #[serde(default = "defaults::content::media")]
    #[educe(Default = defaults::content::media())]
    pub media: PathBuf,

    /// Site settings record.
    #[serde(default = "defaults::content::site")]
    #[educe(Default = defaults::content::site())]
    pub site: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::Path;

    #[test]
    fn test_content_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.content.root, Path::new("content"));
        assert_eq!(config.content.pages, Path::new("pages"));
        assert_eq!(config.content.collections, Path::new("collections"));
        assert_eq!(config.content.blueprints, Path::new("blueprints"));
        assert_eq!(config.content.media, Path::new("media/_meta"));
        assert_eq!(config.content.site, Path::new("site.json"));
    }

    #[test]
    fn test_content_custom_layout() {
        let config: SiteConfig = toml::from_str(
            r#"
            [content]
            root = "data"
            collections = "lists"
        "#,
        )
        .unwrap();
        assert_eq!(config.content.root, Path::new("data"));
        assert_eq!(config.content.collections, Path::new("lists"));
        assert_eq!(config.content.pages, Path::new("pages"));
    }
}
