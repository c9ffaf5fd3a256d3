//! `[render]` and `[pagination]` section configuration.

use super::defaults;
use crate::pagination::Controls;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// How query results are paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Pages are rendered on request: `limit`/`offset` slice results.
    #[default]
    Live,
    /// Static generation: every item is emitted, a client component slices.
    Static,
}

/// `[render]` section in folio.toml.
///
/// # Example
/// ```toml
/// [render]
/// mode = "static"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: RenderMode,
}

/// `[pagination]` section in folio.toml.
///
/// # Example
/// ```toml
/// [pagination]
/// per_page = 12
/// max_visible = 7
/// param = "p"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size when a query sets no `limit`.
    #[serde(default = "defaults::pagination::per_page")]
    #[educe(Default = defaults::pagination::per_page())]
    pub per_page: usize,

    /// Page numbers listed before truncating with ellipses.
    #[serde(default = "defaults::pagination::max_visible")]
    #[educe(Default = defaults::pagination::max_visible())]
    pub max_visible: usize,

    /// Query parameter carrying the page number.
    #[serde(default = "defaults::pagination::param")]
    #[educe(Default = defaults::pagination::param())]
    pub param: String,

    #[serde(default = "defaults::pagination::prev_label")]
    #[educe(Default = defaults::pagination::prev_label())]
    pub prev_label: String,

    #[serde(default = "defaults::pagination::next_label")]
    #[educe(Default = defaults::pagination::next_label())]
    pub next_label: String,
}

impl PaginationConfig {
    /// Control display options linking to `base_url`.
    pub fn controls<'a>(&'a self, base_url: &'a str) -> Controls<'a> {
        Controls {
            base_url,
            param: &self.param,
            prev_label: &self.prev_label,
            next_label: &self.next_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_render_mode() {
        let config: SiteConfig = toml::from_str("[render]\nmode = \"static\"").unwrap();
        assert_eq!(config.render.mode, RenderMode::Static);

        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.render.mode, RenderMode::Live);

        assert!(toml::from_str::<SiteConfig>("[render]\nmode = \"lazy\"").is_err());
    }

    #[test]
    fn test_pagination_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.pagination.per_page, 10);
        assert_eq!(config.pagination.max_visible, 7);
        assert_eq!(config.pagination.param, "page");
        assert_eq!(config.pagination.prev_label, "« Previous");
        assert_eq!(config.pagination.next_label, "Next »");
    }

    #[test]
    fn test_pagination_controls_options() {
        let config: SiteConfig = toml::from_str("[pagination]\nparam = \"p\"\nnext_label = \"More\"").unwrap();
        let controls = config.pagination.controls("/list/");
        assert_eq!(controls.base_url, "/list/");
        assert_eq!(controls.param, "p");
        assert_eq!(controls.next_label, "More");
    }
}
