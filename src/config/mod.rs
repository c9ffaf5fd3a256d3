//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[base]`       | Site identity (title, url, base path)            |
//! | `[content]`    | On-disk layout of pages, collections, blueprints |
//! | `[render]`     | Live or static rendering                         |
//! | `[pagination]` | Page size and pagination control labels          |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Site"
//! url = "https://example.com"
//! base_path = "/"
//!
//! [content]
//! root = "content"
//!
//! [render]
//! mode = "static"
//!
//! [pagination]
//! per_page = 12
//! ```

mod base;
mod content;
pub mod defaults;
mod error;
mod render;

pub use base::BaseConfig;
pub use content::ContentConfig;
pub use error::ConfigError;
pub use render::{PaginationConfig, RenderConfig, RenderMode};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "folio.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Site identity
    #[serde(default)]
    pub base: BaseConfig,

    /// Record layout
    #[serde(default)]
    pub content: ContentConfig,

    /// Rendering mode
    #[serde(default)]
    pub render: RenderConfig,

    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `<root>/<file>`, falling back to defaults when it does not exist.
    pub fn load(root: &Path, file: &Path) -> Result<Self> {
        let config_path = root.join(file);
        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.root = Self::normalize_path(root);
        config.config_path = Self::normalize_path(&config_path);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        if self.root.as_os_str().is_empty() { Path::new("./") } else { &self.root }
    }

    /// Absolute directory all record paths are relative to.
    pub fn content_root(&self) -> PathBuf {
        self.get_root().join(&self.content.root)
    }

    /// Absolute blueprints directory.
    pub fn blueprints_dir(&self) -> PathBuf {
        self.content_root().join(&self.content.blueprints)
    }

    pub fn is_static(&self) -> bool {
        self.render.mode == RenderMode::Static
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.pagination.per_page == 0 {
            bail!(ConfigError::Validation(
                "[pagination.per_page] must be at least 1".into()
            ));
        }

        // first, last, current ± 1 and two ellipses
        if self.pagination.max_visible < 5 {
            bail!(ConfigError::Validation(
                "[pagination.max_visible] must be at least 5".into()
            ));
        }

        if self.content.root.is_absolute() {
            bail!(ConfigError::Validation(
                "[content.root] must be relative to the project root".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
