//! Folio - flat-file content rendering and query engine.
//!
//! JSON records in, HTML fragments out:
//!
//! ```text
//! content/
//! ├── site.json                     site settings
//! ├── pages/<name>.json             singleton pages
//! ├── collections/<name>/<item>.json
//! ├── blueprints/                   field schemas per content type
//! └── media/_meta/<hash>.json       alt text, captions, tags per file
//! ```
//!
//! [`Engine`] is the entry point: it resolves field references against the
//! active loop scopes and explicit data sources, renders values by their
//! blueprint type, and queries, filters, sorts and paginates collections.

pub mod blueprint;
pub mod config;
pub mod context;
pub mod engine;
pub mod markup;
pub mod media;
pub mod pagination;
pub mod query;
pub mod render;
pub mod storage;
pub mod utils;

pub use engine::{Engine, QueryOutput};
