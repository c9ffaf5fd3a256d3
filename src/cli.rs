//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use folio::query::{Filter, Order, Status};
use std::path::PathBuf;

/// Folio flat-file content engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// Static generation mode: queries ignore limit/offset
    #[arg(long = "static")]
    pub static_mode: bool,

    /// Current page number for paged queries
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared filter arguments for collection and page queries
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only items with this status (draft, published, unlisted)
    #[arg(long)]
    pub status: Option<Status>,

    /// Only featured (true) or non-featured (false) items
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub featured: Option<bool>,

    /// Sort field (date, updated_at, created_at, title or any field)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort order (asc, desc)
    #[arg(long)]
    pub order: Option<Order>,

    /// Maximum number of items
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of items to skip (default: derived from --page)
    #[arg(long)]
    pub offset: Option<usize>,
}

impl FilterArgs {
    /// The filter, or `None` when no option was given.
    pub fn to_filter(&self) -> Option<Filter> {
        let filter = Filter {
            status: self.status,
            featured: self.featured,
            sort: self.sort.clone(),
            order: self.order,
            limit: self.limit,
            offset: self.offset,
        };
        (filter != Filter::default()).then_some(filter)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert a markup file to HTML
    Markup {
        /// Markup file, or `-` for stdin
        input: PathBuf,
    },

    /// Resolve one field of a page (or of the site settings)
    Field {
        /// Page name, ignored with --site
        page: String,

        /// Dotted field path
        key: String,

        /// Resolve against the site settings instead of the page
        #[arg(long)]
        site: bool,

        /// strftime pattern for date values
        #[arg(short, long)]
        date_format: Option<String>,

        /// Join list values with this separator
        #[arg(short, long)]
        separator: Option<String>,

        /// Printed when the field is missing
        #[arg(long, default_value = "")]
        default: String,
    },

    /// List the items of a collection
    Query {
        collection: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Look up a single item by slug
        #[arg(long)]
        slug: Option<String>,

        /// With --slug: print only this rendered field
        #[arg(long, requires = "slug")]
        field: Option<String>,

        /// Fields to print per item
        #[arg(long, value_delimiter = ',', default_value = "slug,title,status,updated_at")]
        show: Vec<String>,
    },

    /// Count the items of a collection matching the filter
    Count {
        collection: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List navigation pages
    Pages {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print pagination state and controls for a collection listing
    Paginate {
        collection: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// URL the page links point to
        #[arg(long, default_value = "")]
        url: String,
    },

    /// List stored media metadata
    Media {
        /// Only files carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_with_filters() {
        let cli = Cli::parse_from([
            "folio", "--page", "2", "query", "posts", "--status", "published", "--order", "asc", "-l", "5",
        ]);
        assert_eq!(cli.page, 2);
        let Commands::Query { collection, filter, show, .. } = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(collection, "posts");
        assert_eq!(show, ["slug", "title", "status", "updated_at"]);

        let filter = filter.to_filter().unwrap();
        assert_eq!(filter.status, Some(Status::Published));
        assert_eq!(filter.order, Some(Order::Asc));
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn test_empty_filter_is_none() {
        assert!(FilterArgs::default().to_filter().is_none());
    }

    #[test]
    fn test_static_flag() {
        let cli = Cli::parse_from(["folio", "--static", "count", "posts"]);
        assert!(cli.static_mode);
        let cli = Cli::parse_from(["folio", "count", "posts"]);
        assert!(!cli.static_mode);
    }

    #[test]
    fn test_field_requires_slug() {
        assert!(Cli::try_parse_from(["folio", "query", "posts", "--field", "title"]).is_err());
    }
}
