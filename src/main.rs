//! Folio - flat-file content rendering and query engine.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, FilterArgs};
use folio::config::{RenderMode, SiteConfig};
use folio::context::{DataSource, ResolveOptions};
use folio::pagination::PageSlot;
use folio::query::Lookup;
use folio::render::Rendered;
use folio::storage::Record;
use folio::utils::value::{lookup_path, scalar_to_string};
use folio::{Engine, log};
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log!("error"; "{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Markup conversion needs no content tree
    if let Commands::Markup { input } = &cli.command {
        return markup(input);
    }

    let mut engine = Engine::from_config(load_config(cli)?);
    engine.set_current_page(cli.page);

    match &cli.command {
        Commands::Markup { .. } => unreachable!(), // Handled above
        Commands::Field { page, key, site, date_format, separator, default } => {
            let options = ResolveOptions {
                date_format: date_format.as_deref(),
                separator: separator.as_deref(),
            };
            field(&engine, page, key, *site, default, options)
        }
        Commands::Query { collection, filter, slug, field, show } => {
            query(&engine, collection, filter, slug.as_deref(), field.as_deref(), show)
        }
        Commands::Count { collection, filter } => {
            let count = engine.count_collection(collection, filter.to_filter().as_ref());
            println!("{count}");
            Ok(())
        }
        Commands::Pages { filter } => {
            let filter = filter.to_filter();
            for page in engine.iterate_pages(filter.as_ref()) {
                println!("{}", columns(&page, &["slug", "title", "url"]));
            }
            Ok(())
        }
        Commands::Paginate { collection, filter, url } => paginate(&engine, collection, filter, url),
        Commands::Media { tag } => {
            for file in engine.iterate_media(tag.as_deref()) {
                println!("{}", columns(&file, &["url", "alt", "tags"]));
            }
            Ok(())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let mut config = SiteConfig::load(root, &cli.config)?;
    if cli.static_mode {
        config.render.mode = RenderMode::Static;
    }
    config.validate()?;

    let content = config.content_root();
    if !content.is_dir() {
        bail!("Content directory `{}` not found.", content.display());
    }
    Ok(config)
}

fn markup(input: &Path) -> Result<()> {
    let source = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read `{}`", input.display()))?
    };
    println!("{}", folio::markup::to_html(&source));
    Ok(())
}

fn field(engine: &Engine, page: &str, key: &str, site: bool, default: &str, options: ResolveOptions<'_>) -> Result<()> {
    let content;
    let source = if site {
        DataSource::Site(engine.site())
    } else {
        content = engine
            .load_page(page)
            .with_context(|| format!("Page `{page}` not found"))?;
        DataSource::page(&content, page)
    };

    match engine.resolve_field(key, default, source, options) {
        Rendered::Html(html) => println!("{html}"),
        Rendered::List(items) => println!("{}", serde_json::to_string_pretty(&items)?),
    }
    Ok(())
}

fn query(
    engine: &Engine,
    collection: &str,
    filter: &FilterArgs,
    slug: Option<&str>,
    field: Option<&str>,
    show: &[String],
) -> Result<()> {
    if let Some(slug) = slug {
        let output = engine.query_collection(collection, Lookup::Slug(slug), field);
        if field.is_some() {
            println!("{}", output.into_field());
            return Ok(());
        }
        let Some(item) = output.into_record() else {
            bail!("No item `{slug}` in collection `{collection}`");
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    let lookup = filter.to_filter().map_or(Lookup::All, Lookup::Filter);
    let Some(items) = engine.query_collection(collection, lookup, None).into_items() else {
        return Ok(());
    };
    let show: Vec<&str> = show.iter().map(String::as_str).collect();
    let mut count = 0;
    for item in items {
        println!("{}", columns(&item, &show));
        count += 1;
    }
    log!("query"; "{count} items in `{collection}`");
    Ok(())
}

fn paginate(engine: &Engine, collection: &str, filter: &FilterArgs, url: &str) -> Result<()> {
    let filter = filter.to_filter();
    let info = engine.page_info(collection, filter.as_ref());
    let numbers: Vec<String> = info
        .visible
        .iter()
        .map(|slot| match *slot {
            PageSlot::Page(n) if n == info.current_page => format!("[{n}]"),
            PageSlot::Page(n) => n.to_string(),
            PageSlot::Ellipsis => "…".to_owned(),
        })
        .collect();

    log!("pages"; "page {} of {} ({})", info.current_page, info.total_pages, numbers.join(" "));
    let controls = engine.pagination_controls(collection, filter.as_ref(), url);
    if !controls.is_empty() {
        println!("{controls}");
    }
    Ok(())
}

/// Tab-separated plain values of `fields`.
fn columns(record: &Record, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| lookup_path(record, field).map(scalar_to_string).unwrap_or_default().into_owned())
        .collect::<Vec<_>>()
        .join("\t")
}
