//! Argument parsing and the single query run behind the `taskboard` binary.

use std::borrow::Cow;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use clap::{Parser, ValueEnum};
use taskboard_query::{
    read_to_string, Clock, Dir, FilterMap, FixedClock, Format, QueryEngine, QueryResult, Record,
    SearchConfig, Seekable, SystemClock,
};

/// Search, filter and sort a taskboard item collection.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
pub struct Args {
    /// JSON or YAML file holding an array of items.
    #[arg(long, short = 'i')]
    pub items: PathBuf,

    /// View config file (JSON or YAML).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Free-text query matched against the search fields.
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Filter as key=value. Repeat for more; all must hold.
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Field searched by the query. Replaces the config's search fields.
    #[arg(long = "search-field", value_name = "FIELD")]
    pub search_fields: Vec<String>,

    /// Field to sort by.
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction: asc or desc.
    #[arg(long)]
    pub order: Option<Dir>,

    /// Instant used for due date buckets (RFC 3339). Defaults to the local
    /// clock.
    #[arg(long)]
    pub now: Option<DateTime<FixedOffset>>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per item plus a count footer.
    Text,
    Json,
    Yaml,
}

/// Runs one query and returns the rendered output.
pub fn run(args: &Args) -> anyhow::Result<String> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if !args.search_fields.is_empty() {
        config.search_fields = args.search_fields.clone();
    }

    let items = load_items(&args.items)
        .with_context(|| format!("loading items {}", args.items.display()))?;
    tracing::debug!(count = items.len(), "loaded items");

    let now = args.now.unwrap_or_else(|| SystemClock.now());
    let mut engine = QueryEngine::with_clock(config, FixedClock(now));
    engine.set_items(items);

    if let Some(query) = &args.query {
        engine.set_query(query.as_str());
    }
    let mut filters = FilterMap::new();
    for expr in &args.filters {
        let (key, value) = FilterMap::parse_assignment(expr)?;
        filters.set(key, Some(value));
    }
    engine.set_filters(filters);
    if let Some(field) = &args.sort_by {
        engine.set_sort_by(field.as_str());
    }
    if let Some(order) = args.order {
        engine.set_sort_order(order);
    }

    let fields = engine.config().search_fields.clone();
    let result = engine.results();
    render(&result, &fields, args.output)
}

fn load_items(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text = read_to_string(path)?;
    let items = match Format::of(path)? {
        Format::Json => serde_json::from_str(&text)?,
        Format::Yaml => serde_yaml::from_str(&text)?,
    };
    Ok(items)
}

fn render(
    result: &QueryResult<'_, Record>,
    fields: &[String],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(result)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for item in result.iter() {
                writeln!(out, "{}", summary(item, fields)?)?;
            }
            writeln!(
                out,
                "showing {} of {}",
                result.result_count, result.total_count
            )?;
            Ok(out)
        }
    }
}

/// One line for an item: its search fields joined by ` | `, or the compact
/// JSON object when the view searches no fields.
fn summary(item: &Record, fields: &[String]) -> anyhow::Result<String> {
    if fields.is_empty() {
        return Ok(serde_json::to_string(item)?);
    }
    let parts: Vec<String> = fields
        .iter()
        .map(|field| {
            item.field_value(field)
                .text()
                .map(Cow::into_owned)
                .unwrap_or_default()
        })
        .collect();
    Ok(parts.join(" | "))
}
