use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use feedsearch_core::day::parse_day;
use feedsearch_core::persist::{load_index, save_index, IndexPaths};
use feedsearch_core::{build, evaluate, terms, IndexConfig, InvertedIndex, Query, TermMatching};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

mod feed;
mod report;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a boolean search index over RSS feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from an RSS file or a directory of feeds
    Build {
        #[command(flatten)]
        source: SourceArgs,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
    /// Run one query against a built index
    Search {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        #[command(flatten)]
        query: QueryArgs,
        /// Print hits as JSON lines instead of the numbered list
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Index a feed and run the fixed demonstration queries
    Demo {
        #[command(flatten)]
        source: SourceArgs,
        /// Also persist the index to this directory
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// How query terms are compared with indexed terms
    #[arg(long, value_enum, default_value_t = Matching::Normalized)]
    term_matching: Matching,
    /// Drop feed items that fail to parse instead of aborting the build
    #[arg(long, default_value_t = false)]
    skip_invalid: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Matching {
    Normalized,
    Literal,
}

impl From<Matching> for TermMatching {
    fn from(m: Matching) -> Self {
        match m {
            Matching::Normalized => TermMatching::Normalized,
            Matching::Literal => TermMatching::Literal,
        }
    }
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long = "in-title")]
    in_title: Vec<String>,
    #[arg(long = "not-in-title")]
    not_in_title: Vec<String>,
    #[arg(long = "in-description")]
    in_description: Vec<String>,
    #[arg(long = "not-in-description")]
    not_in_description: Vec<String>,
    /// First publication day, YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,
    /// Last publication day (inclusive), YYYY-MM-DD
    #[arg(long)]
    end: Option<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Result<Query> {
        Ok(Query {
            title_must_include: terms(self.in_title.iter().cloned()),
            title_must_exclude: terms(self.not_in_title.iter().cloned()),
            description_must_include: terms(self.in_description.iter().cloned()),
            description_must_exclude: terms(self.not_in_description.iter().cloned()),
            start: self.start.as_deref().map(parse_day).transpose()?,
            end: self.end.as_deref().map(parse_day).transpose()?,
        })
    }
}

#[derive(Serialize)]
struct JsonHit<'a> {
    doc_id: u32,
    title: &'a str,
    description: &'a str,
    published: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { source, output } => run_build(&source, &output),
        Commands::Search { index, query, json } => {
            let index = load_index(&IndexPaths::new(&index))?;
            let query = query.to_query()?;
            run_query(&index, &query, json)
        }
        Commands::Demo { source, output } => {
            let index = index_feeds(&source)?;
            if let Some(output) = output {
                save_index(&IndexPaths::new(&output), &index)?;
            }
            for query in demo_queries()? {
                run_query(&index, &query, false)?;
            }
            Ok(())
        }
    }
}

/// Nothing is written unless every feed item made it into the index.
fn run_build(source: &SourceArgs, output: &str) -> Result<()> {
    let index = index_feeds(source)?;
    save_index(&IndexPaths::new(output), &index)?;
    tracing::info!(output, num_docs = index.num_docs(), "index build complete");
    Ok(())
}

fn index_feeds(source: &SourceArgs) -> Result<InvertedIndex> {
    let files = feed::collect_feed_files(Path::new(&source.input))?;
    tracing::info!(files = files.len(), input = %source.input, "ingesting feeds");
    let config = IndexConfig { term_matching: source.term_matching.into() };
    let skip_invalid = source.skip_invalid;
    let items = feed::read_feeds(&files).filter(|item| match item {
        Err(e) if skip_invalid => {
            tracing::warn!(error = %format!("{e:#}"), "skipping invalid feed item");
            false
        }
        _ => true,
    });
    let index = build(items, &config).context("index build failed")?;
    Ok(index)
}

fn run_query(index: &InvertedIndex, query: &Query, json: bool) -> Result<()> {
    let hits = evaluate(index, query);
    if json {
        for (doc_id, doc) in index.resolve_sorted_by_title(&hits) {
            let published = doc.published.format(&time::format_description::well_known::Rfc3339)?;
            let line = JsonHit { doc_id, title: &doc.title, description: &doc.description, published };
            println!("{}", serde_json::to_string(&line)?);
        }
    } else {
        println!("{}", report::describe_query(query));
        print!("{}", report::format_results(index, &hits));
    }
    Ok(())
}

fn demo_queries() -> Result<Vec<Query>> {
    Ok(vec![
        Query { title_must_include: terms(["kim", "korea"]), ..Query::default() },
        Query { title_must_include: terms(["kim"]), description_must_exclude: terms(["korea"]), ..Query::default() },
        Query {
            title_must_include: terms(["us"]),
            title_must_exclude: terms(["dawn"]),
            description_must_include: terms(["american", "confession"]),
            ..Query::default()
        },
        Query { start: Some(parse_day("2011-12-18")?), end: Some(parse_day("2011-12-18")?), ..Query::default() },
        Query { title_must_include: terms(["video"]), start: Some(parse_day("2000-01-01")?), ..Query::default() },
        Query {
            description_must_exclude: terms(["canada", "iraq", "israel"]),
            end: Some(parse_day("2011-12-18")?),
            ..Query::default()
        },
    ])
}
