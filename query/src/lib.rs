use anyhow::{bail, Result};
use clap::Parser;
use engine::config::{Config, DEFAULT_CONFIG_FILE};
use engine::filter::{FilterKind, GrepFilter, LineFilter, RegexFilter};
use engine::highlight::{Marker, MatchHighlighter, QueryMatches};
use engine::pg::PgEngine;
use engine::query::{self, Column, QueryMetric, SearchQuery};
use engine::search::{self, SearchEngine, SearchExecutor};
use engine::session::InteractiveSession;
use engine::text::SnowballStemmer;
use engine::{rank, report, Context, Document};
use std::io::{self, Write};
use std::path::PathBuf;

const COLUMNS: &[Column] = &[Column::Title, Column::Filepath];

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Rank stored articles for a free-text query and show why they matched", long_about = None)]
pub struct Cli {
    /// Free-text query
    pub query: String,
    /// Rank normalisation metric, e.g. div_doc_length (unknown names fall back to no_doc_length)
    pub metric: String,
    /// Maximum number of results to fetch (at most 100)
    pub max_results: usize,
    /// Configuration file with the database credentials
    #[arg(long, env = "DOCENGINE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Minimum normalised rank for a document to be recommended
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Query tokens at least this long are stemmed and prefix-matched
    #[arg(long)]
    pub cutoff: Option<usize>,
    /// Mark matches with <em> tags instead of terminal colours
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
    /// Only print the ranked table
    #[arg(long, default_value_t = false)]
    pub no_interactive: bool,
}

/// Settings for one run after the config file and flags are merged.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub threshold: f64,
    pub cutoff: usize,
    pub marker: Marker,
    pub interactive: bool,
}

impl RunSettings {
    pub fn merge(cli: &Cli, config: &Config) -> Result<Self> {
        let threshold = cli.threshold.unwrap_or(config.search.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            bail!("threshold {threshold} must lie within [0, 1]");
        }
        let cutoff = cli.cutoff.unwrap_or(config.highlight.cutoff);
        if cutoff == 0 {
            bail!("cutoff must be at least 1");
        }
        let marker = if cli.no_color || !config.highlight.color { Marker::Emphasis } else { Marker::Ansi };
        Ok(Self { threshold, cutoff, marker, interactive: !cli.no_interactive })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new();
    // Everything that can be rejected is checked before the engine is contacted.
    search::validate_limit(cli.max_results)?;
    let config = Config::load(&ctx, &cli.config)?;
    let settings = RunSettings::merge(&cli, &config)?;

    let clean = query::sanitize(&cli.query);
    if clean.is_empty() {
        bail!("query '{}' has no searchable words", cli.query);
    }
    let metric = QueryMetric::resolve(&ctx, &cli.metric);
    let columns: Vec<&str> = COLUMNS.iter().map(|c| c.as_str()).collect();
    ctx.scope(|| tracing::info!(?columns, "showing columns"));
    let q = query::build(&ctx, &clean, COLUMNS, metric, config.search.language, config.layout()?);

    let mut pg = PgEngine::connect(&ctx, &config.credentials)?;
    let result = search_and_show(&ctx, &mut pg, &q, cli.max_results, &settings, &config);
    let closed = pg.close(&ctx);
    result?;
    closed?;
    Ok(())
}

fn search_and_show(ctx: &Context, engine: &mut dyn SearchEngine, q: &SearchQuery, max_results: usize, settings: &RunSettings, config: &Config) -> Result<()> {
    let stdout = io::stdout();
    let scaled = rank_and_report(ctx, engine, q, max_results, settings, &mut stdout.lock())?;
    if scaled.is_empty() || !settings.interactive {
        return Ok(());
    }

    let highlighter = MatchHighlighter::new(
        Box::new(SnowballStemmer::new(config.search.language)),
        line_filter(ctx, config),
        config.search.language,
        settings.cutoff,
    );
    let mut inspector = QueryMatches::new(&highlighter, q.text.clone(), settings.marker);
    let mut session = InteractiveSession::new(io::stdin().lock(), stdout.lock(), settings.threshold);
    match session.run(ctx, &scaled, &mut inspector) {
        Ok(outcome) => ctx.scope(|| tracing::info!(?outcome, "session finished")),
        Err(e) if !e.is_fatal() => ctx.scope(|| tracing::warn!(error = %e, "match display aborted")),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Fetch, normalise and print the ranked table. Returns the normalised documents.
pub fn rank_and_report(ctx: &Context, engine: &mut dyn SearchEngine, q: &SearchQuery, max_results: usize, settings: &RunSettings, out: &mut dyn Write) -> Result<Vec<Document>> {
    let docs = SearchExecutor::new(engine).execute(ctx, q, max_results)?;
    let scaled = rank::normalize(ctx, &docs);
    report::summary(ctx, &scaled, settings.threshold);
    write!(out, "{}", report::render_table(ctx, &scaled))?;
    out.flush()?;
    Ok(scaled)
}

fn line_filter(ctx: &Context, config: &Config) -> Box<dyn LineFilter> {
    match config.highlight.filter {
        FilterKind::Regex => Box::new(RegexFilter),
        FilterKind::Grep => match GrepFilter::locate(config.highlight.grep.as_deref()) {
            Some(grep) => Box::new(grep),
            None => {
                ctx.scope(|| tracing::warn!("no grep executable found, using the built-in line filter"));
                Box::new(RegexFilter)
            }
        },
    }
}
