//! Query sanitisation and construction of the engine-agnostic descriptor.

use crate::context::Context;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
    static ref SPACES: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref IDENT: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex");
}

/// Normalisation flags understood by the engine's ranking function.
///
/// Codes are bit flags; the engine may combine them, but a run picks a single
/// named one from this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMetric {
    #[default]
    NoDocLength,
    DivRankBy1Log,
    DivDocLength,
    HarmonicDist,
    DivUnique,
    DivRankBy1LogUnique,
    DivRank1,
}

const METRICS: &[(&str, QueryMetric)] = &[
    ("no_doc_length", QueryMetric::NoDocLength),
    ("div_rank_by_1_log", QueryMetric::DivRankBy1Log),
    ("div_doc_length", QueryMetric::DivDocLength),
    ("harmonic_dist", QueryMetric::HarmonicDist),
    ("div_unique", QueryMetric::DivUnique),
    ("div_rank_by_1_log_unique", QueryMetric::DivRankBy1LogUnique),
    ("div_rank_1", QueryMetric::DivRank1),
];

impl QueryMetric {
    pub fn weight(self) -> i32 {
        match self {
            QueryMetric::NoDocLength => 0,
            QueryMetric::DivRankBy1Log => 1,
            QueryMetric::DivDocLength => 2,
            QueryMetric::HarmonicDist => 4,
            QueryMetric::DivUnique => 8,
            QueryMetric::DivRankBy1LogUnique => 16,
            QueryMetric::DivRank1 => 32,
        }
    }

    pub fn name(self) -> &'static str {
        METRICS.iter().find(|(_, m)| *m == self).map(|(n, _)| *n).unwrap_or("no_doc_length")
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        METRICS.iter().map(|(n, _)| *n)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        METRICS.iter().find(|(n, _)| *n == name).map(|(_, m)| *m)
    }

    /// Resolve a user-supplied metric name. Unknown names fall back to the
    /// default metric with a warning; this never fails.
    pub fn resolve(ctx: &Context, name: &str) -> Self {
        ctx.scope(|| match Self::from_name(name) {
            Some(metric) => {
                tracing::info!(metric = name, weight = metric.weight(), "metric chosen");
                metric
            }
            None => {
                let available = Self::names().map(|n| format!("'{n}'")).collect::<Vec<_>>().join(", ");
                tracing::info!(%available, "available metrics");
                tracing::warn!(metric = name, fallback = Self::default().name(), "invalid metric, falling back to default");
                Self::default()
            }
        })
    }
}

impl fmt::Display for QueryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Stored document columns that can be selected alongside the rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Filepath,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Filepath => "filepath",
        }
    }
}

/// Language of the corpus. Drives the engine's text-search configuration,
/// the stemming algorithm and the stopword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Greek,
    English,
}

impl Language {
    /// Name of the engine's text-search configuration for this language.
    pub fn regconfig(self) -> &'static str {
        match self {
            Language::Greek => "greek",
            Language::English => "english",
        }
    }
}

/// Where the engine keeps the indexed documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub table: String,
    pub vector_column: String,
}

impl StoreLayout {
    pub fn new(table: impl Into<String>, vector_column: impl Into<String>) -> Result<Self> {
        let layout = Self { table: table.into(), vector_column: vector_column.into() };
        for ident in [&layout.table, &layout.vector_column] {
            if !IDENT.is_match(ident) {
                return Err(Error::Config(format!("'{ident}' is not a valid SQL identifier")));
            }
        }
        Ok(layout)
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self { table: "documents".into(), vector_column: "docvec".into() }
    }
}

/// Engine-agnostic description of a ranked full-text query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub columns: Vec<Column>,
    pub metric: QueryMetric,
    pub text: String,
    pub language: Language,
    pub layout: StoreLayout,
}

impl SearchQuery {
    /// Render as parameterised SQL: `$1` is the query text, `$2` the row limit.
    pub fn to_sql(&self) -> String {
        let columns = self.columns.iter().map(|c| c.as_str()).collect::<Vec<_>>();
        let select = if columns.is_empty() { String::new() } else { format!("{}, ", columns.join(", ")) };
        format!(
            "SELECT {select}ts_rank_cd({vec}, query, {weight})::float8 AS rank \
             FROM {table}, plainto_tsquery('{cfg}', $1) query \
             WHERE query @@ {vec} \
             ORDER BY rank DESC \
             LIMIT $2",
            vec = self.layout.vector_column,
            weight = self.metric.weight(),
            table = self.layout.table,
            cfg = self.language.regconfig(),
        )
    }
}

/// Replace every run of non-word characters with one space, collapse
/// whitespace and trim.
pub fn sanitize(raw: &str) -> String {
    let spaced = NON_WORD.replace_all(raw, " ");
    SPACES.replace_all(&spaced, " ").trim().to_string()
}

pub fn build(ctx: &Context, clean: &str, columns: &[Column], metric: QueryMetric, language: Language, layout: StoreLayout) -> SearchQuery {
    let query = SearchQuery { columns: columns.to_vec(), metric, text: clean.to_string(), language, layout };
    ctx.scope(|| {
        tracing::info!(input = clean, "user searched");
        tracing::info!(sql = %query.to_sql(), metric = %metric, "constructed the query");
    });
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_punctuation_and_space() {
        assert_eq!(sanitize(" Athens!!  council "), "Athens council");
        assert_eq!(sanitize("a--b,,c"), "a b c");
        assert_eq!(sanitize("!!!"), "");
    }

    #[test]
    fn sanitize_keeps_non_ascii_words() {
        assert_eq!(sanitize("Βουλή; των Ελλήνων!"), "Βουλή των Ελλήνων");
    }

    #[test]
    fn metric_table_matches_engine_codes() {
        let weights: Vec<i32> = QueryMetric::names().map(|n| QueryMetric::from_name(n).unwrap().weight()).collect();
        assert_eq!(weights, vec![0, 1, 2, 4, 8, 16, 32]);
    }

    #[test]
    fn unknown_metric_resolves_to_default() {
        let ctx = Context::with_id("test");
        assert_eq!(QueryMetric::resolve(&ctx, "div_everything").weight(), 0);
        assert_eq!(QueryMetric::resolve(&ctx, "").weight(), 0);
        assert_eq!(QueryMetric::resolve(&ctx, "harmonic_dist"), QueryMetric::HarmonicDist);
    }

    #[test]
    fn sql_binds_text_and_embeds_weight() {
        let ctx = Context::with_id("test");
        let q = build(&ctx, "Athens council", &[Column::Title, Column::Filepath], QueryMetric::DivDocLength, Language::Greek, StoreLayout::default());
        let sql = q.to_sql();
        assert!(sql.starts_with("SELECT title, filepath, ts_rank_cd(docvec, query, 2)::float8 AS rank"));
        assert!(sql.contains("plainto_tsquery('greek', $1)"));
        assert!(sql.contains("ORDER BY rank DESC"));
        assert!(!sql.contains("Athens"));
    }

    #[test]
    fn layout_rejects_injected_identifiers() {
        assert!(StoreLayout::new("documents; drop table x", "docvec").is_err());
        assert!(StoreLayout::new("articles", "body_vec").is_ok());
    }
}
