use crate::context::Context;
use crate::error::{Error, Result};
use crate::query::SearchQuery;
use crate::Document;

/// Hard cap on the number of documents a single query may return.
pub const MAX_RESULTS: usize = 100;

/// A full-text engine that ranks and orders documents for a query.
///
/// Implementations return at most `limit` rows in descending rank order and
/// must release whatever cursor they open before returning, on every path.
pub trait SearchEngine {
    fn fetch(&mut self, query: &SearchQuery, limit: usize) -> Result<Vec<Document>>;
}

pub fn validate_limit(max_results: usize) -> Result<()> {
    if max_results > MAX_RESULTS {
        return Err(Error::Validation(format!(
            "results set exceeds max number of instances to return {max_results} > {MAX_RESULTS}"
        )));
    }
    Ok(())
}

pub struct SearchExecutor<'e, E: SearchEngine + ?Sized> {
    engine: &'e mut E,
}

impl<'e, E: SearchEngine + ?Sized> SearchExecutor<'e, E> {
    pub fn new(engine: &'e mut E) -> Self { Self { engine } }

    /// Run `query`, returning at most `max_results` documents in engine order.
    /// The limit is validated before the engine is touched.
    pub fn execute(&mut self, ctx: &Context, query: &SearchQuery, max_results: usize) -> Result<Vec<Document>> {
        let _guard = ctx.span().enter();
        validate_limit(max_results)?;

        tracing::info!(max_results, "fetching at most {max_results} instance(s)");
        let mut docs = self.engine.fetch(query, max_results)?;
        docs.truncate(max_results);

        if docs.is_empty() {
            tracing::warn!(query = %query.text, "got no results");
        } else {
            tracing::info!(found = docs.len(), requested = max_results, "found {} docs out of the {} requested", docs.len(), max_results);
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Column, Language, QueryMetric, StoreLayout};

    struct CountingEngine {
        calls: usize,
        rows: Vec<Document>,
    }

    impl SearchEngine for CountingEngine {
        fn fetch(&mut self, _query: &SearchQuery, _limit: usize) -> Result<Vec<Document>> {
            self.calls += 1;
            Ok(self.rows.clone())
        }
    }

    fn query() -> SearchQuery {
        SearchQuery {
            columns: vec![Column::Title, Column::Filepath],
            metric: QueryMetric::default(),
            text: "crisis".into(),
            language: Language::English,
            layout: StoreLayout::default(),
        }
    }

    fn rows(n: usize) -> Vec<Document> {
        (0..n).map(|i| Document::new(format!("t{i}"), format!("article{i}.txt"), 1.0 - i as f64 / 1000.0)).collect()
    }

    #[test]
    fn over_cap_fails_before_engine_call() {
        let ctx = Context::with_id("test");
        let mut engine = CountingEngine { calls: 0, rows: rows(3) };
        let err = SearchExecutor::new(&mut engine).execute(&ctx, &query(), MAX_RESULTS + 1).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn cap_itself_is_allowed() {
        let ctx = Context::with_id("test");
        let mut engine = CountingEngine { calls: 0, rows: rows(3) };
        let docs = SearchExecutor::new(&mut engine).execute(&ctx, &query(), MAX_RESULTS).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(engine.calls, 1);
    }

    #[test]
    fn never_returns_more_than_requested() {
        let ctx = Context::with_id("test");
        let mut engine = CountingEngine { calls: 0, rows: rows(20) };
        let docs = SearchExecutor::new(&mut engine).execute(&ctx, &query(), 5).unwrap();
        assert_eq!(docs.len(), 5);
        assert_eq!(docs[0].title, "t0");
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let ctx = Context::with_id("test");
        let mut engine = CountingEngine { calls: 0, rows: vec![] };
        let docs = SearchExecutor::new(&mut engine).execute(&ctx, &query(), 10).unwrap();
        assert!(docs.is_empty());
    }
}
