//! Re-scan a document's source text and mark the tokens that explain a match.

use crate::context::Context;
use crate::error::Result;
use crate::filter::LineFilter;
use crate::query::Language;
use crate::session::Inspect;
use crate::text::{fold, is_stopword, line_tokens, word_core, Stem, WordClass};
use crate::{Document, MatchLine};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// A search keyword derived from one query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    /// Stemmed form of a long token; line tokens whose stem starts with it match.
    Radical(String),
    /// Lowercased short token; only an exact token match counts.
    Literal(String),
}

impl Keyword {
    pub fn as_str(&self) -> &str {
        match self {
            Keyword::Radical(s) | Keyword::Literal(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedLine {
    pub line_number: usize,
    pub tokens: Vec<Token>,
}

/// How matched tokens are set apart from the rest of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ansi,
    Emphasis,
}

impl Marker {
    fn mark(self, token: &str) -> String {
        match self {
            Marker::Ansi => token.green().bold().to_string(),
            Marker::Emphasis => format!("<em>{token}</em>"),
        }
    }
}

impl HighlightedLine {
    pub fn matched(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter(|t| t.matched).map(|t| t.text.as_str())
    }

    pub fn render(&self, marker: Marker) -> String {
        let text = self
            .tokens
            .iter()
            .map(|t| if t.matched { marker.mark(&t.text) } else { t.text.clone() })
            .collect::<Vec<_>>()
            .join(" ");
        format!("{:>6} | {}", self.line_number, text)
    }
}

pub struct MatchHighlighter {
    stemmer: Box<dyn Stem>,
    filter: Box<dyn LineFilter>,
    language: Language,
    cutoff: usize,
}

impl MatchHighlighter {
    pub fn new(stemmer: Box<dyn Stem>, filter: Box<dyn LineFilter>, language: Language, cutoff: usize) -> Self {
        Self { stemmer, filter, language, cutoff }
    }

    /// Stopwords are dropped; tokens of at least `cutoff` characters become
    /// radicals, shorter ones lowercase literals. Duplicates are collapsed.
    pub fn keywords(&self, query: &str) -> Result<Vec<Keyword>> {
        let mut keywords: Vec<Keyword> = Vec::new();
        for raw in query.split_whitespace() {
            let token = word_core(raw);
            if token.is_empty() || is_stopword(self.language, token) {
                continue;
            }
            let keyword = if token.chars().count() >= self.cutoff {
                Keyword::Radical(self.stemmer.stem(token, WordClass::Noun)?)
            } else {
                Keyword::Literal(token.to_lowercase())
            };
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        Ok(keywords)
    }

    /// Matching lines of `path` with their keyword tokens marked.
    ///
    /// A failing stemmer or line filter is logged and yields no lines; it
    /// never aborts the caller.
    pub fn highlight(&self, ctx: &Context, query: &str, path: &Path) -> Vec<HighlightedLine> {
        let _guard = ctx.span().enter();
        match self.try_highlight(query, path) {
            Ok(lines) => {
                if lines.is_empty() {
                    tracing::warn!(path = %path.display(), "no matching lines");
                } else {
                    tracing::info!(path = %path.display(), lines = lines.len(), "found {} matching lines", lines.len());
                }
                lines
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not scan document, treating as no match");
                Vec::new()
            }
        }
    }

    fn try_highlight(&self, query: &str, path: &Path) -> Result<Vec<HighlightedLine>> {
        let keywords = self.keywords(query)?;
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(?keywords, "derived keywords");
        let lines = self.filter.filter_lines(path, &keywords)?;
        lines.iter().map(|line| self.mark_line(line, &keywords)).collect()
    }

    fn mark_line(&self, line: &MatchLine, keywords: &[Keyword]) -> Result<HighlightedLine> {
        let tokens = line_tokens(&line.text)
            .map(|t| Ok(Token { text: t.to_string(), matched: self.is_match(t, keywords)? }))
            .collect::<Result<Vec<_>>>()?;
        Ok(HighlightedLine { line_number: line.line_number, tokens })
    }

    fn is_match(&self, token: &str, keywords: &[Keyword]) -> Result<bool> {
        let core = word_core(token);
        if core.is_empty() {
            return Ok(false);
        }
        let folded = fold(core);
        let mut stem: Option<String> = None;
        for keyword in keywords {
            match keyword {
                Keyword::Literal(lit) => {
                    if folded == fold(lit) {
                        return Ok(true);
                    }
                }
                Keyword::Radical(radical) => {
                    if stem.is_none() {
                        stem = Some(self.stemmer.stem(core, WordClass::Noun)?);
                    }
                    let stem = stem.as_deref().unwrap_or_default();
                    let radical = fold(radical);
                    if stem.starts_with(&radical) {
                        return Ok(true);
                    }
                    // Approximate: catches compound and irregular surface forms,
                    // but also unrelated words that merely contain the radical.
                    if stem.chars().count() >= radical.chars().count() && folded.contains(&radical) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Print every matching line of `path`. Returns how many were printed.
    pub fn show(&self, ctx: &Context, query: &str, path: &Path, marker: Marker, out: &mut dyn Write) -> Result<usize> {
        let lines = self.highlight(ctx, query, path);
        for line in &lines {
            writeln!(out, "{}", line.render(marker))?;
        }
        Ok(lines.len())
    }
}

/// Shows the matches of one fixed query for each document it is handed.
pub struct QueryMatches<'h> {
    highlighter: &'h MatchHighlighter,
    query: String,
    marker: Marker,
}

impl<'h> QueryMatches<'h> {
    pub fn new(highlighter: &'h MatchHighlighter, query: impl Into<String>, marker: Marker) -> Self {
        Self { highlighter, query: query.into(), marker }
    }
}

impl Inspect for QueryMatches<'_> {
    fn inspect(&mut self, ctx: &Context, doc: &Document, out: &mut dyn Write) -> Result<()> {
        self.highlighter.show(ctx, &self.query, Path::new(&doc.filepath), self.marker, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter::RegexFilter;
    use crate::text::SnowballStemmer;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingStemmer {
        calls: Rc<Cell<usize>>,
    }

    impl Stem for CountingStemmer {
        fn stem(&self, word: &str, _hint: WordClass) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(fold(word))
        }
    }

    struct FailingFilter;

    impl LineFilter for FailingFilter {
        fn filter_lines(&self, path: &Path, _keywords: &[Keyword]) -> Result<Vec<MatchLine>> {
            Err(Error::collaborator("grep", path, "exit status 2"))
        }
    }

    fn english(cutoff: usize) -> MatchHighlighter {
        MatchHighlighter::new(Box::new(SnowballStemmer::new(Language::English)), Box::new(RegexFilter), Language::English, cutoff)
    }

    #[test]
    fn short_tokens_become_literals_without_stemming() {
        let calls = Rc::new(Cell::new(0));
        let h = MatchHighlighter::new(Box::new(CountingStemmer { calls: calls.clone() }), Box::new(RegexFilter), Language::English, 5);
        let kws = h.keywords("Tax Law EU").unwrap();
        assert_eq!(kws, vec![Keyword::Literal("tax".into()), Keyword::Literal("law".into()), Keyword::Literal("eu".into())]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn long_tokens_become_radicals_and_stopwords_drop() {
        let kws = english(5).keywords("the crisis of Athens").unwrap();
        assert_eq!(kws, vec![Keyword::Radical("crisi".into()), Keyword::Radical("athen".into())]);
    }

    #[test]
    fn cutoff_counts_characters_not_bytes() {
        let calls = Rc::new(Cell::new(0));
        let h = MatchHighlighter::new(Box::new(CountingStemmer { calls: calls.clone() }), Box::new(RegexFilter), Language::Greek, 5);
        // four Greek letters are eight bytes
        assert_eq!(h.keywords("φόρο").unwrap(), vec![Keyword::Literal("φόρο".into())]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn literal_requires_whole_token() {
        let h = english(5);
        let line = MatchLine { line_number: 4, text: "taxation and tax policy".into() };
        let marked = h.mark_line(&line, &[Keyword::Literal("tax".into())]).unwrap();
        assert_eq!(marked.matched().collect::<Vec<_>>(), vec!["tax"]);
    }

    #[test]
    fn radical_matches_inflected_forms() {
        let h = english(5);
        let line = MatchLine { line_number: 1, text: "Councils met. The council decided".into() };
        let marked = h.mark_line(&line, &[Keyword::Radical("council".into())]).unwrap();
        assert_eq!(marked.matched().collect::<Vec<_>>(), vec!["Councils", "council"]);
    }

    #[test]
    fn substring_fallback_over_matches_compounds() {
        let h = english(5);
        let line = MatchLine { line_number: 1, text: "a supercouncil formed".into() };
        let marked = h.mark_line(&line, &[Keyword::Radical("council".into())]).unwrap();
        assert_eq!(marked.matched().collect::<Vec<_>>(), vec!["supercouncil"]);
    }

    #[test]
    fn render_pads_line_number() {
        let line = HighlightedLine {
            line_number: 12,
            tokens: vec![Token { text: "The".into(), matched: false }, Token { text: "crisis".into(), matched: true }],
        };
        assert_eq!(line.render(Marker::Emphasis), "    12 | The <em>crisis</em>");
    }

    #[test]
    fn filter_failure_degrades_to_no_lines() {
        let ctx = Context::with_id("test");
        let h = MatchHighlighter::new(Box::new(SnowballStemmer::new(Language::English)), Box::new(FailingFilter), Language::English, 5);
        assert!(h.highlight(&ctx, "crisis", Path::new("/tmp/article1.txt")).is_empty());
    }

    #[test]
    fn stopword_only_query_scans_nothing() {
        let ctx = Context::with_id("test");
        let h = MatchHighlighter::new(Box::new(SnowballStemmer::new(Language::English)), Box::new(FailingFilter), Language::English, 5);
        let mut out = Vec::new();
        assert_eq!(h.show(&ctx, "the of and", Path::new("/tmp/none.txt"), Marker::Emphasis, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
