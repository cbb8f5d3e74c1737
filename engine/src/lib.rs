pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod pg;
pub mod query;
pub mod rank;
pub mod report;
pub mod search;
pub mod session;
pub mod text;

pub use context::Context;
pub use error::{Error, Result};

/// A ranked row returned by the search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    /// Path to the stored source text, re-scanned when highlighting matches.
    pub filepath: String,
    pub rank: f64,
}

impl Document {
    pub fn new(title: impl Into<String>, filepath: impl Into<String>, rank: f64) -> Self {
        Self { title: title.into(), filepath: filepath.into(), rank }
    }

    /// Copy of this document carrying a different rank.
    pub fn with_rank(&self, rank: f64) -> Self {
        Self { title: self.title.clone(), filepath: self.filepath.clone(), rank }
    }
}

/// A source line that matched at least one keyword. Line numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    pub line_number: usize,
    pub text: String,
}
