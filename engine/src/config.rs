//! Run configuration, loaded from a TOML file.
//!
//! ```toml
//! [credentials]
//! host = "localhost"
//! port = 5432
//! user = "docengine"
//! password = "secret"
//! dbname = "articles"
//!
//! [search]
//! language = "greek"
//! threshold = 0.5
//!
//! [highlight]
//! cutoff = 5
//! filter = "grep"
//! ```

use crate::context::Context;
use crate::error::{Error, Result};
use crate::filter::FilterKind;
use crate::query::{Language, StoreLayout};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "docengine.toml";
pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_CUTOFF: usize = 5;

/// Engine connection parameters. All five are required.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"******")
            .field("dbname", &self.dbname)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub language: Language,
    pub threshold: f64,
    pub table: String,
    pub vector_column: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let layout = StoreLayout::default();
        Self { language: Language::default(), threshold: DEFAULT_THRESHOLD, table: layout.table, vector_column: layout.vector_column }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    pub cutoff: usize,
    pub filter: FilterKind,
    /// Line-filter executable; resolved on `PATH` when unset.
    pub grep: Option<PathBuf>,
    pub color: bool,
}

impl Default for HighlightSettings {
    fn default() -> Self { Self { cutoff: DEFAULT_CUTOFF, filter: FilterKind::default(), grep: None, color: true } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub credentials: Credentials,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
}

impl Config {
    pub fn load(ctx: &Context, path: &Path) -> Result<Self> {
        let _guard = ctx.span().enter();
        let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(path = %abs.display(), "config file doesn't exist");
            Error::Config(format!("cannot read {}: {e}", abs.display()))
        })?;
        tracing::info!(path = %abs.display(), "reading configuration");
        let mut config = Self::from_toml(&content)?;
        if let Ok(password) = std::env::var("DOCENGINE_PASSWORD") {
            config.credentials.password = password;
        }
        config.log_credentials();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(Error::Config(format!("threshold {} must lie within [0, 1]", self.search.threshold)));
        }
        if self.highlight.cutoff == 0 {
            return Err(Error::Config("cutoff must be at least 1".into()));
        }
        self.layout()?;
        Ok(())
    }

    pub fn layout(&self) -> Result<StoreLayout> {
        StoreLayout::new(&self.search.table, &self.search.vector_column)
    }

    fn log_credentials(&self) {
        let c = &self.credentials;
        tracing::info!(user = %c.user, host = %c.host, port = c.port, dbname = %c.dbname, password = "******", "using credentials");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [credentials]
        host = "localhost"
        port = 5432
        user = "docengine"
        password = "hunter2"
        dbname = "articles"
    "#;

    #[test]
    fn defaults_apply_when_sections_are_absent() {
        let config = Config::from_toml(FULL).unwrap();
        assert_eq!(config.search.language, Language::Greek);
        assert_eq!(config.search.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.highlight.cutoff, DEFAULT_CUTOFF);
        assert_eq!(config.layout().unwrap(), StoreLayout::default());
    }

    #[test]
    fn missing_credential_is_rejected() {
        let partial = r#"
            [credentials]
            host = "localhost"
            port = 5432
            user = "docengine"
            dbname = "articles"
        "#;
        assert!(matches!(Config::from_toml(partial), Err(Error::Config(_))));
        assert!(matches!(Config::from_toml("[search]\nthreshold = 0.4\n"), Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let text = format!("{FULL}\n[search]\nthreshold = 1.5\n");
        assert!(matches!(Config::from_toml(&text), Err(Error::Config(_))));
    }

    #[test]
    fn debug_output_masks_password() {
        let config = Config::from_toml(FULL).unwrap();
        let dbg = format!("{:?}", config.credentials);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("******"));
    }

    #[test]
    fn sections_override_defaults() {
        let text = format!("{FULL}\n[search]\nlanguage = \"english\"\nthreshold = 0.25\n[highlight]\ncutoff = 4\nfilter = \"regex\"\ncolor = false\n");
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.search.language, Language::English);
        assert_eq!(config.search.threshold, 0.25);
        assert_eq!(config.highlight.cutoff, 4);
        assert_eq!(config.highlight.filter, FilterKind::Regex);
        assert!(!config.highlight.color);
    }
}
