//! Line filters: find the lines of a source file that mention any keyword.

use crate::error::{Error, Result};
use crate::highlight::Keyword;
use crate::text::fold;
use crate::MatchLine;
use lazy_static::lazy_static;
use regex::RegexBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Returns the `(line number, text)` pairs of `path` matching any keyword,
/// case-insensitively, in file order. No match is an empty vector.
pub trait LineFilter {
    fn filter_lines(&self, path: &Path, keywords: &[Keyword]) -> Result<Vec<MatchLine>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Grep,
    Regex,
}

lazy_static! {
    // Unaccented letter -> every lowercase form that folds to it.
    static ref ACCENTED: HashMap<char, &'static str> = [
        ('α', "αά"), ('ε', "εέ"), ('η', "ηή"), ('ι', "ιίϊΐ"), ('ο', "οό"), ('υ', "υύϋΰ"), ('ω', "ωώ"), ('σ', "σς"),
        ('a', "aàáâãäå"), ('c', "cç"), ('e', "eèéêë"), ('i', "iìíîï"), ('n', "nñ"), ('o', "oòóôõö"), ('u', "uùúûü"),
    ]
    .into_iter()
    .collect();
}

/// Keywords joined into one alternation.
pub fn alternation(keywords: &[Keyword]) -> String {
    keywords.iter().map(|k| regex::escape(k.as_str())).collect::<Vec<_>>().join("|")
}

/// Alternation for engines that compare characters verbatim: every letter
/// becomes a group of its accented and upper-case forms, so `κρισ` also
/// finds `Κρίση`. Groups rather than bracket classes keep multi-byte
/// letters intact whatever the external tool's locale.
pub fn accent_insensitive_alternation(keywords: &[Keyword]) -> String {
    keywords.iter().map(|k| accent_insensitive(k.as_str())).collect::<Vec<_>>().join("|")
}

fn accent_insensitive(keyword: &str) -> String {
    let mut pattern = String::new();
    for c in fold(keyword).chars() {
        if !c.is_alphabetic() {
            pattern.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        let lower: Vec<String> = match ACCENTED.get(&c) {
            Some(forms) => forms.chars().map(String::from).collect(),
            None => vec![c.to_string()],
        };
        let mut forms = lower.clone();
        for form in &lower {
            let upper = form.to_uppercase();
            if !forms.contains(&upper) {
                forms.push(upper);
            }
        }
        if forms.len() == 1 {
            pattern.push_str(&forms[0]);
        } else {
            pattern.push('(');
            pattern.push_str(&forms.join("|"));
            pattern.push(')');
        }
    }
    pattern
}

// The store is trusted to hand out paths of crawled files; check before reading.
fn check_file(name: &'static str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::collaborator(name, path, "file not found"));
    }
    Ok(())
}

/// Runs an external `grep -n -i -E` per call. The tool compares accents
/// verbatim, so keywords are expanded with `accent_insensitive_alternation`.
#[derive(Debug, Clone)]
pub struct GrepFilter {
    program: PathBuf,
}

impl GrepFilter {
    pub fn new(program: impl Into<PathBuf>) -> Self { Self { program: program.into() } }

    /// Use `configured` if given, otherwise the first `grep` on `PATH`.
    pub fn locate(configured: Option<&Path>) -> Option<Self> {
        match configured {
            Some(p) => Some(Self::new(p)),
            None => which::which("grep").ok().map(Self::new),
        }
    }
}

impl LineFilter for GrepFilter {
    fn filter_lines(&self, path: &Path, keywords: &[Keyword]) -> Result<Vec<MatchLine>> {
        check_file("grep", path)?;
        let output = Command::new(&self.program)
            .args(["-n", "-i", "-E", "-e"])
            .arg(accent_insensitive_alternation(keywords))
            .arg("--")
            .arg(path)
            .output()
            .map_err(|e| Error::collaborator("grep", path, format!("cannot run {}: {e}", self.program.display())))?;

        match output.status.code() {
            Some(0) => Ok(parse_numbered(&String::from_utf8_lossy(&output.stdout))),
            Some(1) => Ok(Vec::new()),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::collaborator("grep", path, format!("{}: {}", output.status, stderr.trim())))
            }
        }
    }
}

/// Parse `N:text` lines. Only the first colon separates; the text may hold more.
fn parse_numbered(stdout: &str) -> Vec<MatchLine> {
    stdout
        .lines()
        .filter_map(|l| {
            let (n, text) = l.split_once(':')?;
            Some(MatchLine { line_number: n.trim().parse().ok()?, text: text.to_string() })
        })
        .collect()
}

/// In-process filter. Lines and keywords are accent-folded before matching,
/// so unaccented radicals find accented text.
#[derive(Debug, Clone, Default)]
pub struct RegexFilter;

impl LineFilter for RegexFilter {
    fn filter_lines(&self, path: &Path, keywords: &[Keyword]) -> Result<Vec<MatchLine>> {
        check_file("regex filter", path)?;
        let pattern = fold(&alternation(keywords));
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::collaborator("regex filter", path, e.to_string()))?;
        let text = std::fs::read_to_string(path).map_err(|e| Error::collaborator("regex filter", path, e.to_string()))?;
        Ok(text
            .lines()
            .enumerate()
            .filter(|(_, line)| re.is_match(&fold(line)))
            .map(|(i, line)| MatchLine { line_number: i + 1, text: line.to_string() })
            .collect())
    }
}
