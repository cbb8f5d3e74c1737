use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the query pipeline.
///
/// `Validation`, `Config` and `Connection` are fatal for a run. `Precondition`
/// only aborts the interactive phase and `Collaborator` degrades to an empty
/// outcome for the document being inspected. Zero matches is not an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot connect to database {dbname}: {source}")]
    Connection {
        dbname: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("search query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("{collaborator} failed on {}: {reason}", path.display())]
    Collaborator {
        collaborator: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn collaborator(collaborator: &'static str, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Collaborator { collaborator, path: path.into(), reason: reason.into() }
    }

    /// Whether the error must end the whole run rather than one phase of it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Config(_) | Error::Connection { .. } | Error::Query(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_run_level_errors_are_fatal() {
        assert!(Error::Validation("too many".into()).is_fatal());
        assert!(Error::Config("missing".into()).is_fatal());
        assert!(!Error::Precondition("empty".into()).is_fatal());
        assert!(!Error::collaborator("grep", "/tmp/x", "exit 2").is_fatal());
    }

    #[test]
    fn collaborator_message_names_the_file() {
        let e = Error::collaborator("grep", "/data/article3.txt", "exit status 2");
        assert_eq!(e.to_string(), "grep failed on /data/article3.txt: exit status 2");
    }
}
