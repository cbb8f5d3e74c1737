use tracing::Span;

/// Per-run logging scope handed to every pipeline stage.
///
/// Each run gets its own span so that independent runs (or tests running
/// in parallel) never share logger state.
#[derive(Debug, Clone)]
pub struct Context {
    span: Span,
}

impl Context {
    pub fn new() -> Self {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self::with_id(format!("{nanos:x}"))
    }

    pub fn with_id(run_id: impl AsRef<str>) -> Self {
        let span = tracing::info_span!("run", id = %run_id.as_ref());
        Self { span }
    }

    pub fn span(&self) -> &Span { &self.span }

    /// Run `f` with this context's span entered.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}

impl Default for Context {
    fn default() -> Self { Self::new() }
}
