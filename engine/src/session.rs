//! Consent-driven walk over the recommended documents.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::rank;
use crate::Document;
use std::io::{BufRead, Write};

/// Something to do with each document the user agrees to look at.
pub trait Inspect {
    fn inspect(&mut self, ctx: &Context, doc: &Document, out: &mut dyn Write) -> Result<()>;
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Declined at the first question.
    Skipped,
    /// Declined to continue after `shown` documents.
    Stopped { shown: usize },
    /// Every selected document was shown.
    Exhausted { shown: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitInitialConsent,
    ShowingDoc(usize),
    AwaitContinueConsent(usize),
    Done(Outcome),
}

pub struct InteractiveSession<R, W> {
    input: R,
    output: W,
    threshold: f64,
}

impl<R: BufRead, W: Write> InteractiveSession<R, W> {
    pub fn new(input: R, output: W, threshold: f64) -> Self {
        Self { input, output, threshold }
    }

    /// Offer the documents ranked at or above the threshold, one at a time.
    ///
    /// Fails without any I/O when `docs` is empty. There is no prompt after
    /// the last selected document.
    pub fn run(&mut self, ctx: &Context, docs: &[Document], inspector: &mut dyn Inspect) -> Result<Outcome> {
        if docs.is_empty() {
            return Err(Error::Precondition("no results to show matches for".into()));
        }
        let selected = rank::relevant(docs, self.threshold);
        let mut state = State::AwaitInitialConsent;

        loop {
            state = match state {
                State::AwaitInitialConsent => {
                    if self.ask("Show matching lines of the recommended documents?")? {
                        if selected.is_empty() { State::Done(Outcome::Exhausted { shown: 0 }) } else { State::ShowingDoc(0) }
                    } else {
                        ctx.scope(|| tracing::info!("user chose not to view matches"));
                        State::Done(Outcome::Skipped)
                    }
                }
                State::ShowingDoc(i) => {
                    let doc = &selected[i];
                    ctx.scope(|| tracing::info!(file = %doc.filepath, rank = doc.rank, "showing matches"));
                    writeln!(self.output, "\n{} ({}, rank {:.5})", doc.filepath, doc.title, doc.rank)?;
                    inspector.inspect(ctx, doc, &mut self.output)?;
                    if i + 1 == selected.len() {
                        State::Done(Outcome::Exhausted { shown: selected.len() })
                    } else {
                        State::AwaitContinueConsent(i)
                    }
                }
                State::AwaitContinueConsent(i) => {
                    if self.ask("Continue to the next document?")? {
                        State::ShowingDoc(i + 1)
                    } else {
                        ctx.scope(|| tracing::info!(shown = i + 1, "user stopped"));
                        State::Done(Outcome::Stopped { shown: i + 1 })
                    }
                }
                State::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Ask until the answer is y/yes or n/no (any case). End of input counts as no.
    pub fn ask(&mut self, question: &str) -> Result<bool> {
        loop {
            write!(self.output, "{question} [y/n] ")?;
            self.output.flush()?;
            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    pub fn into_output(self) -> W { self.output }
}
