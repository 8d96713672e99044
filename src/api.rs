use crate::engine::{Emitter, Parser, RunMetrics};
use crate::{Error, ParseError, Record, Template};
use std::time::{Duration, Instant};

/// Options that affect a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Commit the implicit record when input ends outside `Start`/`End` and
    /// the template declares no `EOF` state. Default: `true`.
    pub eof: bool,
    /// Collect a per-line trace into [`RunMetrics::trace`]. Default: `false`.
    pub trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { eof: true, trace: false }
    }
}

/// Result from [`parse_text_with`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Value names in template order.
    pub header: Vec<String>,
    /// Records after post-processing hooks.
    pub records: Vec<Record>,
    /// Total elapsed time spent parsing + post-processing.
    pub elapsed: Duration,
}

/// Result from [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub header: Vec<String>,
    pub records: Vec<Record>,
    pub elapsed: Duration,
    /// Counters, timings and (with [`Options::trace`]) the per-line trace.
    pub metrics: RunMetrics,
}

/// Compile `template` and parse `text` with default [`Options`] and no hooks.
///
/// # Example
/// ```
/// let template = "Value NAME (\\w+)\n\nStart\n  ^User: ${NAME} -> Record\n";
/// let records = linefsm::parse_text(template, "User: alice\nUser: bob\n").unwrap();
/// assert_eq!(records.len(), 2);
/// ```
pub fn parse_text(template: &str, text: &str) -> Result<Vec<Record>, Error> {
    let template = Template::compile(template)?;
    Ok(Parser::new(&template).run_text(text)?)
}

/// Parse `text` with an already compiled `template`, then apply `emitter`.
pub fn parse_text_with(
    template: &Template,
    text: &str,
    options: &Options,
    emitter: &Emitter,
) -> Result<ParseResult, ParseError> {
    let verbose = parse_verbose_with(template, text, options, emitter)?;
    Ok(ParseResult { header: verbose.header, records: verbose.records, elapsed: verbose.elapsed })
}

/// Like [`parse_text_with`], but also returns the run metrics.
pub fn parse_verbose_with(
    template: &Template,
    text: &str,
    options: &Options,
    emitter: &Emitter,
) -> Result<ParseResultVerbose, ParseError> {
    let started = Instant::now();
    let run = Parser::new(template).run_with_metrics(text, options)?;
    let records = emitter.emit(run.records);

    Ok(ParseResultVerbose {
        header: template.header().into_iter().map(str::to_string).collect(),
        records,
        elapsed: started.elapsed(),
        metrics: run.metrics,
    })
}
