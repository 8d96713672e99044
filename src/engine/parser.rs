//! The state machine run loop.
//!
//! A [`Parser`] is a thin handle over a shared [`Template`]. Every call to
//! one of its `run*` methods creates a fresh `Run`, the only mutable state in
//! the engine:
//!
//! ```text
//! Run {
//!     state:   &str          current state, starts at "Start"
//!     values:  ValueTable    capture slots for this run
//!     records: Vec<Record>   committed so far (Fillup may still edit them)
//!     metrics: RunMetrics
//! }
//! ```
//!
//! ## Per-line step
//!
//! ```text
//! for rule in rules(state):            first match wins
//!     no match        -> try next rule
//!     match           -> assign named groups
//!                     -> record op (Record / Clear / ClearAll / NoRecord)
//!                     -> line op:
//!                          Continue   -> try next rule, same line
//!                          Next(s)    -> state = s, next line
//!                          Error(msg) -> abort with ParseError
//! no rule matched     -> line skipped silently
//! ```
//!
//! `Record` clears non-Filldown values afterwards unless the rule continues
//! on the same line. Entering `End` or `EOF` stops reading input.
//!
//! ## End of input
//!
//! When input runs out in a state other than `Start` or `End`, and the
//! template does not declare an `EOF` state, one implicit `Record` is
//! committed. `Options::eof = false` turns this off.

use super::metrics::{LineTrace, RunMetrics, RunResult};
use super::values::{Commit, ValueTable};
use crate::template::{Action, END_STATE, EOF_STATE, START_STATE, Template, ValueOptions};
use crate::{FieldValue, Options, ParseError, Record};
use std::time::Instant;

/// Runs a compiled [`Template`] against input text.
///
/// Usage: create with `Parser::new(&template)` then call `run_text(text)`,
/// `run(lines)` or `run_with_metrics(text, options)`. A `Parser` holds no
/// per-run state, so it can be reused and copied freely.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'t> {
    template: &'t Template,
}

impl<'t> Parser<'t> {
    pub fn new(template: &'t Template) -> Self {
        Parser { template }
    }

    pub fn template(&self) -> &'t Template {
        self.template
    }

    /// Parse already split `lines` with default [`Options`].
    pub fn run<'a, I>(&self, lines: I) -> Result<Vec<Record>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Ok(self.run_lines_with_metrics(lines, &Options::default())?.records)
    }

    /// Parse `text` (split on `\n` / `\r\n`) with default [`Options`].
    pub fn run_text(&self, text: &str) -> Result<Vec<Record>, ParseError> {
        self.run(text.lines())
    }

    /// Parse `text` and return records together with run metrics.
    pub fn run_with_metrics(&self, text: &str, options: &Options) -> Result<RunResult, ParseError> {
        self.run_lines_with_metrics(text.lines(), options)
    }

    pub fn run_lines_with_metrics<'a, I>(&self, lines: I, options: &Options) -> Result<RunResult, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let started = Instant::now();
        let mut run = Run::new(self.template, options.trace);

        for (idx, line) in lines.into_iter().enumerate() {
            run.metrics.lines += 1;
            if run.check_line(idx + 1, line)? == Flow::Stop {
                break;
            }
        }

        Ok(run.finish(options, started))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Advance,
    Stop,
}

/// Per-run context: the only mutable state of a parse.
struct Run<'t> {
    template: &'t Template,
    state: &'t str,
    values: ValueTable<'t>,
    records: Vec<Record>,
    metrics: RunMetrics,
    trace: bool,
}

impl<'t> Run<'t> {
    fn new(template: &'t Template, trace: bool) -> Self {
        let state = template.state_name(START_STATE).unwrap_or(START_STATE);
        Run {
            template,
            state,
            values: ValueTable::new(template),
            records: Vec::new(),
            metrics: RunMetrics::default(),
            trace,
        }
    }

    /// Evaluate `line` in the current state.
    fn check_line(&mut self, line_no: usize, line: &str) -> Result<Flow, ParseError> {
        let template = self.template;
        let state = self.state;
        let mut matched_rules: Vec<usize> = Vec::new();
        let mut flow = Flow::Advance;

        for rule in template.rules(state) {
            self.metrics.rules_evaluated += 1;
            let Some(caps) = rule.regex().captures(line) else {
                continue;
            };
            matched_rules.push(rule.line());
            log::trace!("line {line_no} in '{state}' matched rule at template line {}", rule.line());

            for name in rule.value_names() {
                if let Some(m) = caps.name(name) {
                    self.assign(name, m.as_str());
                }
            }

            let continues = rule.is_continue();
            let mut next: Option<&'t str> = None;

            for action in rule.actions() {
                match action {
                    Action::Record => {
                        self.append_record();
                        if !continues {
                            self.values.clear(false);
                        }
                    }
                    Action::NoRecord | Action::Continue => {}
                    Action::Clear => self.values.clear(false),
                    Action::ClearAll => self.values.clear(true),
                    Action::Next(target) => next = target.as_deref(),
                    Action::Error(message) => {
                        log::debug!("error action at input line {line_no} in '{state}'");
                        return Err(ParseError {
                            line: line_no,
                            state: state.to_string(),
                            message: message.clone(),
                            text: line.to_string(),
                        });
                    }
                }
            }

            if continues {
                continue;
            }
            if let Some(target) = next {
                flow = self.transition(target);
            }
            break;
        }

        if !matched_rules.is_empty() {
            self.metrics.matched_lines += 1;
        }
        if self.trace {
            self.metrics.trace.push(LineTrace {
                line: line_no,
                state: state.to_string(),
                rules: matched_rules,
                transition: (self.state != state).then(|| self.state.to_string()),
            });
        }

        Ok(flow)
    }

    fn transition(&mut self, target: &'t str) -> Flow {
        if target != self.state {
            log::debug!("state '{}' -> '{target}'", self.state);
        }
        self.state = target;
        if target == END_STATE || target == EOF_STATE { Flow::Stop } else { Flow::Advance }
    }

    /// Assign one captured group, then back-fill earlier records for Fillup
    /// values.
    fn assign(&mut self, name: &str, text: &str) {
        if !self.values.assign(name, text) || text.is_empty() {
            return;
        }
        let Some(def) = self.template.value(name) else {
            return;
        };
        if !def.options().contains(ValueOptions::FILLUP) {
            return;
        }

        for record in self.records.iter_mut().rev() {
            let Some(field) = record.get_mut(name) else {
                break;
            };
            if !field.is_empty() {
                break;
            }
            *field = if def.is_list() {
                FieldValue::List(vec![text.to_string()])
            } else {
                FieldValue::Text(text.to_string())
            };
        }
    }

    fn append_record(&mut self) {
        match self.values.commit() {
            Commit::Record(record) => {
                log::debug!("record #{} committed in '{}'", self.records.len() + 1, self.state);
                self.records.push(record);
                self.metrics.records += 1;
            }
            Commit::Suppressed { value } => {
                log::debug!("record dropped: required value '{value}' is empty");
                self.metrics.suppressed += 1;
            }
            Commit::Empty => {}
        }
    }

    fn finish(mut self, options: &Options, started: Instant) -> RunResult {
        let implicit = self.state != START_STATE && self.state != END_STATE && !self.template.has_state(EOF_STATE);
        if options.eof && implicit {
            log::debug!("end of input in '{}': implicit record", self.state);
            self.append_record();
            self.metrics.eof_record = true;
        }

        self.metrics.final_state = self.state.to_string();
        self.metrics.total = started.elapsed();
        log::debug!(
            "run finished in '{}': {} lines, {} records, {} suppressed",
            self.state,
            self.metrics.lines,
            self.metrics.records,
            self.metrics.suppressed
        );

        RunResult { records: self.records, metrics: self.metrics }
    }
}
