//! Engine run metrics.
//!
//! The intended usage is:
//!
//! - `Parser::run` / `Parser::run_text` for normal operation.
//! - `Parser::run_with_metrics` for profiling, template debugging and
//!   inspecting which rule handled which line.
//!
//! Counters are always collected (they are plain integer bumps). The per-line
//! trace allocates, so it is only filled when `Options::trace` is set.

use crate::Record;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunMetrics {
    /// Total elapsed time for the run, including the end-of-input pass.
    pub total: Duration,
    /// Input lines consumed. Lines after a transition to `End` are not counted.
    pub lines: usize,
    /// Lines matched by at least one rule.
    pub matched_lines: usize,
    /// Rule patterns evaluated across all lines.
    pub rules_evaluated: usize,
    /// Records committed (before caller hooks).
    pub records: usize,
    /// Records dropped because a `Required` value was empty.
    pub suppressed: usize,
    /// State the run finished in.
    pub final_state: String,
    /// Whether the implicit end-of-input record pass ran.
    pub eof_record: bool,
    /// Per-line trace, only filled when tracing is enabled.
    pub trace: Vec<LineTrace>,
}

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTrace {
    /// 1-based input line.
    pub line: usize,
    /// State the line was evaluated in.
    pub state: String,
    /// Template lines of the rules that matched, in order (more than one only
    /// with `Continue`).
    pub rules: Vec<usize>,
    /// State after the line was processed, when it changed.
    pub transition: Option<String>,
}

/// Parser output bundled with run metrics.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Records in emission order.
    pub records: Vec<Record>,
    pub metrics: RunMetrics,
}
