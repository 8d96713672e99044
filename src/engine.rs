//! State machine engine.
//!
//! This module is the runtime side of the crate: it takes a compiled
//! [`Template`](crate::Template) and walks input lines through it.
//!
//! ## How the parts work together
//!
//! ```text
//! Template (shared, read-only)
//!      │
//!      │  Parser::new(&template)                     (parser.rs)
//!      v
//! input lines ──> Run { state, ValueTable, records }
//!                   - per line: rules of the current state, first match wins
//!                   - named groups -> ValueTable::assign  (values.rs)
//!                   - actions: Record / Clear / ClearAll / Next / Continue / Error
//!                   - end of input: implicit Record (EOF policy)
//!                          │
//!                          v
//!                   RunResult { records, RunMetrics }  (metrics.rs)
//!                          │
//!                          v
//!                   Emitter::emit: caller hooks      (emitter.rs)
//!                          │
//!                          v
//!                      Vec<Record>
//! ```
//!
//! ## Responsibilities by module
//!
//! - `parser.rs`: the run loop. Holds the per-run context (current state,
//!   value table, emitted records) in a private `Run` struct so that one
//!   template can drive any number of independent runs.
//! - `values.rs`: the value table and its Filldown / List / Required / Fillup
//!   semantics.
//! - `emitter.rs`: post-processing hooks applied after a run.
//! - `metrics.rs`: timing, counters and an optional per-line trace.
//!
//! ## Debugging
//!
//! The engine logs through the `log` facade. With the bundled binary,
//! `RUST_LOG=linefsm=debug` shows transitions and commits and
//! `RUST_LOG=linefsm=trace` shows every rule match.

#[path = "engine/emitter.rs"]
mod emitter;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;
#[path = "engine/values.rs"]
mod values;

pub use emitter::{Emitter, Hook, split_field, split_list};
pub use metrics::{LineTrace, RunMetrics, RunResult};
pub use parser::Parser;
