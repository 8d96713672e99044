//! Template compilation.
//!
//! A template is compiled exactly once and is immutable afterwards. The engine
//! (`engine.rs`) borrows it for every run, so one compiled [`Template`] can be
//! shared across threads and across any number of inputs.
//!
//! ## Source layout
//!
//! ```text
//! # comment
//! Value Filldown,Required NAME (\S+)      <- value section (value_def.rs)
//! Value MEMBERS (.*)
//!                                         <- blank line ends the value section
//! Start                                   <- state header
//!   ^${NAME}:${MEMBERS} -> Record         <- rule (rule.rs)
//!   ^\s*$$ -> Next
//!                                         <- blank line ends the state
//! Other
//!   ^END -> End
//! ```
//!
//! Compilation is a single scan followed by a validation pass
//! (`validate.rs`): reserved states, dangling transitions and unreachable
//! states.
//!
//! ## Invariants
//!
//! - Value names are unique and appear in the header in declaration order.
//! - Every `Next(target)` in a compiled template names a declared state or one
//!   of the reserved [`END_STATE`] / [`EOF_STATE`].
//! - `Start` always exists.

#[path = "template/rule.rs"]
mod rule;
#[path = "template/validate.rs"]
mod validate;
#[path = "template/value_def.rs"]
mod value_def;

pub use rule::{Action, Rule};
pub use value_def::{ValueDef, ValueOptions};

use crate::error::{Error, TemplateError};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Initial state of every run.
pub const START_STATE: &str = "Start";
/// Terminal state: input processing stops and no implicit record is emitted.
pub const END_STATE: &str = "End";
/// Declaring this (empty) state disables the implicit end-of-input record.
pub const EOF_STATE: &str = "EOF";

/// Longest accepted value or state name.
pub(crate) const MAX_NAME_LEN: usize = 48;

/// One declared state and its rules, in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// A compiled template: value definitions plus per-state rule lists.
#[derive(Debug, Clone)]
pub struct Template {
    values: Vec<ValueDef>,
    value_index: HashMap<String, usize>,
    states: Vec<State>,
    state_index: HashMap<String, usize>,
}

impl Template {
    /// Compile template `source`.
    pub fn compile(source: &str) -> Result<Template, TemplateError> {
        let mut lines = source.lines().enumerate().map(|(idx, line)| (idx + 1, line.trim_end()));

        let mut values: Vec<ValueDef> = Vec::new();
        let mut value_index: HashMap<String, usize> = HashMap::new();

        // Value section: runs until the first blank line.
        for (line_no, line) in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            if is_comment(line) {
                continue;
            }
            if line.starts_with("Value ") {
                let def = ValueDef::parse(line, line_no)?;
                if value_index.contains_key(def.name()) {
                    return Err(TemplateError::new(
                        line_no,
                        format!("Duplicate declarations for Value '{}'", def.name()),
                    ));
                }
                value_index.insert(def.name().to_string(), values.len());
                values.push(def);
            } else if values.is_empty() {
                return Err(TemplateError::new(line_no, "No Value definitions found"));
            } else {
                return Err(TemplateError::new(line_no, "Expected blank line after last Value entry"));
            }
        }

        if values.is_empty() {
            return Err(TemplateError::new(0, "No Value definitions found"));
        }

        // State section: header line, indented rules, blank line.
        let mut states: Vec<State> = Vec::new();
        let mut state_index: HashMap<String, usize> = HashMap::new();
        let mut current: Option<State> = None;

        for (line_no, line) in lines {
            if is_comment(line) {
                continue;
            }
            if line.is_empty() {
                if let Some(state) = current.take() {
                    state_index.insert(state.name.clone(), states.len());
                    states.push(state);
                }
                continue;
            }

            match current.as_mut() {
                None => {
                    let name = parse_state_name(line, line_no)?;
                    if state_index.contains_key(name) {
                        return Err(TemplateError::new(line_no, format!("Duplicate state name: '{name}'")));
                    }
                    current = Some(State { name: name.to_string(), rules: Vec::new() });
                }
                Some(state) => {
                    if !is_rule_line(line) {
                        return Err(TemplateError::new(
                            line_no,
                            "Missing white space or carat ('^') before rule",
                        ));
                    }
                    let rule = Rule::parse(line, line_no, &values, &value_index)?;
                    state.rules.push(rule);
                }
            }
        }
        if let Some(state) = current.take() {
            state_index.insert(state.name.clone(), states.len());
            states.push(state);
        }

        let template = Template { values, value_index, states, state_index };
        validate::validate(&template)?;

        log::debug!(
            "compiled template: {} values, {} states ({} rules)",
            template.values.len(),
            template.states.len(),
            template.states.iter().map(|s| s.rules.len()).sum::<usize>()
        );

        Ok(template)
    }

    /// Read and compile the template stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Template, Error> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Ok(Template::compile(&source)?)
    }

    /// Value names in declaration order.
    pub fn header(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.name()).collect()
    }

    pub fn values(&self) -> &[ValueDef] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&ValueDef> {
        self.value_index(name).map(|idx| &self.values[idx])
    }

    pub(crate) fn value_index(&self, name: &str) -> Option<usize> {
        self.value_index.get(name).copied()
    }

    /// Names of all values carrying every option in `options`.
    ///
    /// `template.values_with(ValueOptions::KEY)` lists the record key columns.
    pub fn values_with(&self, options: ValueOptions) -> Vec<&str> {
        self.values.iter().filter(|v| v.options().contains(options)).map(|v| v.name()).collect()
    }

    /// Declared state names in declaration order (reserved states included
    /// when declared).
    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.state_index.contains_key(name)
    }

    /// Rules of `state`; empty for unknown or rule-less states.
    pub fn rules(&self, state: &str) -> &[Rule] {
        match self.state_index.get(state) {
            Some(&idx) => &self.states[idx].rules,
            None => &[],
        }
    }

    pub(crate) fn states(&self) -> &[State] {
        &self.states
    }

    /// Resolve `name` to the template-owned copy, so a run can hold the
    /// current state as `&'t str`.
    pub(crate) fn state_name(&self, name: &str) -> Option<&str> {
        self.state_index.get(name).map(|&idx| self.states[idx].name.as_str())
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::compile(s)
    }
}

fn is_comment(line: &str) -> bool {
    regex!(r"^\s*#").is_match(line)
}

fn is_rule_line(line: &str) -> bool {
    let body = line.trim_start_matches([' ', '\t']);
    body.len() < line.len() && body.starts_with('^')
}

fn parse_state_name(line: &str, line_no: usize) -> Result<&str, TemplateError> {
    const RESERVED_WORDS: &[&str] = &["Continue", "Next", "Error", "Clear", "Clearall", "Record", "NoRecord"];

    if !regex!(r"^\w+$").is_match(line) || line.len() > MAX_NAME_LEN || RESERVED_WORDS.contains(&line) {
        return Err(TemplateError::new(line_no, format!("Invalid state name: '{line}'")));
    }
    Ok(line)
}
