//! Rule line parsing: pattern substitution and action annotations.
//!
//! ```text
//!   ^${NAME}:${UID} -> Next.Record Other
//!   └──── match ──┘    └─ line op ┘└ state
//!                           .record op
//! ```
//!
//! Accepted action forms (after `->`):
//!
//! - `LineOp[.RecordOp] [NewState]`, `LineOp` ∈ `Next`, `Continue`
//! - `RecordOp [NewState]`, `RecordOp` ∈ `Record`, `NoRecord`, `Clear`, `Clearall`
//! - `NewState`
//! - `Error[.RecordOp] ["message" | word]`
//!
//! Actions are stored in execution order: record op first, then the line op.

use super::ValueDef;
use crate::error::TemplateError;
use regex::Regex;
use std::collections::HashMap;

/// One step executed when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Keep evaluating the remaining rules of the state against the same line.
    Continue,
    /// Advance to the next input line, optionally switching state.
    Next(Option<String>),
    /// Commit the value table as a record.
    Record,
    /// Explicitly do nothing to the value table.
    NoRecord,
    /// Reset every value except `Filldown` ones.
    Clear,
    /// Reset every value, `Filldown` included.
    ClearAll,
    /// Abort the run, with an optional message.
    Error(Option<String>),
}

/// A line-matching pattern with its ordered actions, scoped to one state.
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: String,
    regex: Regex,
    actions: Vec<Action>,
    values: Vec<String>,
    line: usize,
}

impl Rule {
    /// The match pattern as written in the template (before substitution).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The pattern after `${NAME}` substitution.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Template line the rule was declared on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// True when the rule re-evaluates the same line instead of advancing.
    pub fn is_continue(&self) -> bool {
        self.actions.contains(&Action::Continue)
    }

    /// Target of the rule's `Next` action, if it changes state.
    pub fn next_state(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            Action::Next(Some(state)) => Some(state.as_str()),
            _ => None,
        })
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Names of the values this rule can assign, in pattern order.
    pub(crate) fn value_names(&self) -> &[String] {
        &self.values
    }

    pub(crate) fn parse(
        line: &str,
        line_no: usize,
        values: &[ValueDef],
        value_index: &HashMap<String, usize>,
    ) -> Result<Rule, TemplateError> {
        let line = line.trim();
        let (source, action) = match regex!(r"^(?P<match>.*)(?:\s->(?P<action>.*))$").captures(line) {
            Some(caps) => (caps.name("match").map_or("", |m| m.as_str()), caps.name("action").map(|m| m.as_str())),
            None => (line, None),
        };

        let expanded = expand(source, line_no, values, value_index)?;
        // Every alternation branch must match at the start of the line.
        let regex = Regex::new(&format!("^(?:{expanded})"))
            .map_err(|err| TemplateError::new(line_no, format!("Invalid regular expression '{expanded}': {err}")))?;

        // Substituted values plus any value-named group written by hand.
        let assigned = regex
            .capture_names()
            .flatten()
            .filter(|name| value_index.contains_key(*name))
            .map(str::to_string)
            .collect();

        let actions = match action {
            Some(action) => parse_actions(action, line, line_no)?,
            None => vec![Action::Next(None)],
        };

        Ok(Rule { source: source.to_string(), pattern: expanded, regex, actions, values: assigned, line: line_no })
    }
}

/// Replace `$NAME` / `${NAME}` with the value's named group and `$$` with `$`.
///
/// A `$` that does not start a placeholder (end of pattern, `$)`, ...) is kept
/// as the end-of-line anchor.
fn expand(
    source: &str,
    line_no: usize,
    values: &[ValueDef],
    value_index: &HashMap<String, usize>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    let substitute = |name: &str, out: &mut String| -> Result<(), TemplateError> {
        let idx = value_index.get(name).copied().ok_or_else(|| {
            TemplateError::new(line_no, format!("Invalid variable substitution '{name}' in '{source}'"))
        })?;
        out.push_str(&values[idx].capture_group());
        Ok(())
    };

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(braced) = after.strip_prefix('{') {
            let end = braced
                .find('}')
                .ok_or_else(|| TemplateError::new(line_no, format!("Unterminated '${{' in '{source}'")))?;
            substitute(&braced[..end], &mut out)?;
            rest = &braced[end + 1..];
        } else {
            let ident = regex!(r"^[A-Za-z_][A-Za-z0-9_]*").find(after).map_or(0, |m| m.end());
            if ident == 0 {
                out.push('$');
            } else {
                substitute(&after[..ident], &mut out)?;
            }
            rest = &after[ident..];
        }
    }
    out.push_str(rest);

    Ok(out)
}

fn parse_actions(action: &str, line: &str, line_no: usize) -> Result<Vec<Action>, TemplateError> {
    let caps = regex!(
        r#"^\s+(?P<ln_op>Continue|Next|Error)(?:\.(?P<rec_op>Clear|Clearall|Record|NoRecord))?(?:\s+(?P<new_state>\w+|".*"))?$"#
    )
    .captures(action)
    .or_else(|| {
        regex!(r#"^\s+(?P<rec_op>Clear|Clearall|Record|NoRecord)(?:\s+(?P<new_state>\w+|".*"))?$"#).captures(action)
    })
    .or_else(|| regex!(r#"^(?:\s+(?P<new_state>\w+|".*"))?$"#).captures(action))
    .ok_or_else(|| TemplateError::new(line_no, format!("Badly formatted rule '{line}'")))?;

    let line_op = caps.name("ln_op").map_or("Next", |m| m.as_str());
    let record_op = caps.name("rec_op").map(|m| m.as_str());
    let new_state = caps.name("new_state").map(|m| m.as_str());

    if line_op == "Continue" {
        if let Some(state) = new_state {
            return Err(TemplateError::new(
                line_no,
                format!("Action 'Continue' with new state {state} specified"),
            ));
        }
    }
    if line_op != "Error" && new_state.is_some_and(|s| s.starts_with('"')) {
        return Err(TemplateError::new(line_no, "Alphanumeric characters only in state names"));
    }

    let mut actions = Vec::with_capacity(2);
    match record_op {
        Some("Record") => actions.push(Action::Record),
        Some("NoRecord") => actions.push(Action::NoRecord),
        Some("Clear") => actions.push(Action::Clear),
        Some("Clearall") => actions.push(Action::ClearAll),
        _ => {}
    }
    actions.push(match line_op {
        "Continue" => Action::Continue,
        "Error" => Action::Error(new_state.map(|s| s.trim_matches('"').to_string())),
        _ => Action::Next(new_state.map(str::to_string)),
    });

    Ok(actions)
}
