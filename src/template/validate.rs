//! Whole-template checks run after the scan.

use super::{END_STATE, EOF_STATE, START_STATE, Template};
use crate::error::TemplateError;
use std::collections::HashSet;

pub(super) fn validate(template: &Template) -> Result<(), TemplateError> {
    if !template.has_state(START_STATE) {
        return Err(TemplateError::new(0, format!("Missing state '{START_STATE}'")));
    }

    for reserved in [END_STATE, EOF_STATE] {
        if let Some(rule) = template.rules(reserved).first() {
            return Err(TemplateError::new(rule.line(), format!("Non-Empty '{reserved}' state")));
        }
    }

    for state in template.states() {
        for rule in &state.rules {
            let Some(target) = rule.next_state() else {
                continue;
            };
            if target != END_STATE && target != EOF_STATE && !template.has_state(target) {
                return Err(TemplateError::new(
                    rule.line(),
                    format!("State '{target}' not found, referenced in state '{}'", state.name),
                ));
            }
        }
    }

    for name in unreachable_states(template) {
        log::warn!("state '{name}' is never entered from '{START_STATE}'");
    }

    Ok(())
}

/// Declared states with no transition path from `Start`.
///
/// Reserved states are exempt: `End`/`EOF` are markers, not rule blocks.
pub(super) fn unreachable_states(template: &Template) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::from([START_STATE]);
    let mut stack: Vec<&str> = vec![START_STATE];

    while let Some(state) = stack.pop() {
        for target in template.rules(state).iter().filter_map(|r| r.next_state()) {
            if seen.insert(target) {
                stack.push(target);
            }
        }
    }

    template
        .state_names()
        .into_iter()
        .filter(|name| *name != END_STATE && *name != EOF_STATE && !seen.contains(name))
        .collect()
}
