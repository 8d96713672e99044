//! `Value` line parsing.
//!
//! ```text
//! Value [Option[,Option...]] NAME (pattern)
//! ```
//!
//! Options are detected the same way a reader would: if the token after
//! `Value` is followed by a token that does not open a pattern, it is an
//! option list.

use super::MAX_NAME_LEN;
use crate::error::TemplateError;

bitflags::bitflags! {
    /// Per-value behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ValueOptions: u8 {
        /// Keep the value across `Clear` and `Record` until reassigned.
        const FILLDOWN = 1 << 0;
        /// Marks the value as part of the record identity (metadata only).
        const KEY      = 1 << 1;
        /// Drop the record when this value is empty at commit time.
        const REQUIRED = 1 << 2;
        /// Accumulate every match into an ordered list.
        const LIST     = 1 << 3;
        /// On assignment, back-fill earlier records that lack this value.
        const FILLUP   = 1 << 4;
    }
}

impl ValueOptions {
    fn from_keyword(name: &str) -> Option<ValueOptions> {
        match name {
            "Filldown" => Some(ValueOptions::FILLDOWN),
            "Key" => Some(ValueOptions::KEY),
            "Required" => Some(ValueOptions::REQUIRED),
            "List" => Some(ValueOptions::LIST),
            "Fillup" => Some(ValueOptions::FILLUP),
            _ => None,
        }
    }
}

/// A named capture slot declared by a `Value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDef {
    name: String,
    options: ValueOptions,
    /// Pattern as written, including the enclosing parentheses.
    pattern: String,
}

impl ValueDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> ValueOptions {
        self.options
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_list(&self) -> bool {
        self.options.contains(ValueOptions::LIST)
    }

    /// The pattern as a named group, ready to splice into a rule:
    /// `(\d+)` for `UID` becomes `(?P<UID>\d+)`.
    pub(crate) fn capture_group(&self) -> String {
        format!("(?P<{}>{}", self.name, &self.pattern[1..])
    }

    pub(crate) fn parse(line: &str, line_no: usize) -> Result<ValueDef, TemplateError> {
        let rest = line.strip_prefix("Value").unwrap_or(line).trim_start();
        let (first, after_first) = split_token(rest);
        let (second, after_second) = split_token(after_first);

        if first.is_empty() || second.is_empty() {
            return Err(TemplateError::new(line_no, "Expect at least 3 tokens on line"));
        }

        let (options, name, pattern) = if second.starts_with('(') {
            (ValueOptions::empty(), first, after_first)
        } else if after_second.is_empty() {
            return Err(TemplateError::new(line_no, format!("Value '{second}' must be contained within a '()' pair")));
        } else {
            (parse_options(first, line_no)?, second, after_second)
        };

        if !regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(name) || name.len() > MAX_NAME_LEN {
            return Err(TemplateError::new(line_no, format!("Invalid Value name '{name}'")));
        }

        if !is_enclosed(pattern) {
            return Err(TemplateError::new(line_no, format!("Value '{pattern}' must be contained within a '()' pair")));
        }

        regex::Regex::new(pattern).map_err(|err| {
            TemplateError::new(line_no, format!("Invalid regular expression for Value '{name}': {err}"))
        })?;

        Ok(ValueDef { name: name.to_string(), options, pattern: pattern.to_string() })
    }
}

/// Split off the first whitespace-delimited token; the remainder keeps its
/// inner spacing.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

fn parse_options(list: &str, line_no: usize) -> Result<ValueOptions, TemplateError> {
    let mut options = ValueOptions::empty();
    for name in list.split(',') {
        let option = ValueOptions::from_keyword(name)
            .ok_or_else(|| TemplateError::new(line_no, format!("Unknown option '{name}'")))?;
        if options.contains(option) {
            return Err(TemplateError::new(line_no, format!("Duplicate option '{name}'")));
        }
        options |= option;
    }
    if options.contains(ValueOptions::FILLDOWN | ValueOptions::FILLUP) {
        return Err(TemplateError::new(line_no, "Options 'Filldown' and 'Fillup' are mutually exclusive"));
    }
    Ok(options)
}

/// True when the first `(` of `pattern` is closed by its last character.
///
/// Escaped parentheses and parentheses inside character classes don't count.
fn is_enclosed(pattern: &str) -> bool {
    if !pattern.starts_with('(') || !pattern.ends_with(')') {
        return false;
    }

    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_class = false;
    let last = pattern.len() - 1;

    for (idx, ch) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 && idx != last {
                    return false;
                }
            }
            _ => {}
        }
    }

    depth == 0
}
