//! Record post-processing.
//!
//! Hooks are caller-supplied and run after the engine has finished, in the
//! order they were registered. The engine never calls them itself.

use crate::{FieldValue, Record};

/// A post-processing step applied to every emitted record.
pub type Hook = Box<dyn Fn(&mut Record) + Send + Sync>;

/// Ordered list of [`Hook`]s applied to a finished run.
#[derive(Default)]
pub struct Emitter {
    hooks: Vec<Hook>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("hooks", &format_args!("<{} functions>", self.hooks.len())).finish()
    }
}

impl Emitter {
    /// An emitter with no hooks: records pass through unchanged.
    pub fn new() -> Self {
        Emitter { hooks: Vec::new() }
    }

    /// Builder-style [`Emitter::push`].
    pub fn with_hook(mut self, hook: impl Fn(&mut Record) + Send + Sync + 'static) -> Self {
        self.push(hook);
        self
    }

    pub fn push(&mut self, hook: impl Fn(&mut Record) + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Apply every hook to every record, preserving record order.
    pub fn emit(&self, mut records: Vec<Record>) -> Vec<Record> {
        if self.hooks.is_empty() {
            return records;
        }
        for record in &mut records {
            for hook in &self.hooks {
                hook(record);
            }
        }
        records
    }
}

/// Split `text` on `delimiter`, trim each piece and drop empty pieces.
///
/// ```
/// assert_eq!(linefsm::split_list("alice, bob,,carol ", ","), vec!["alice", "bob", "carol"]);
/// ```
pub fn split_list(text: &str, delimiter: &str) -> Vec<String> {
    text.split(delimiter).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Hook that turns field `name` into a list with [`split_list`].
///
/// Text fields are split; list fields have each element split and the
/// results flattened. Records without the field are left alone.
pub fn split_field(name: impl Into<String>, delimiter: impl Into<String>) -> Hook {
    let name = name.into();
    let delimiter = delimiter.into();
    Box::new(move |record: &mut Record| {
        let Some(field) = record.get_mut(&name) else {
            return;
        };
        let items = match field {
            FieldValue::Text(text) => split_list(text, &delimiter),
            FieldValue::List(items) => items.iter().flat_map(|item| split_list(item, &delimiter)).collect(),
        };
        *field = FieldValue::List(items);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(members: &str) -> Record {
        [("GROUP", "wheel"), ("MEMBERS", members)].into_iter().collect()
    }

    #[test]
    fn split_trims_and_drops_empties() {
        assert_eq!(split_list("alice, bob,,carol ", ","), vec!["alice", "bob", "carol"]);
        assert!(split_list("", ",").is_empty());
        assert!(split_list(" , ,", ",").is_empty());
    }

    #[test]
    fn split_field_hook_rewrites_members() {
        let emitter = Emitter::new().with_hook(split_field("MEMBERS", ","));
        let out = emitter.emit(vec![group("alice, bob,,carol "), group("")]);

        assert_eq!(out[0].get("MEMBERS"), Some(&FieldValue::from(vec!["alice", "bob", "carol"])));
        assert_eq!(out[1].get("MEMBERS"), Some(&FieldValue::List(Vec::new())));
        assert_eq!(out[0].get("GROUP"), Some(&FieldValue::from("wheel")));
    }

    #[test]
    fn split_field_flattens_lists_and_ignores_missing() {
        let mut record = Record::new();
        record.insert("HOSTS", vec!["a,b", "c"]);
        split_field("HOSTS", ",")(&mut record);
        split_field("MISSING", ",")(&mut record);

        assert_eq!(record.get("HOSTS"), Some(&FieldValue::from(vec!["a", "b", "c"])));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut emitter = Emitter::new();
        emitter.push(|r: &mut Record| {
            r.insert("STEP", "first");
        });
        emitter.push(|r: &mut Record| {
            let seen = r.get("STEP").map(ToString::to_string).unwrap_or_default();
            r.insert("STEP", format!("{seen}+second"));
        });

        let out = emitter.emit(vec![Record::new()]);
        assert_eq!(emitter.len(), 2);
        assert_eq!(out[0].get("STEP"), Some(&FieldValue::from("first+second")));
    }
}
