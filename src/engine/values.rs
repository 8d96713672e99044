//! Per-run value table.
//!
//! One slot per declared value, indexed like the template header. Scalar slots
//! start unset; List slots start as an empty list.
//!
//! | option   | assign            | clear(false) | clear(true) | commit                 |
//! |----------|-------------------|--------------|-------------|------------------------|
//! | (none)   | overwrite         | reset        | reset       | copy                   |
//! | List     | append            | reset        | reset       | copy the whole list    |
//! | Filldown | overwrite         | keep         | reset       | copy                   |
//! | Required | overwrite         | reset        | reset       | empty -> drop record   |
//!
//! Fillup needs the already emitted records, so it is handled by the run
//! loop in `parser.rs`.

use crate::template::{Template, ValueOptions};
use crate::{FieldValue, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Scalar(Option<String>),
    List(Vec<String>),
}

impl Slot {
    fn is_empty(&self) -> bool {
        match self {
            Slot::Scalar(value) => value.as_deref().is_none_or(str::is_empty),
            Slot::List(items) => items.is_empty(),
        }
    }

    fn to_field(&self) -> FieldValue {
        match self {
            Slot::Scalar(value) => FieldValue::Text(value.clone().unwrap_or_default()),
            Slot::List(items) => FieldValue::List(items.clone()),
        }
    }
}

/// Outcome of [`ValueTable::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Commit {
    /// A record to emit.
    Record(Record),
    /// A `Required` value was empty; the record is dropped.
    Suppressed { value: String },
    /// Every field was empty; nothing worth emitting.
    Empty,
}

#[derive(Debug, Clone)]
pub(crate) struct ValueTable<'t> {
    template: &'t Template,
    slots: Vec<Slot>,
}

impl<'t> ValueTable<'t> {
    pub(crate) fn new(template: &'t Template) -> Self {
        let slots = template.values().iter().map(|def| Self::empty_slot(def.is_list())).collect();
        ValueTable { template, slots }
    }

    fn empty_slot(list: bool) -> Slot {
        if list { Slot::List(Vec::new()) } else { Slot::Scalar(None) }
    }

    /// Store `text` into the value `name`. List values append.
    ///
    /// Returns `false` when `name` is not a declared value (for example a
    /// named group nested inside a value pattern).
    pub(crate) fn assign(&mut self, name: &str, text: &str) -> bool {
        let Some(idx) = self.template.value_index(name) else {
            return false;
        };
        match &mut self.slots[idx] {
            Slot::Scalar(value) => *value = Some(text.to_string()),
            Slot::List(items) => items.push(text.to_string()),
        }
        true
    }

    /// Snapshot the table, applying Required suppression and the empty-record
    /// rule. The table itself is left untouched.
    pub(crate) fn commit(&self) -> Commit {
        for (def, slot) in self.template.values().iter().zip(&self.slots) {
            if def.options().contains(ValueOptions::REQUIRED) && slot.is_empty() {
                return Commit::Suppressed { value: def.name().to_string() };
            }
        }

        if self.slots.iter().all(Slot::is_empty) {
            return Commit::Empty;
        }

        let record =
            self.template.values().iter().zip(&self.slots).map(|(def, slot)| (def.name(), slot.to_field())).collect();
        Commit::Record(record)
    }

    /// Reset values. `Filldown` values survive unless `include_filldown`.
    pub(crate) fn clear(&mut self, include_filldown: bool) {
        for (def, slot) in self.template.values().iter().zip(self.slots.iter_mut()) {
            if include_filldown || !def.options().contains(ValueOptions::FILLDOWN) {
                *slot = Self::empty_slot(def.is_list());
            }
        }
    }
}
