//! Field metadata tables.
//!
//! Every operation publishes its fields as a [`FieldTable`]. Each field is
//! tagged at declaration time; the script materializer and the job factory
//! both consult the same tags:
//!
//! - `init`: settable at construction, so it can be passed back as a keyword
//!   argument when the operation is rebuilt from a script.
//! - `exempt`: meant for the pipeline only (dependency lists, workspace,
//!   namespace). Never a constructor keyword, never copied onto a job.
//! - `internal`: keyword-only bookkeeping such as the submission field bag.

use serde_json::Value;

/// Tags attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    pub init: bool,
    pub exempt: bool,
    pub internal: bool,
}

impl FieldMeta {
    /// A plain constructor field.
    pub const INIT: FieldMeta = FieldMeta {
        init: true,
        exempt: false,
        internal: false,
    };

    /// A constructor field reserved for the pipeline.
    pub const INIT_EXEMPT: FieldMeta = FieldMeta {
        init: true,
        exempt: true,
        internal: false,
    };

    /// State assigned during construction, not passed in.
    pub const DERIVED_EXEMPT: FieldMeta = FieldMeta {
        init: false,
        exempt: true,
        internal: false,
    };

    /// Keyword-only internal bookkeeping.
    pub const INTERNAL: FieldMeta = FieldMeta {
        init: false,
        exempt: true,
        internal: true,
    };

    /// Whether the materializer passes this field as a constructor keyword.
    pub fn is_constructor_kwarg(&self) -> bool {
        self.init && !self.exempt && !self.internal
    }
}

/// A named field value with its tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    pub meta: FieldMeta,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>, meta: FieldMeta) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            meta,
        }
    }

    /// Shorthand for a plain constructor field.
    pub fn init(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, value, FieldMeta::INIT)
    }
}

/// Ordered list of fields. Order is declaration order and is preserved in
/// generated scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTable {
    fields: Vec<Field>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A later field with the same name replaces the earlier
    /// value in place, the way a subclass redeclares a base field.
    pub fn push(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields passed as keyword arguments when rebuilding the operation.
    pub fn constructor_kwargs(&self) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .filter(|f| f.meta.is_constructor_kwarg())
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

impl Extend<Field> for FieldTable {
    fn extend<I: IntoIterator<Item = Field>>(&mut self, iter: I) {
        for field in iter {
            self.push(field);
        }
    }
}

impl FromIterator<Field> for FieldTable {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut table = FieldTable::new();
        table.extend(iter);
        table
    }
}
