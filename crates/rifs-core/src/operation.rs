//! The [`Operation`] trait: a unit of work a caller wants run on the farm.
//!
//! An operation carries identity, notes, dependencies on other operations,
//! and an exclusively owned workspace. It is either materializable (the
//! pipeline renders a script that rebuilds and calls it) or a direct command
//! (it supplies its own command line and needs no script).

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::field::{Field, FieldMeta, FieldTable};
use crate::ids::OperationId;
use crate::workspace::Workspace;

/// How an operation is executed on the farm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// Rebuilt from a materialized script by the configured interpreter.
    Script,
    /// Run as this exact command line; no script is materialized.
    Command(Vec<String>),
}

/// State shared by every operation.
#[derive(Debug)]
pub struct OperationCore {
    id: OperationId,
    /// User-facing label. Not guaranteed unique.
    pub name: String,
    pub note: String,
    /// Operations that must be submitted before this one.
    pub depend_on: Vec<OperationId>,
    /// Fully qualified origin used to rebuild the operation in a script.
    /// Falls back to [`Operation::module`] when unset.
    pub namespace: Option<String>,
    /// Extra data that flows into the job untouched (e.g. output paths).
    pub submission_fields: BTreeMap<String, Value>,
    workspace: Workspace,
}

impl OperationCore {
    pub fn new(name: impl Into<String>, workspace: Workspace) -> Self {
        Self {
            id: OperationId::new(),
            name: name.into(),
            note: String::new(),
            depend_on: Vec::new(),
            namespace: None,
            submission_fields: BTreeMap::new(),
            workspace,
        }
    }

    /// Builder: set the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Builder: set an explicit namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Builder: set the dependencies.
    pub fn with_depend_on(mut self, depend_on: impl IntoIterator<Item = OperationId>) -> Self {
        self.depend_on = depend_on.into_iter().collect();
        self
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Remove the workspace. The pipeline never does this on its own.
    pub fn teardown(&self) -> Result<()> {
        self.workspace.teardown()
    }

    /// The field table entries every operation shares, in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::init("name", self.name.as_str()),
            Field::init("note", self.note.as_str()),
            Field::new(
                "depend_on",
                Value::Array(
                    self.depend_on
                        .iter()
                        .map(|id| Value::String(id.to_string()))
                        .collect(),
                ),
                FieldMeta::INIT_EXEMPT,
            ),
            Field::new(
                "namespace",
                self.namespace.clone().map_or(Value::Null, Value::String),
                FieldMeta::INIT_EXEMPT,
            ),
            Field::new(
                "workspace",
                self.workspace.path().display().to_string(),
                FieldMeta::DERIVED_EXEMPT,
            ),
            Field::new(
                "submission_fields",
                Value::Object(
                    self.submission_fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
                FieldMeta::INTERNAL,
            ),
        ]
    }
}

/// A unit of work.
///
/// Implementors hold an [`OperationCore`] and describe their own fields.
pub trait Operation: fmt::Debug {
    fn core(&self) -> &OperationCore;

    fn core_mut(&mut self) -> &mut OperationCore;

    /// Concrete type name, used in the script import and the artifact name.
    fn type_name(&self) -> String;

    /// Module that defines the type, used when no namespace is set.
    fn module(&self) -> String;

    /// Fields declared by the concrete type, appended after the core fields.
    fn declared_fields(&self) -> Vec<Field> {
        Vec::new()
    }

    fn execution(&self) -> Execution {
        Execution::Script
    }

    fn id(&self) -> OperationId {
        self.core().id()
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn namespace(&self) -> String {
        self.core()
            .namespace
            .clone()
            .unwrap_or_else(|| self.module())
    }

    fn is_materializable(&self) -> bool {
        matches!(self.execution(), Execution::Script)
    }

    /// Full field table: core fields followed by declared fields.
    fn fields(&self) -> FieldTable {
        let mut table: FieldTable = self.core().fields().into_iter().collect();
        table.extend(self.declared_fields());
        table
    }
}

/// A materializable operation described by data: a class reference plus its
/// constructor fields. This is how batches reference operation classes that
/// live in the farm's script environment.
#[derive(Debug)]
pub struct ScriptOperation {
    core: OperationCore,
    module: String,
    class_name: String,
    fields: Vec<Field>,
}

impl ScriptOperation {
    pub fn new(core: OperationCore, module: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            core,
            module: module.into(),
            class_name: class_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: declare a constructor field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field::init(name, value));
        self
    }

    /// Builder: declare a field with explicit tags.
    pub fn with_tagged_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

impl Operation for ScriptOperation {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        self.class_name.clone()
    }

    fn module(&self) -> String {
        self.module.clone()
    }

    fn declared_fields(&self) -> Vec<Field> {
        self.fields.clone()
    }
}

/// A direct-command operation: runs `command` verbatim.
#[derive(Debug)]
pub struct CommandOperation {
    core: OperationCore,
    command: Vec<String>,
}

impl CommandOperation {
    pub fn new(core: OperationCore, command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            core,
            command: command.into_iter().map(Into::into).collect(),
        }
    }
}

impl Operation for CommandOperation {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        "CommandOperation".into()
    }

    fn module(&self) -> String {
        module_path!().replace("::", ".")
    }

    fn declared_fields(&self) -> Vec<Field> {
        vec![Field::new(
            "command",
            Value::Array(self.command.iter().cloned().map(Value::String).collect()),
            FieldMeta::DERIVED_EXEMPT,
        )]
    }

    fn execution(&self) -> Execution {
        Execution::Command(self.command.clone())
    }
}
