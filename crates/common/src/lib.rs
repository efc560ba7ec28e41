// ================
// common/src/lib.rs
// ================
//! Common types shared between the task board server and its JSON clients.
//! A task record is the unit the CRUD surface manages; a mutation carries
//! only the fields a caller wants to set.

use serde::{Deserialize, Serialize};

/// Identifier of a task record
pub type TaskId = String;

/// Partial set of task fields. Absent fields are left untouched on update.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMutation {
    /// Explicit identifier, only honoured on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Completion flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl TaskMutation {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.notes.is_none() && self.done.is_none()
    }
}

/// A stored task
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// ISO-8601 UTC timestamp
    pub created_at: String,
}

impl TaskRecord {
    /// Build a record from a mutation, using the given id and creation stamp
    pub fn from_mutation(id: TaskId, created_at: String, values: TaskMutation) -> Self {
        Self {
            id,
            name: values.name,
            notes: values.notes,
            done: values.done.unwrap_or(false),
            created_at,
        }
    }

    /// Merge the provided fields into this record. The id never changes.
    pub fn apply(&mut self, values: TaskMutation) {
        if let Some(name) = values.name {
            self.name = Some(name);
        }
        if let Some(notes) = values.notes {
            self.notes = Some(notes);
        }
        if let Some(done) = values.done {
            self.done = done;
        }
    }

    /// Name with surrounding whitespace removed, `None` when blank
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
