//! Internal shop tasks

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Progress of a task
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "pending")]
    Todo,
    #[serde(alias = "in-progress", alias = "inProgress")]
    InProgress,
    #[serde(alias = "completed")]
    Done,
    #[serde(other)]
    Other,
}

/// A to-do item assigned to staff
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub priority: Option<String>,
    pub assigned_to: Option<EntityId>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<EntityId>,
    pub priority: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed: u64,
    pub overdue: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Task collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Tasks;

impl Resource for Tasks {
    type Entity = Task;
    type Draft = TaskDraft;
    type Patch = TaskPatch;
    type Filter = TaskFilter;
    type Stats = TaskStats;

    const DOMAIN: &'static str = "tasks";
    const PATH: &'static str = "tasks";
    const COLLECTION_KEY: &'static str = "tasks";
    const LABEL: &'static str = "Task";

    fn validate_draft(draft: &TaskDraft) -> Result<(), String> {
        require(&draft.title, "Title")
    }
}

entity!(Task);
