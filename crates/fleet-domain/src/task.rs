use serde::{Deserialize, Serialize};

/// Terminal/non-terminal state of a single task or of a whole store process
/// iteration. Tasks start `InProgress` and settle into one of the two
/// terminal states; no further `step()` calls happen after that until the
/// owning store process is re-created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    InProgress,
    Success,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Error)
    }
}

/// The kind of failure a task step encountered. Kinds, not types: every
/// variant maps to one propagation policy (see fleet_domain::task docs on
/// the worker side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    TransientExternal,
    MalformedExternal,
    BusinessFinal,
    DatabaseTransient,
    DatabaseLogic,
}

/// A structured failure raised by a task step. `task_name` names the task
/// that raised it, for the `{level, service, store_id, source, message,
/// metadata}` log record shape.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?} in {task_name}: {message}")]
pub struct TaskError {
    pub kind: TaskErrorKind,
    pub task_name: &'static str,
    pub message: String,
}

impl TaskError {
    pub fn new(kind: TaskErrorKind, task_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            task_name,
            message: message.into(),
        }
    }
}
