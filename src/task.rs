//! Queued prompting tasks: the unit an external scheduler orders and runs.
//!
//! The interactive scheduler itself (listing, deleting, auto-completing
//! tasks) is an external collaborator; this module provides the data
//! model it queues, ordered by due date, serializable so queues can be
//! persisted through the [`KvStore`](crate::KvStore) contract.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generator::GeneratorRegistry;
use crate::runner::FixedSteps;

/// A queued prompt with a due date, a generator category, and the name of
/// the model backend that should answer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// The prompt text to run.
    pub prompt: String,
    /// When the task is due; the scheduler completes earliest-due first.
    pub due_date: DateTime<Utc>,
    /// Generator category naming the step sequence to use.
    pub category: String,
    /// Name of the model backend to run against.
    pub backend: String,
}

impl Task {
    /// Create a task.
    pub fn new(
        prompt: impl Into<String>,
        due_date: DateTime<Utc>,
        category: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            due_date,
            category: category.into(),
            backend: backend.into(),
        }
    }

    /// Build this task's step sequence from the registry, if its category
    /// is registered.
    pub fn steps(&self, registry: &GeneratorRegistry) -> Option<FixedSteps> {
        registry.create(&self.category)
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_date
            .cmp(&other.due_date)
            .then_with(|| self.prompt.cmp(&other.prompt))
            .then_with(|| self.category.cmp(&other.category))
            .then_with(|| self.backend.cmp(&other.backend))
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task({}, {}, {}, {})",
            self.prompt, self.due_date, self.category, self.backend
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn tasks_order_by_due_date() {
        let mut tasks = vec![
            Task::new("later", at(12), "basic", "local"),
            Task::new("earlier", at(8), "basic", "local"),
            Task::new("middle", at(10), "code", "local"),
        ];
        tasks.sort();
        let prompts: Vec<&str> = tasks.iter().map(|t| t.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["earlier", "middle", "later"]);
    }

    #[test]
    fn task_resolves_its_step_sequence() {
        let registry = GeneratorRegistry::builtin();
        let task = Task::new("q", at(9), "basic", "local");
        assert!(task.steps(&registry).is_some());

        let task = Task::new("q", at(9), "nonexistent", "local");
        assert!(task.steps(&registry).is_none());
    }

    #[test]
    fn tasks_persist_through_a_kv_store() {
        use crate::store::{KvStore, MemoryStore};
        use std::collections::HashMap;

        let store = MemoryStore::new();
        let task = Task::new("q", at(9), "basic", "local");

        let mut queue = HashMap::new();
        queue.insert("0".to_string(), serde_json::to_string(&task).unwrap());
        store.save("tasks", &queue).unwrap();

        let loaded = store.load("tasks").unwrap();
        let back: Task = serde_json::from_str(&loaded["0"]).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn display_shows_fields_in_order() {
        let task = Task::new("q", at(9), "basic", "local");
        let rendered = task.to_string();
        assert!(rendered.starts_with("Task(q, "));
        assert!(rendered.ends_with(", basic, local)"));
    }
}
