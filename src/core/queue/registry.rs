//! Concurrent task registry
//!
//! The registry is the only shared mutable structure between submitters and
//! workers. Each entry carries a `watch` channel that publishes the task's
//! status after every mutation, which is what waiters block on.

use crate::domain::{ExportTask, Result, TaskId, TaskStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug)]
struct TaskEntry {
    task: ExportTask,
    status: watch::Sender<TaskStatus>,
}

/// Counts of tasks per lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Waiting in the queue
    pub pending: usize,
    /// Owned by a worker
    pub in_progress: usize,
    /// Finished with an output file
    pub completed: usize,
    /// Finished with an error
    pub failed: usize,
}

/// Tasks by id
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: DashMap<TaskId, TaskEntry>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, returning its id
    pub fn insert(&self, task: ExportTask) -> TaskId {
        let id = task.id;
        let (status, _) = watch::channel(task.status);
        self.tasks.insert(id, TaskEntry { task, status });
        id
    }

    /// Copy of the task's current state
    pub fn snapshot(&self, id: TaskId) -> Option<ExportTask> {
        self.tasks.get(&id).map(|entry| entry.task.clone())
    }

    /// Mutate a task in place and publish its status
    ///
    /// Returns `None` if the task is not registered.
    pub fn update<R>(
        &self,
        id: TaskId,
        mutate: impl FnOnce(&mut ExportTask) -> Result<R>,
    ) -> Option<Result<R>> {
        let mut entry = self.tasks.get_mut(&id)?;
        let outcome = mutate(&mut entry.task);
        let status = entry.task.status;
        entry.status.send_replace(status);
        Some(outcome)
    }

    /// Subscribe to status changes of a task
    pub fn subscribe(&self, id: TaskId) -> Option<watch::Receiver<TaskStatus>> {
        self.tasks.get(&id).map(|entry| entry.status.subscribe())
    }

    /// Whether any registered task already targets `path`
    pub fn is_destination_claimed(&self, path: &Path) -> bool {
        self.tasks
            .iter()
            .any(|entry| entry.task.destination() == path)
    }

    /// Number of tasks in each state
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.tasks.iter() {
            match entry.task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Evict terminal tasks that finished more than `retention` ago
    ///
    /// Pending and in-progress tasks are never evicted.
    pub fn purge_expired(&self, retention: Duration) -> usize {
        let now = Utc::now();
        let before = self.tasks.len();

        self.tasks.retain(|_, entry| {
            let expired = entry.task.is_terminal()
                && entry
                    .task
                    .completed_at
                    .and_then(|at| (now - at).to_std().ok())
                    .is_some_and(|age| age >= retention);
            !expired
        });

        let evicted = before.saturating_sub(self.tasks.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired export tasks");
        }
        evicted
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportFormat, ExportOptions, ExportPayload, ReportId};
    use serde_json::Map;
    use std::path::PathBuf;

    fn task(path: &str) -> ExportTask {
        ExportTask::new(
            ReportId::new(1),
            ExportFormat::Json,
            ExportOptions::new(),
            PathBuf::from(path),
            ExportPayload::Data(serde_json::json!({})),
        )
    }

    #[test]
    fn test_insert_and_snapshot() {
        let registry = TaskRegistry::new();
        let id = registry.insert(task("/tmp/a.json"));

        let snapshot = registry.snapshot(id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Pending);
        assert_eq!(registry.len(), 1);
        assert!(registry.snapshot(TaskId::generate()).is_none());
    }

    #[test]
    fn test_update_publishes_status() {
        let registry = TaskRegistry::new();
        let id = registry.insert(task("/tmp/a.json"));
        let receiver = registry.subscribe(id).unwrap();

        registry.update(id, |t| t.mark_started()).unwrap().unwrap();

        assert_eq!(*receiver.borrow(), TaskStatus::InProgress);
        assert!(registry
            .update(TaskId::generate(), |t| t.mark_started())
            .is_none());
    }

    #[test]
    fn test_failed_update_keeps_state() {
        let registry = TaskRegistry::new();
        let id = registry.insert(task("/tmp/a.json"));

        let outcome = registry.update(id, |t| t.mark_failed("nope")).unwrap();
        assert!(outcome.is_err());
        assert_eq!(registry.snapshot(id).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_counts() {
        let registry = TaskRegistry::new();
        registry.insert(task("/tmp/a.json"));
        let running = registry.insert(task("/tmp/b.json"));
        let done = registry.insert(task("/tmp/c.json"));

        registry.update(running, |t| t.mark_started()).unwrap().unwrap();
        registry
            .update(done, |t| {
                t.mark_started()?;
                t.mark_completed(PathBuf::from("/tmp/c.json"), Some(2), Map::new())
            })
            .unwrap()
            .unwrap();

        assert_eq!(
            registry.counts(),
            StatusCounts {
                pending: 1,
                in_progress: 1,
                completed: 1,
                failed: 0,
            }
        );
    }

    #[test]
    fn test_purge_only_evicts_terminal_tasks() {
        let registry = TaskRegistry::new();
        let pending = registry.insert(task("/tmp/a.json"));
        let failed = registry.insert(task("/tmp/b.json"));
        registry
            .update(failed, |t| {
                t.mark_started()?;
                t.mark_failed("boom")
            })
            .unwrap()
            .unwrap();

        assert_eq!(registry.purge_expired(Duration::from_secs(3600)), 0);
        assert_eq!(registry.purge_expired(Duration::ZERO), 1);
        assert!(registry.snapshot(failed).is_none());
        assert!(registry.snapshot(pending).is_some());
    }

    #[test]
    fn test_destination_claims() {
        let registry = TaskRegistry::new();
        registry.insert(task("/tmp/report_1.json"));
        assert!(registry.is_destination_claimed(Path::new("/tmp/report_1.json")));
        assert!(!registry.is_destination_claimed(Path::new("/tmp/report_2.json")));
    }
}
