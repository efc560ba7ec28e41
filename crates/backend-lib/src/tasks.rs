// ============================
// crates/backend-lib/src/tasks.rs
// ============================
//! Task operations used by route handlers.
use std::sync::Arc;
use std::time::Duration;
use taskboard_common::{TaskMutation, TaskRecord};

use crate::error::AppError;
use crate::search::filter_tasks;
use crate::storage::TaskStorage;
use crate::validation::{validate_mutation, validate_task_id};

/// Thin layer over a [`TaskStorage`] adding validation, search and logging
#[derive(Clone)]
pub struct TaskService {
    storage: Arc<dyn TaskStorage>,
    list_delay: Duration,
}

impl TaskService {
    pub fn new(storage: Arc<dyn TaskStorage>, list_delay: Duration) -> Self {
        Self {
            storage,
            list_delay,
        }
    }

    pub fn storage(&self) -> &Arc<dyn TaskStorage> {
        &self.storage
    }

    /// All tasks oldest first, or those matching `query` best first
    pub async fn get_tasks(&self, query: Option<&str>) -> Result<Vec<TaskRecord>, AppError> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        let tasks = self.storage.list_all().await?;
        Ok(match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => filter_tasks(tasks, q),
            None => tasks,
        })
    }

    pub async fn create_empty_task(&self) -> Result<TaskRecord, AppError> {
        self.create_task(TaskMutation::default()).await
    }

    pub async fn create_task(&self, values: TaskMutation) -> Result<TaskRecord, AppError> {
        validate_mutation(&values)?;
        let task = self.storage.create(values).await?;
        tracing::info!(task_id = %task.id, "task created");
        ::metrics::counter!(crate::metrics::TASK_CREATED).increment(1);
        Ok(task)
    }

    /// A task by id, not-found error when absent
    pub async fn get_task(&self, id: &str) -> Result<TaskRecord, AppError> {
        validate_task_id(id).map_err(|_| AppError::TaskNotFound(id.to_string()))?;
        self.storage
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
    }

    /// Merge `values` into the task. Concurrent updates: last writer wins.
    pub async fn update_task(&self, id: &str, values: TaskMutation) -> Result<TaskRecord, AppError> {
        validate_task_id(id).map_err(|_| AppError::TaskNotFound(id.to_string()))?;
        validate_mutation(&values)?;
        let task = self.storage.update(id, values).await?;
        tracing::info!(task_id = %id, "task updated");
        ::metrics::counter!(crate::metrics::TASK_UPDATED).increment(1);
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        validate_task_id(id).map_err(|_| AppError::TaskNotFound(id.to_string()))?;
        self.storage.delete(id).await?;
        tracing::info!(task_id = %id, "task deleted");
        ::metrics::counter!(crate::metrics::TASK_DELETED).increment(1);
        Ok(())
    }

    /// Insert the sample tasks when the store is empty
    pub async fn seed_sample_tasks(&self) -> Result<(), AppError> {
        if !self.storage.list_all().await?.is_empty() {
            return Ok(());
        }
        for (id, name) in [("1", "Shruti"), ("2", "alex-anderson")] {
            self.storage
                .create(TaskMutation {
                    id: Some(id.to_string()),
                    name: Some(name.to_string()),
                    ..Default::default()
                })
                .await?;
        }
        tracing::debug!("seeded sample tasks");
        Ok(())
    }
}
