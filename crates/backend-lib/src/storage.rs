// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with in-memory and flat-file implementations.
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use taskboard_common::{TaskMutation, TaskRecord};
use tokio::fs as tokio_fs;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::AppError;
use crate::validation::validate_task_id;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 7;
const MAX_ID_ATTEMPTS: usize = 16;

/// Trait for task storage backends
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// All tasks, oldest first
    async fn list_all(&self) -> Result<Vec<TaskRecord>, AppError>;

    /// A task by id, `None` when absent
    async fn get_by_id(&self, id: &str) -> Result<Option<TaskRecord>, AppError>;

    /// Store a new task. Generates the id when the mutation has none.
    async fn create(&self, values: TaskMutation) -> Result<TaskRecord, AppError>;

    /// Merge the provided fields into an existing task
    async fn update(&self, id: &str, values: TaskMutation) -> Result<TaskRecord, AppError>;

    /// Remove a task. Removing an absent task is not an error.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// Random 7-character base-36 id
pub fn generate_task_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Current time as ISO-8601 UTC with milliseconds
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn sort_by_creation(tasks: &mut [TaskRecord]) {
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Build the backend selected in the settings
pub fn from_settings(settings: &StorageSettings) -> anyhow::Result<Arc<dyn TaskStorage>> {
    Ok(match settings.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File => Arc::new(FlatFileStorage::new(&settings.path)?),
    })
}

/// Process-local storage. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tasks: Arc<DashMap<String, TaskRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStorage for MemoryStorage {
    async fn list_all(&self) -> Result<Vec<TaskRecord>, AppError> {
        let mut tasks: Vec<TaskRecord> = self
            .tasks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_by_creation(&mut tasks);
        Ok(tasks)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TaskRecord>, AppError> {
        Ok(self.tasks.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, mut values: TaskMutation) -> Result<TaskRecord, AppError> {
        let explicit = values.id.take();
        let created_at = timestamp_now();

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = explicit.clone().unwrap_or_else(generate_task_id);
            match self.tasks.entry(id.clone()) {
                Entry::Occupied(_) if explicit.is_some() => {
                    return Err(AppError::TaskExists(id));
                },
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let task = TaskRecord::from_mutation(id, created_at, values);
                    slot.insert(task.clone());
                    return Ok(task);
                },
            }
        }
        Err(AppError::Internal("could not allocate a task id".to_string()))
    }

    async fn update(&self, id: &str, values: TaskMutation) -> Result<TaskRecord, AppError> {
        let mut task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;
        task.apply(values);
        Ok(task.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.tasks.remove(id);
        Ok(())
    }
}

/// Flat-file implementation: one JSON document per task under `<root>/tasks/`
#[derive(Debug, Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("tasks"))?;
        Ok(Self { root })
    }

    fn task_path(&self, id: &str) -> Result<PathBuf, AppError> {
        validate_task_id(id)?;
        Ok(self.root.join("tasks").join(format!("{id}.json")))
    }

    async fn read_task(path: &Path) -> Result<Option<TaskRecord>, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Unique sibling of `path` for staging a write. Listing ignores it.
    fn staging_path(path: &Path) -> PathBuf {
        path.with_extension(format!("{}.tmp", generate_task_id()))
    }

    /// Write `task` to a fresh staging file. The file is removed again if
    /// the write fails.
    async fn stage(path: &Path, task: &TaskRecord) -> Result<PathBuf, AppError> {
        let json = serde_json::to_string_pretty(task)?;
        let tmp = Self::staging_path(path);
        if let Err(e) = tokio_fs::write(&tmp, json).await {
            let _ = tokio_fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(tmp)
    }

    /// Replace the task at `path` with a fully written copy
    async fn write_task(path: &Path, task: &TaskRecord) -> Result<(), AppError> {
        let tmp = Self::stage(path, task).await?;
        if let Err(e) = tokio_fs::rename(&tmp, path).await {
            let _ = tokio_fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStorage for FlatFileStorage {
    async fn list_all(&self) -> Result<Vec<TaskRecord>, AppError> {
        let mut tasks = Vec::new();
        let mut entries = tokio_fs::read_dir(self.root.join("tasks")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_task(&path).await {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {},
                Err(AppError::Json(e)) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable task record"
                    );
                },
                Err(e) => return Err(e),
            }
        }
        sort_by_creation(&mut tasks);
        Ok(tasks)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TaskRecord>, AppError> {
        let path = self.task_path(id)?;
        Self::read_task(&path).await
    }

    async fn create(&self, mut values: TaskMutation) -> Result<TaskRecord, AppError> {
        let explicit = values.id.take();
        let created_at = timestamp_now();

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = explicit.clone().unwrap_or_else(generate_task_id);
            let path = self.task_path(&id)?;

            let task = TaskRecord::from_mutation(id.clone(), created_at.clone(), values.clone());
            let tmp = Self::stage(&path, &task).await?;

            // hard_link claims the id atomically, with the content already in place
            let claimed = tokio_fs::hard_link(&tmp, &path).await;
            let _ = tokio_fs::remove_file(&tmp).await;
            match claimed {
                Ok(()) => return Ok(task),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if explicit.is_some() {
                        return Err(AppError::TaskExists(id));
                    }
                    continue;
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Internal("could not allocate a task id".to_string()))
    }

    async fn update(&self, id: &str, values: TaskMutation) -> Result<TaskRecord, AppError> {
        let path = self.task_path(id)?;
        let mut task = Self::read_task(&path)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;
        task.apply(values);
        Self::write_task(&path, &task).await?;
        Ok(task)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let path = self.task_path(id)?;
        match tokio_fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
