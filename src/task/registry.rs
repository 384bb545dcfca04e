//! Explicit task registry populated at process start.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{Task, UrlDownload};

/// Maps task type names to implementations.
///
/// Built once during initialization and handed to the executor; there is no
/// global registration.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<dyn Task>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in tasks (`url-download`).
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn with_builtin_tasks() -> Result<Self, reqwest::Error> {
        let mut registry = Self::new();
        registry.register(Arc::new(UrlDownload::new()?));
        Ok(registry)
    }

    /// Registers a task under its [`Task::type_name`], replacing any
    /// previous implementation of that type.
    #[tracing::instrument(skip(self, task), fields(task_type))]
    pub fn register(&mut self, task: Arc<dyn Task>) {
        tracing::Span::current().record("task_type", task.type_name());
        debug!("registering task type");
        self.tasks.insert(task.type_name().to_string(), task);
    }

    /// Looks up the implementation of a task type.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(type_name).cloned()
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.tasks.contains_key(type_name)
    }

    /// Registered type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.type_names().collect();
        f.debug_struct("TaskRegistry")
            .field("task_count", &self.tasks.len())
            .field("tasks", &names)
            .finish()
    }
}
