//! Local executor for workflow graphs.
//!
//! Tasks are grouped into waves: a task runs once every task producing one of
//! its inputs has finished. Tasks of a wave run concurrently, bounded by the
//! configured limit. The first failing task aborts the run after its wave.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wikiflow_core::corpora::Corpora;
//! use wikiflow_core::counters::Counters;
//! use wikiflow_core::dumps::DownloadWorkflow;
//! use wikiflow_core::executor::LocalExecutor;
//! use wikiflow_core::task::TaskRegistry;
//! use wikiflow_core::workflow::Workflow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let corpora = Corpora::default();
//! let mut wf = Workflow::new("dumps");
//! DownloadWorkflow::new(&mut wf, &corpora).download_wikipedia(None, None, Some("da"));
//!
//! let registry = TaskRegistry::with_builtin_tasks()?;
//! let executor = LocalExecutor::new(registry, Arc::new(Counters::new()), 4)?;
//! let report = executor.run(&wf).await?;
//! println!("{} tasks, {:?}", report.completed, report.counters);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::counters::Counters;
use crate::task::{CounterSink, TaskContext, TaskError, TaskRegistry};
use crate::workflow::{Resource, TaskId, TaskNode, Workflow};

/// Default number of tasks run at the same time.
pub const DEFAULT_TASK_CONCURRENCY: usize = 4;

/// Errors from planning or running a workflow.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Concurrency limit of zero.
    #[error("invalid concurrency value {value}: must be at least 1")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A task node names a type missing from the registry.
    #[error("unknown task type `{task_type}` for task {task}")]
    UnknownTaskType {
        /// Qualified task name.
        task: String,
        /// The unregistered type.
        task_type: String,
    },

    /// Tasks depend on each other's outputs in a cycle.
    #[error("dependency cycle between tasks: {}", .tasks.join(", "))]
    Cycle {
        /// Tasks that could not be scheduled.
        tasks: Vec<String>,
    },

    /// A task failed.
    #[error("task {task} failed: {source}")]
    Task {
        /// Qualified task name.
        task: String,
        /// Why it failed.
        #[source]
        source: TaskError,
    },
}

/// [`TaskContext`] for one node of a workflow.
pub struct NodeContext<'a> {
    workflow: &'a Workflow,
    node: &'a TaskNode,
    counters: &'a dyn CounterSink,
}

impl<'a> NodeContext<'a> {
    #[must_use]
    pub fn new(workflow: &'a Workflow, task: TaskId, counters: &'a dyn CounterSink) -> Self {
        Self {
            workflow,
            node: workflow.get_task(task),
            counters,
        }
    }
}

impl TaskContext for NodeContext<'_> {
    fn node(&self) -> &TaskNode {
        self.node
    }

    fn output(&self, port: &str) -> Option<&Resource> {
        self.node
            .output(port)
            .map(|id| self.workflow.get_resource(id))
    }

    fn input(&self, port: &str) -> Option<&Resource> {
        self.node
            .input(port)
            .map(|id| self.workflow.get_resource(id))
    }

    fn counters(&self) -> &dyn CounterSink {
        self.counters
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Number of tasks that ran.
    pub completed: usize,
    /// Counter values after the run.
    pub counters: BTreeMap<String, u64>,
}

/// Runs workflows in-process against a [`TaskRegistry`].
#[derive(Debug)]
pub struct LocalExecutor {
    registry: TaskRegistry,
    counters: Arc<Counters>,
    concurrency: usize,
}

impl LocalExecutor {
    /// Creates an executor.
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::InvalidConcurrency` if `concurrency` is zero.
    pub fn new(
        registry: TaskRegistry,
        counters: Arc<Counters>,
        concurrency: usize,
    ) -> Result<Self, ExecutorError> {
        if concurrency == 0 {
            return Err(ExecutorError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            registry,
            counters,
            concurrency,
        })
    }

    /// Counters shared by every run of this executor.
    #[must_use]
    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// Checks task types and orders the tasks into dependency waves.
    ///
    /// # Errors
    ///
    /// `UnknownTaskType` for unregistered types, `Cycle` if some tasks can
    /// never become ready.
    pub fn plan(&self, wf: &Workflow) -> Result<Vec<Vec<TaskId>>, ExecutorError> {
        for task in wf.tasks() {
            if !self.registry.contains(task.task_type()) {
                return Err(ExecutorError::UnknownTaskType {
                    task: task.name().to_string(),
                    task_type: task.task_type().to_string(),
                });
            }
        }

        let mut pending: BTreeMap<TaskId, BTreeSet<TaskId>> = wf
            .tasks()
            .iter()
            .map(|task| {
                let deps = task
                    .inputs()
                    .flat_map(|(_, resource)| wf.producers_of(resource))
                    .map(TaskNode::id)
                    .filter(|dep| *dep != task.id())
                    .collect();
                (task.id(), deps)
            })
            .collect();

        let mut waves = Vec::new();
        while !pending.is_empty() {
            let ready: Vec<TaskId> = pending
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(id, _)| *id)
                .collect();
            if ready.is_empty() {
                return Err(ExecutorError::Cycle {
                    tasks: pending
                        .keys()
                        .map(|id| wf.get_task(*id).name().to_string())
                        .collect(),
                });
            }
            for id in &ready {
                pending.remove(id);
            }
            for deps in pending.values_mut() {
                for id in &ready {
                    deps.remove(id);
                }
            }
            waves.push(ready);
        }
        Ok(waves)
    }

    /// Runs every task of the workflow.
    ///
    /// # Errors
    ///
    /// Planning errors from [`plan`](Self::plan), or `ExecutorError::Task`
    /// for the first task that failed.
    #[instrument(skip(self, wf), fields(workflow = wf.name()))]
    pub async fn run(&self, wf: &Workflow) -> Result<RunReport, ExecutorError> {
        let waves = self.plan(wf)?;
        let mut completed = 0;

        for (index, wave) in waves.into_iter().enumerate() {
            info!(wave = index, tasks = wave.len(), "starting wave");
            let results: Vec<(TaskId, Result<(), TaskError>)> = stream::iter(wave)
                .map(|id| self.run_task(wf, id))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            let mut first_failure = None;
            for (id, result) in results {
                match result {
                    Ok(()) => completed += 1,
                    Err(source) => {
                        let task = wf.get_task(id).name().to_string();
                        error!(%task, error = %source, "task failed");
                        if first_failure.is_none() {
                            first_failure = Some(ExecutorError::Task { task, source });
                        }
                    }
                }
            }
            if let Some(failure) = first_failure {
                return Err(failure);
            }
        }

        let report = RunReport {
            completed,
            counters: self.counters.snapshot(),
        };
        info!(completed = report.completed, "workflow complete");
        Ok(report)
    }

    async fn run_task(&self, wf: &Workflow, id: TaskId) -> (TaskId, Result<(), TaskError>) {
        let node = wf.get_task(id);
        let Some(task) = self.registry.get(node.task_type()) else {
            // plan() rejected unknown types already.
            return (
                id,
                Err(TaskError::configuration(
                    node.name(),
                    format!("unknown task type `{}`", node.task_type()),
                )),
            );
        };
        let ctx = NodeContext::new(wf, id, self.counters.as_ref());
        (id, task.run(&ctx).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::task::Task;

    /// Records the order tasks ran in and counts one unit per run.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Task for Recorder {
        fn type_name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, ctx: &dyn TaskContext) -> Result<(), TaskError> {
            self.log.lock().unwrap().push(ctx.node().name().to_string());
            ctx.increment("runs", 1);
            if self.fail {
                return Err(TaskError::configuration(ctx.node().name(), "told to fail"));
            }
            Ok(())
        }
    }

    fn executor(log: &Arc<Mutex<Vec<String>>>) -> LocalExecutor {
        let mut registry = TaskRegistry::new();
        for (name, fail) in [("produce", false), ("consume", false), ("broken", true)] {
            registry.register(Arc::new(Recorder {
                name,
                log: Arc::clone(log),
                fail,
            }));
        }
        LocalExecutor::new(registry, Arc::new(Counters::new()), 2).unwrap()
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = LocalExecutor::new(TaskRegistry::new(), Arc::new(Counters::new()), 0);
        assert!(matches!(result, Err(ExecutorError::InvalidConcurrency { value: 0 })));
    }

    #[test]
    fn test_plan_orders_consumers_after_producers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut wf = Workflow::new("test");
        let file = wf.resource("file", "text");
        let consumer = wf.task("consume").attach_input("input", file).id();
        let producer = wf.task("produce").attach_output("output", file).id();

        let waves = executor(&log).plan(&wf).unwrap();
        assert_eq!(waves, vec![vec![producer], vec![consumer]]);
    }

    #[test]
    fn test_plan_rejects_unknown_task_type() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut wf = Workflow::new("test");
        wf.namespace("ns").task("mystery");
        let err = executor(&log).plan(&wf).unwrap_err();
        assert!(matches!(
            &err,
            ExecutorError::UnknownTaskType { task, task_type }
                if task == "ns/mystery" && task_type == "mystery"
        ));
    }

    #[test]
    fn test_plan_detects_cycle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut wf = Workflow::new("test");
        let a = wf.resource("a", "text");
        let b = wf.resource("b", "text");
        wf.task("produce").attach_input("in", a).attach_output("out", b);
        wf.task("consume").attach_input("in", b).attach_output("out", a);
        let err = executor(&log).plan(&wf).unwrap_err();
        assert!(matches!(err, ExecutorError::Cycle { ref tasks } if tasks.len() == 2));
    }

    #[tokio::test]
    async fn test_run_executes_all_tasks_in_dependency_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut wf = Workflow::new("test");
        let file = wf.resource("file", "text");
        wf.task("consume").attach_input("input", file);
        wf.task("produce").attach_output("output", file);

        let executor = executor(&log);
        let report = executor.run(&wf).await.unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(report.counters.get("runs"), Some(&2));
        assert_eq!(*log.lock().unwrap(), vec!["produce", "consume"]);
    }

    #[tokio::test]
    async fn test_run_stops_after_failing_wave() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut wf = Workflow::new("test");
        let file = wf.resource("file", "text");
        wf.task("broken").attach_output("output", file);
        wf.task("consume").attach_input("input", file);

        let executor = executor(&log);
        let err = executor.run(&wf).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Task { ref task, .. } if task == "broken"));
        assert_eq!(*log.lock().unwrap(), vec!["broken"]);
        // Increments made before the failure are kept.
        assert_eq!(executor.counters().get("runs"), 1);
    }
}
