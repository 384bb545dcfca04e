//! Declarative workflow graph builder.
//!
//! A [`Workflow`] collects named [`Resource`]s and [`TaskNode`]s. Nothing is
//! executed while the graph is built; the finished graph is handed to an
//! executor (see [`crate::executor`]) or serialized as JSON.
//!
//! # Namespaces
//!
//! Names declared while a namespace is active are prefixed with the
//! namespace path, so the same sub-graph pattern can be declared once per
//! language without collisions. [`Workflow::namespace`] returns a guard that
//! restores the previous prefix when dropped, on every exit path.
//!
//! # Example
//!
//! ```
//! use wikiflow_core::workflow::Workflow;
//!
//! let mut wf = Workflow::new("dumps");
//! let dump = wf.resource("data/enwiki.xml.bz2", "xml/wikipage");
//! {
//!     let mut ns = wf.namespace("en-wikipedia-download");
//!     ns.task("url-download")
//!         .add_params([("url", "https://example.com/enwiki.xml.bz2"), ("shortname", "enwiki")])
//!         .attach_output("output", dump);
//! }
//! assert_eq!(wf.tasks()[0].name(), "en-wikipedia-download/url-download");
//! ```

mod node;
mod resource;

pub use node::{ParamValue, Params, TaskId, TaskNode};
pub use resource::{Format, Resource, ResourceId};

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use serde::Serialize;
use tracing::{debug, trace};

/// Separator between namespace components and names.
pub const NAMESPACE_SEPARATOR: &str = "/";

/// A static graph of resources and task nodes.
#[derive(Debug, Default, Serialize)]
pub struct Workflow {
    name: String,
    resources: Vec<Resource>,
    tasks: Vec<TaskNode>,
    #[serde(skip)]
    resource_index: HashMap<String, ResourceId>,
    #[serde(skip)]
    task_index: HashMap<String, TaskId>,
    #[serde(skip)]
    namespaces: Vec<String>,
}

impl Workflow {
    /// Creates an empty workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The active namespace path, `""` at the top level.
    #[must_use]
    pub fn current_namespace(&self) -> String {
        self.namespaces.join(NAMESPACE_SEPARATOR)
    }

    /// Qualifies `name` with the active namespace path.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        if self.namespaces.is_empty() {
            name.to_string()
        } else {
            format!("{}{NAMESPACE_SEPARATOR}{name}", self.current_namespace())
        }
    }

    /// Looks up or creates a resource in the active namespace.
    ///
    /// Declaring the same name twice in the same namespace returns the same
    /// handle; the format of the first declaration is kept.
    pub fn resource(&mut self, name: &str, format: &str) -> ResourceId {
        let qualified = self.qualify(name);
        if let Some(id) = self.resource_index.get(&qualified) {
            trace!(resource = %qualified, "resource already declared");
            return *id;
        }

        let id = ResourceId(self.resources.len());
        debug!(resource = %qualified, format, "declaring resource");
        self.resources.push(Resource::new(qualified.clone(), name, format));
        self.resource_index.insert(qualified, id);
        id
    }

    /// Creates a task node of `task_type` in the active namespace.
    ///
    /// The node is named after its type. A second node with the same name in
    /// the same namespace gets a numeric suffix (`url-download.1`).
    pub fn task(&mut self, task_type: &str) -> &mut TaskNode {
        self.task_named(task_type, task_type)
    }

    /// Creates a task node with an explicit name in the active namespace.
    pub fn task_named(&mut self, task_type: &str, name: &str) -> &mut TaskNode {
        let base = self.qualify(name);
        let mut qualified = base.clone();
        let mut suffix = 0_usize;
        while self.task_index.contains_key(&qualified) {
            suffix += 1;
            qualified = format!("{base}.{suffix}");
        }

        let id = TaskId(self.tasks.len());
        debug!(task = %qualified, task_type, "declaring task");
        self.task_index.insert(qualified.clone(), id);
        self.tasks.push(TaskNode::new(id, qualified, task_type));
        &mut self.tasks[id.0]
    }

    /// Enters a namespace until the returned guard is dropped.
    ///
    /// The guard dereferences to the workflow, so declarations go through it:
    ///
    /// ```
    /// use wikiflow_core::workflow::Workflow;
    ///
    /// let mut wf = Workflow::new("wf");
    /// let inner = {
    ///     let mut ns = wf.namespace("outer");
    ///     let mut ns = ns.namespace("inner");
    ///     ns.resource("file", "text")
    /// };
    /// assert_eq!(wf.get_resource(inner).qualified_name(), "outer/inner/file");
    /// assert_eq!(wf.current_namespace(), "");
    /// ```
    pub fn namespace(&mut self, prefix: &str) -> NamespaceGuard<'_> {
        self.namespaces.push(prefix.to_string());
        trace!(namespace = %self.current_namespace(), "entered namespace");
        let depth = self.namespaces.len();
        NamespaceGuard {
            workflow: self,
            depth,
        }
    }

    /// Runs `declare` inside a namespace and returns its result.
    ///
    /// The namespace is left whether `declare` succeeds, fails, or panics.
    pub fn in_namespace<T>(&mut self, prefix: &str, declare: impl FnOnce(&mut Self) -> T) -> T {
        let mut scope = self.namespace(prefix);
        declare(&mut *scope)
    }

    /// Returns the resource behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different workflow.
    #[must_use]
    pub fn get_resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    #[must_use]
    pub fn find_resource(&self, qualified_name: &str) -> Option<ResourceId> {
        self.resource_index.get(qualified_name).copied()
    }

    /// Returns the task behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different workflow.
    #[must_use]
    pub fn get_task(&self, id: TaskId) -> &TaskNode {
        &self.tasks[id.0]
    }

    pub fn get_task_mut(&mut self, id: TaskId) -> &mut TaskNode {
        &mut self.tasks[id.0]
    }

    #[must_use]
    pub fn find_task(&self, qualified_name: &str) -> Option<TaskId> {
        self.task_index.get(qualified_name).copied()
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn tasks(&self) -> &[TaskNode] {
        &self.tasks
    }

    /// Tasks that bind `resource` to one of their output ports.
    pub fn producers_of(&self, resource: ResourceId) -> impl Iterator<Item = &TaskNode> {
        self.tasks
            .iter()
            .filter(move |task| task.outputs().any(|(_, id)| id == resource))
    }

    /// Tasks that bind `resource` to one of their input ports.
    pub fn consumers_of(&self, resource: ResourceId) -> impl Iterator<Item = &TaskNode> {
        self.tasks
            .iter()
            .filter(move |task| task.inputs().any(|(_, id)| id == resource))
    }
}

/// Scoped namespace entry returned by [`Workflow::namespace`].
///
/// Pops its prefix from the namespace stack on drop.
#[derive(Debug)]
pub struct NamespaceGuard<'a> {
    workflow: &'a mut Workflow,
    depth: usize,
}

impl Deref for NamespaceGuard<'_> {
    type Target = Workflow;

    fn deref(&self) -> &Workflow {
        self.workflow
    }
}

impl DerefMut for NamespaceGuard<'_> {
    fn deref_mut(&mut self) -> &mut Workflow {
        self.workflow
    }
}

impl Drop for NamespaceGuard<'_> {
    fn drop(&mut self) {
        // Nested guards borrow this one, so they are always dropped first.
        self.workflow.namespaces.truncate(self.depth - 1);
        trace!(namespace = %self.workflow.current_namespace(), "left namespace");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_same_name_same_namespace_is_same_identity() {
        let mut wf = Workflow::new("test");
        let a = wf.resource("data/file.txt", "text");
        let b = wf.resource("data/file.txt", "text/other");
        assert_eq!(a, b);
        assert_eq!(wf.resources().len(), 1);
        assert_eq!(wf.get_resource(a).format().to_string(), "text");
    }

    #[test]
    fn test_resource_in_different_namespaces_does_not_collide() {
        let mut wf = Workflow::new("test");
        let a = wf.namespace("a").resource("file", "text");
        let b = wf.namespace("b").resource("file", "text");
        assert_ne!(a, b);
        assert_eq!(wf.get_resource(a).qualified_name(), "a/file");
        assert_eq!(wf.get_resource(b).qualified_name(), "b/file");
        assert_eq!(wf.get_resource(a).name(), "file");
    }

    #[test]
    fn test_namespace_restored_before_inside_and_after() {
        let mut wf = Workflow::new("test");
        let before = wf.resource("before", "text");
        let inside = {
            let mut ns = wf.namespace("scope");
            ns.resource("inside", "text")
        };
        let after = wf.resource("after", "text");

        assert_eq!(wf.get_resource(before).qualified_name(), "before");
        assert_eq!(wf.get_resource(inside).qualified_name(), "scope/inside");
        assert_eq!(wf.get_resource(after).qualified_name(), "after");
    }

    #[test]
    fn test_namespace_restored_on_error_exit() {
        fn check(_: ResourceId) -> Result<(), String> {
            Err("declaration failed".to_string())
        }

        fn declare_failing(wf: &mut Workflow) -> Result<ResourceId, String> {
            let mut ns = wf.namespace("failing");
            let partial = ns.resource("partial", "text");
            check(partial)?;
            Ok(ns.resource("never", "text"))
        }

        let mut wf = Workflow::new("test");
        assert!(declare_failing(&mut wf).is_err());
        assert_eq!(wf.current_namespace(), "");
        let after = wf.resource("after", "text");
        assert_eq!(wf.get_resource(after).qualified_name(), "after");
        assert!(wf.find_resource("failing/partial").is_some());
    }

    #[test]
    fn test_namespace_restored_after_panic() {
        let mut wf = Workflow::new("test");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            wf.in_namespace("boom", |wf| {
                let id = wf.resource("x", "text");
                if id.index() == 0 {
                    panic!("declaration panicked");
                }
                id
            })
        }));
        assert!(result.is_err());
        assert_eq!(wf.current_namespace(), "");
    }

    #[test]
    fn test_nested_namespaces_join_with_separator() {
        let mut wf = Workflow::new("test");
        let mut outer = wf.namespace("outer");
        {
            let mut inner = outer.namespace("inner");
            assert_eq!(inner.current_namespace(), "outer/inner");
            let task = inner.task("url-download");
            assert_eq!(task.name(), "outer/inner/url-download");
        }
        assert_eq!(outer.current_namespace(), "outer");
        drop(outer);
        assert_eq!(wf.current_namespace(), "");
    }

    #[test]
    fn test_task_names_unique_within_namespace() {
        let mut wf = Workflow::new("test");
        let first = wf.task("url-download").id();
        let second = wf.task("url-download").id();
        assert_eq!(wf.get_task(first).name(), "url-download");
        assert_eq!(wf.get_task(second).name(), "url-download.1");
        assert_eq!(wf.find_task("url-download.1"), Some(second));
    }

    #[test]
    fn test_attach_records_produce_and_consume_edges() {
        let mut wf = Workflow::new("test");
        let dump = wf.resource("dump.xml", "xml/wikipage");
        let download = wf.task("url-download").attach_output("output", dump).id();
        let parse = wf.task("parse").attach_input("input", dump).id();

        let producers: Vec<TaskId> = wf.producers_of(dump).map(TaskNode::id).collect();
        let consumers: Vec<TaskId> = wf.consumers_of(dump).map(TaskNode::id).collect();
        assert_eq!(producers, vec![download]);
        assert_eq!(consumers, vec![parse]);
    }

    #[test]
    fn test_workflow_serializes_graph_description() {
        let mut wf = Workflow::new("test");
        let dump = wf.resource("dump.xml", "xml/wikipage");
        wf.namespace("en")
            .task("url-download")
            .add_params([("url", "http://x")])
            .add_param("chunksize", 1024_i64)
            .attach_output("output", dump);

        let json = serde_json::to_value(&wf).unwrap();
        assert_eq!(json["name"], "test");
        assert_eq!(json["resources"][0]["format"], "xml/wikipage");
        assert_eq!(json["tasks"][0]["name"], "en/url-download");
        assert_eq!(json["tasks"][0]["type"], "url-download");
        assert_eq!(json["tasks"][0]["params"]["chunksize"], 1024);
        assert_eq!(json["tasks"][0]["outputs"]["output"], 0);
    }
}
