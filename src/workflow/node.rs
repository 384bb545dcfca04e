//! Task nodes: typed, parameterized descriptions of work.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::ResourceId;

/// Handle to a [`TaskNode`] owned by a [`Workflow`](super::Workflow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Position of the task in declaration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Scalar task parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Text, also used for URLs and names.
    Str(String),
    /// Signed integer, e.g. `chunksize`.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Flag.
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Parameter mapping of a task node, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Returns a string parameter; other scalar kinds are rendered as text.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.0.get(name).map(ToString::to_string)
    }

    /// Returns an integer parameter.
    ///
    /// `Ok(None)` when absent. Strings holding a decimal integer are accepted;
    /// anything else is reported back as `Err` with the offending value.
    pub fn get_int(&self, name: &str) -> Result<Option<i64>, ParamValue> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ParamValue::Int(value)) => Ok(Some(*value)),
            Some(ParamValue::Str(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ParamValue::Str(text.clone())),
            Some(other) => Err(other.clone()),
        }
    }

    /// Sets a parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// A declared unit of work. Has no behavior; an executor looks up the
/// implementation for [`task_type`](Self::task_type) in a registry.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    #[serde(skip)]
    id: TaskId,
    name: String,
    #[serde(rename = "type")]
    task_type: String,
    params: Params,
    inputs: BTreeMap<String, ResourceId>,
    outputs: BTreeMap<String, ResourceId>,
}

impl TaskNode {
    pub(crate) fn new(id: TaskId, name: String, task_type: &str) -> Self {
        Self {
            id,
            name,
            task_type: task_type.to_string(),
            params: Params::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Qualified task name, unique within the workflow.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Merges parameters into the node. Later values win for the same key.
    pub fn add_params<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        for (name, value) in params {
            self.params.insert(name, value);
        }
        self
    }

    /// Sets a single parameter.
    pub fn add_param(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> &mut Self {
        self.params.insert(name, value);
        self
    }

    /// Binds an output port to a resource this task produces.
    pub fn attach_output(&mut self, port: impl Into<String>, resource: ResourceId) -> &mut Self {
        self.outputs.insert(port.into(), resource);
        self
    }

    /// Binds an input port to a resource this task consumes.
    pub fn attach_input(&mut self, port: impl Into<String>, resource: ResourceId) -> &mut Self {
        self.inputs.insert(port.into(), resource);
        self
    }

    #[must_use]
    pub fn output(&self, port: &str) -> Option<ResourceId> {
        self.outputs.get(port).copied()
    }

    #[must_use]
    pub fn input(&self, port: &str) -> Option<ResourceId> {
        self.inputs.get(port).copied()
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, ResourceId)> {
        self.outputs.iter().map(|(port, id)| (port.as_str(), *id))
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, ResourceId)> {
        self.inputs.iter().map(|(port, id)| (port.as_str(), *id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_params_later_values_overwrite() {
        let mut node = TaskNode::new(TaskId(0), "t".to_string(), "url-download");
        node.add_params([("url", "http://a"), ("shortname", "a")]);
        node.add_params([("url", "http://b")]);
        assert_eq!(node.params().get_str("url").as_deref(), Some("http://b"));
        assert_eq!(node.params().get_str("shortname").as_deref(), Some("a"));
        assert_eq!(node.params().len(), 2);
    }

    #[test]
    fn test_get_int_accepts_decimal_strings() {
        let params: Params = [("n", "1024")].into_iter().collect();
        assert_eq!(params.get_int("n").unwrap(), Some(1024));
        assert_eq!(params.get_int("missing").unwrap(), None);
    }

    #[test]
    fn test_get_int_rejects_non_integers() {
        let mut params = Params::new();
        params.insert("a", "lots");
        params.insert("b", true);
        assert_eq!(params.get_int("a"), Err(ParamValue::Str("lots".to_string())));
        assert_eq!(params.get_int("b"), Err(ParamValue::Bool(true)));
    }

    #[test]
    fn test_attach_rebinding_port_replaces_resource() {
        let mut node = TaskNode::new(TaskId(0), "t".to_string(), "url-download");
        node.attach_output("output", super::super::ResourceId(1));
        node.attach_output("output", super::super::ResourceId(2));
        assert_eq!(node.output("output"), Some(super::super::ResourceId(2)));
        assert_eq!(node.outputs().count(), 1);
        assert_eq!(node.input("output"), None);
    }
}
