//! Resources: named, typed artifacts produced and consumed by task nodes.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Handle to a [`Resource`] owned by a [`Workflow`](super::Workflow).
///
/// Two handles compare equal exactly when they refer to the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    /// Position of the resource in declaration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Format tag of a resource, e.g. `xml/wikipage`.
///
/// The part before the first `/` is the file format, the remainder (if any)
/// is the record type stored in the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Format {
    file: String,
    record: Option<String>,
}

impl Format {
    /// Parses a format tag. Never fails; a tag without `/` has no record type.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.split_once('/') {
            Some((file, record)) => Self {
                file: file.to_string(),
                record: Some(record.to_string()).filter(|r| !r.is_empty()),
            },
            None => Self {
                file: tag.to_string(),
                record: None,
            },
        }
    }

    /// File format, e.g. `xml`.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Record type, e.g. `wikipage`.
    #[must_use]
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => write!(f, "{}/{record}", self.file),
            None => f.write_str(&self.file),
        }
    }
}

impl Serialize for Format {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A logical artifact in the workflow graph, usually a file.
///
/// `name` is the path-like name given at declaration and doubles as the file
/// path; `qualified_name` adds the namespace prefix active at that time and
/// is what makes the resource unique in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    qualified_name: String,
    name: String,
    format: Format,
}

impl Resource {
    pub(crate) fn new(qualified_name: String, name: &str, format: &str) -> Self {
        Self {
            qualified_name,
            name: name.to_string(),
            format: Format::parse(format),
        }
    }

    /// Name including the namespace path.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File path this resource refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        Path::new(&self.name)
    }

    #[must_use]
    pub fn format(&self) -> &Format {
        &self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_splits_file_and_record() {
        let format = Format::parse("xml/wikipage");
        assert_eq!(format.file(), "xml");
        assert_eq!(format.record(), Some("wikipage"));
        assert_eq!(format.to_string(), "xml/wikipage");
    }

    #[test]
    fn test_format_parse_without_record() {
        let format = Format::parse("text");
        assert_eq!(format.file(), "text");
        assert_eq!(format.record(), None);
        assert_eq!(format.to_string(), "text");
    }

    #[test]
    fn test_resource_path_uses_plain_name() {
        let resource = Resource::new(
            "en-download/data/enwiki.xml".to_string(),
            "data/enwiki.xml",
            "xml/wikipage",
        );
        assert_eq!(resource.path(), Path::new("data/enwiki.xml"));
        assert_eq!(resource.qualified_name(), "en-download/data/enwiki.xml");
    }
}
