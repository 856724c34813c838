//! Field paths pointing at document nodes
//!
//! Paths render as `a.b[2].c`. Segment-wise ordering keeps `a[2]` before
//! `a[10]` when errors are sorted for display.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step from a node to its child
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node inside a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a child path for a mapping key
    pub fn child<K: AsRef<str>>(&self, key: K) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.as_ref().to_string()));
        Self { segments }
    }

    /// Create a child path for a sequence index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Name of the last mapping key on the path, if any
    pub fn field_name(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_index_rendering() {
        let path = FieldPath::root()
            .child("rclone")
            .child("remotes")
            .index(0)
            .child("settings")
            .child("template");
        assert_eq!(path.to_string(), "rclone.remotes[0].settings.template");
    }

    #[test]
    fn test_root_rendering() {
        assert_eq!(FieldPath::root().to_string(), "(root)");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn test_leading_index() {
        assert_eq!(FieldPath::root().index(3).child("name").to_string(), "[3].name");
    }

    #[test]
    fn test_numeric_ordering_of_indices() {
        let base = FieldPath::root().child("items");
        let mut paths = vec![base.index(10), base.index(2), base.child("a")];
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["items.a", "items[2]", "items[10]"]);
    }

    #[test]
    fn test_field_name() {
        let path = FieldPath::root().child("remotes").index(1);
        assert_eq!(path.field_name(), Some("remotes"));
        assert_eq!(FieldPath::root().field_name(), None);
    }
}
