//! Field-name paths into a schema tree

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Location of a node within a schema tree, as the sequence of field names
/// walked from the root.
///
/// Ordering is segment-wise lexicographic, so a parent sorts before all of
/// its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// The empty path, addressing the tree root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dot-separated path (e.g. "messages.foo"). Empty input is the root.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::root();
        }
        Self(
            text.split(['.', '/'])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// The path of a field directly below this one
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form for messages, naming the root explicitly
    pub fn display_name(&self) -> String {
        if self.is_root() {
            "<root>".to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Path::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = Path::parse("messages.m.f2");
        assert_eq!(path.segments(), ["messages", "m", "f2"]);
        assert_eq!(path.to_string(), "messages.m.f2");

        assert_eq!(Path::parse("messages/m"), Path::parse("messages.m"));
        assert!(Path::parse("").is_root());
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn test_parent_sorts_before_children() {
        let mut paths = vec![
            Path::parse("b"),
            Path::parse("a.z"),
            Path::parse("a"),
            Path::parse("a.b.c"),
        ];
        paths.sort();
        let rendered: Vec<_> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["a", "a.b.c", "a.z", "b"]);
    }

    #[test]
    fn test_serde_as_string() {
        let path = Path::parse("enums.e");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"enums.e\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
