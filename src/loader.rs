//! Schema document loading
//!
//! Schema trees are read from JSON or TOML documents using this encoding:
//!
//! ```text
//! {
//!   "messages": {                 object       -> struct
//!     "foo?": "string",           "name?"      -> optional field
//!     "id": "int"                 type name    -> scalar
//!   },
//!   "enums": {
//!     "e": [1, 2],                array        -> enum of literals
//!     "f": 3                      number       -> single-value enum
//!   },
//!   "legacy": "_|_"               "_|_"        -> excluded (override trees only)
//! }
//! ```

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::merge::Fragment;
use crate::path::Path;
use crate::schema::{EnumNode, FieldDef, Literal, ScalarType, SchemaNode, StructNode};

/// Marker for an excluded path in override documents
pub const EXCLUDED_MARKER: &str = "_|_";

/// Supported document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &FsPath) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(DocumentFormat::Json),
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

/// Parse document text into a schema tree
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<SchemaNode> {
    let value: Value = match format {
        DocumentFormat::Json => serde_json::from_str(text)?,
        DocumentFormat::Toml => toml::from_str(text)?,
    };
    node_from_value(&value, &Path::root())
}

/// Read a schema document from disk
pub fn load_document(path: &FsPath) -> Result<SchemaNode> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        SchemaError::InvalidFormat(format!(
            "{}: unsupported document type (expected .json or .toml)",
            path.display()
        ))
    })?;
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "loading schema document");
    parse_document(&text, format).map_err(|e| match e {
        SchemaError::InvalidFormat(msg) => {
            SchemaError::InvalidFormat(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Expand directories into the schema documents they contain
///
/// The result is sorted by path, so the merged declaration order (and with
/// it the finding order) does not depend on how inputs were listed.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(|e| SchemaError::Io(e.into()))?;
            let path = entry.path();
            if path.is_file() && DocumentFormat::from_path(path).is_some() {
                found.push(path.to_path_buf());
            }
        }
        debug!(dir = %input.display(), documents = found.len(), "expanded schema directory");
        files.extend(found);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Load every input as a root fragment, optionally selecting a sub-tree
pub fn load_fragments(inputs: &[PathBuf], select: Option<&Path>) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();
    for file in expand_inputs(inputs)? {
        let document = load_document(&file)?;
        let node = match select {
            Some(path) if !path.is_root() => document
                .lookup(path)
                .cloned()
                .ok_or_else(|| SchemaError::PathNotFound { path: path.clone() })?,
            _ => document,
        };
        fragments.push(Fragment::root(node).with_source(file.display().to_string()));
    }
    Ok(fragments)
}

/// Convert a decoded document value into a schema node
pub fn node_from_value(value: &Value, path: &Path) -> Result<SchemaNode> {
    match value {
        Value::Object(map) => {
            let mut node = StructNode::new();
            for (key, child) in map {
                let (name, required) = match key.strip_suffix('?') {
                    Some(name) => (name, false),
                    None => (key.as_str(), true),
                };
                let field_path = path.child(name);
                if node.contains(name) {
                    return Err(SchemaError::InvalidFormat(format!(
                        "field {} declared more than once",
                        field_path
                    )));
                }
                let value = node_from_value(child, &field_path)?;
                node.insert(name.to_string(), FieldDef { required, value });
            }
            Ok(SchemaNode::Struct(node))
        }
        Value::String(s) if s == EXCLUDED_MARKER => Ok(SchemaNode::Excluded),
        Value::String(s) => s.parse::<ScalarType>().map(SchemaNode::Scalar).map_err(|_| {
            SchemaError::InvalidFormat(format!("unknown type '{}' at {}", s, path.display_name()))
        }),
        Value::Number(_) => Ok(SchemaNode::Enum(EnumNode::new([literal(value, path)?])?)),
        Value::Array(items) => {
            let literals = items
                .iter()
                .map(|item| literal(item, path))
                .collect::<Result<Vec<_>>>()?;
            EnumNode::new(literals).map(SchemaNode::Enum).map_err(|_| {
                SchemaError::InvalidFormat(format!(
                    "enum at {} must list at least one value, each at most once",
                    path.display_name()
                ))
            })
        }
        Value::Bool(_) | Value::Null => Err(SchemaError::InvalidFormat(format!(
            "unsupported value {} at {}",
            value,
            path.display_name()
        ))),
    }
}

fn literal(value: &Value, path: &Path) -> Result<Literal> {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Ok(Literal::Int(i)),
            (None, Some(u), _) => Ok(Literal::UInt(u)),
            (None, None, Some(f)) => Ok(Literal::Float(f)),
            (None, None, None) => Err(SchemaError::InvalidFormat(format!(
                "number {} out of range at {}",
                n,
                path.display_name()
            ))),
        },
        Value::String(s) => Ok(Literal::String(s.clone())),
        other => Err(SchemaError::InvalidFormat(format!(
            "enum values must be numbers or strings, got {} at {}",
            other,
            path.display_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_struct_fields_and_optionality() {
        let node = node_from_value(
            &json!({ "messages": { "foo?": "string", "id": "int" } }),
            &Path::root(),
        )
        .unwrap();

        let messages = node.lookup(&Path::parse("messages")).unwrap().as_struct().unwrap();
        assert!(!messages.get("foo").unwrap().required);
        assert!(messages.get("id").unwrap().required);
        assert_eq!(messages.get("id").unwrap().value, SchemaNode::Scalar(ScalarType::Int));
    }

    #[test]
    fn test_enums_and_excluded() {
        let node = node_from_value(
            &json!({ "e": [1, 2], "one": 3, "names": ["a", "b"], "gone": "_|_" }),
            &Path::root(),
        )
        .unwrap();

        assert_eq!(
            node.lookup(&Path::parse("e")).unwrap(),
            &SchemaNode::enumeration([1i64, 2]).unwrap()
        );
        assert_eq!(
            node.lookup(&Path::parse("one")).unwrap(),
            &SchemaNode::enumeration([3i64]).unwrap()
        );
        assert_eq!(
            node.lookup(&Path::parse("names")).unwrap(),
            &SchemaNode::enumeration(["a", "b"]).unwrap()
        );
        assert!(node.lookup(&Path::parse("gone")).unwrap().is_excluded());
    }

    #[test]
    fn test_large_integer_literals_stay_exact() {
        let node = node_from_value(
            &json!({ "e": [18446744073709551615u64, 18446744073709551614u64] }),
            &Path::root(),
        )
        .unwrap();
        assert_eq!(
            node.lookup(&Path::parse("e")).unwrap(),
            &SchemaNode::enumeration([u64::MAX, u64::MAX - 1]).unwrap()
        );

        let old = node_from_value(&json!([18446744073709551615u64]), &Path::root()).unwrap();
        let new = node_from_value(&json!([18446744073709551614u64]), &Path::root()).unwrap();
        let findings = crate::compatibility::check(&old, &new, &Path::root());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detail, "18446744073709551615");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(node_from_value(&json!({ "x": "uuid" }), &Path::root()).is_err());
        assert!(node_from_value(&json!({ "x": true }), &Path::root()).is_err());
        assert!(node_from_value(&json!({ "x": [] }), &Path::root()).is_err());
        assert!(node_from_value(&json!({ "x": [1, 1] }), &Path::root()).is_err());
        assert!(node_from_value(&json!({ "x": "int", "x?": "int" }), &Path::root()).is_err());
    }

    #[test]
    fn test_parse_toml_document() {
        let text = r#"
            [messages]
            "foo?" = "string"

            [enums]
            e = [1, 2]
        "#;
        let node = parse_document(text, DocumentFormat::Toml).unwrap();
        assert!(node.lookup(&Path::parse("messages.foo")).is_some());
        assert!(node.lookup(&Path::parse("enums.e")).is_some());
    }

    #[test]
    fn test_load_fragments_selects_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{ "schema": { "messages": { "foo?": "string" } } }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.toml"), "[schema.enums]\ne = [1]\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let fragments =
            load_fragments(&[dir.path().to_path_buf()], Some(&Path::parse("schema"))).unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].source.as_deref().unwrap().ends_with("a.json"));
        assert!(fragments[0].node.lookup(&Path::parse("messages.foo")).is_some());
        assert!(fragments[1].node.lookup(&Path::parse("enums.e")).is_some());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        std::fs::write(&a, r#"{ "m": { "a?": "int" } }"#).unwrap();
        std::fs::write(&b, r#"{ "m": { "b?": "int" } }"#).unwrap();

        let forward = expand_inputs(&[a.clone(), b.clone()]).unwrap();
        let backward = expand_inputs(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(forward, vec![a.clone(), b.clone()]);
        assert_eq!(forward, backward);
        assert_eq!(expand_inputs(&[a.clone(), a.clone()]).unwrap(), vec![a]);
    }

    #[test]
    fn test_missing_selected_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        std::fs::write(&file, r#"{ "other": {} }"#).unwrap();

        let err = load_fragments(&[file], Some(&Path::parse("schema"))).unwrap_err();
        assert!(matches!(err, SchemaError::PathNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_document(FsPath::new("schema.cue")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat(_)));
    }
}
