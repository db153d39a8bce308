//! Schema compatibility checking
//!
//! Compares an old schema tree against a new one and reports every place
//! where an instance valid under the old tree could be rejected by the new
//! tree. The comparison is structural and never fails: an empty finding list
//! means the new tree is backward compatible.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::path::Path;
use crate::schema::{EnumNode, FieldDef, SchemaNode, StructNode};

/// Type of incompatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A field of the old struct no longer exists
    FieldRemoved,
    /// An optional field became required
    FieldMadeRequired,
    /// A required field was introduced
    RequiredFieldAdded,
    /// A permitted enum value was dropped
    EnumValueRemoved,
    /// The node shape or scalar type changed
    TypeMismatch,
}

impl FindingKind {
    /// Human-readable description of this kind of change
    pub fn description(&self) -> &'static str {
        match self {
            FindingKind::FieldRemoved => "field removed",
            FindingKind::FieldMadeRequired => "optional field made required",
            FindingKind::RequiredFieldAdded => "required field added",
            FindingKind::EnumValueRemoved => "enum value removed",
            FindingKind::TypeMismatch => "type changed",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single incompatibility between the old and new tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Location of the incompatible node
    pub path: Path,
    pub kind: FindingKind,
    /// Kind-specific detail (e.g. the removed enum literal)
    pub detail: String,
}

impl Finding {
    pub fn new(path: Path, kind: FindingKind, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            detail: detail.into(),
        }
    }
}

/// Compare `old` against `new`, both located at `path`
pub fn check(old: &SchemaNode, new: &SchemaNode, path: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_node(old, new, path, &mut findings);
    findings
}

fn check_node(old: &SchemaNode, new: &SchemaNode, path: &Path, findings: &mut Vec<Finding>) {
    match (old, new) {
        (SchemaNode::Struct(old), SchemaNode::Struct(new)) => {
            for (name, old_field) in old.iter() {
                check_field(name, old_field, new, path, findings);
            }
            check_added_fields(old, new, path, findings);
        }
        (SchemaNode::Enum(old), SchemaNode::Enum(new)) => check_enum(old, new, path, findings),
        (SchemaNode::Scalar(a), SchemaNode::Scalar(b)) if a == b => {}
        _ => findings.push(Finding::new(
            path.clone(),
            FindingKind::TypeMismatch,
            format!("{} -> {}", old.shape_name(), new.shape_name()),
        )),
    }
}

/// Check one field of the old struct against the new struct
fn check_field(
    name: &str,
    old_field: &FieldDef,
    new: &StructNode,
    path: &Path,
    findings: &mut Vec<Finding>,
) {
    let field_path = path.child(name);
    let Some(new_field) = new.get(name) else {
        let detail = if old_field.required {
            "required field removed"
        } else {
            "optional field removed"
        };
        findings.push(Finding::new(field_path, FindingKind::FieldRemoved, detail));
        return;
    };

    if !old_field.required && new_field.required {
        findings.push(Finding::new(
            field_path.clone(),
            FindingKind::FieldMadeRequired,
            "optional -> required",
        ));
    }

    debug!(path = %field_path, "comparing field");
    check_node(&old_field.value, &new_field.value, &field_path, findings);
}

fn check_added_fields(old: &StructNode, new: &StructNode, path: &Path, findings: &mut Vec<Finding>) {
    for (name, new_field) in new.iter() {
        if new_field.required && !old.contains(name) {
            findings.push(Finding::new(
                path.child(name),
                FindingKind::RequiredFieldAdded,
                new_field.value.shape_name(),
            ));
        }
    }
}

fn check_enum(old: &EnumNode, new: &EnumNode, path: &Path, findings: &mut Vec<Finding>) {
    for value in old.values() {
        if !new.contains(value) {
            findings.push(Finding::new(
                path.clone(),
                FindingKind::EnumValueRemoved,
                value.to_string(),
            ));
        }
    }
}

/// Compare top-level sections of two struct trees on the rayon pool
///
/// Findings come back in the same order [`check`] would produce them: the
/// per-section results are collected in old-tree declaration order and the
/// new-only required sections follow.
pub fn check_sections(old: &SchemaNode, new: &SchemaNode, path: &Path) -> Vec<Finding> {
    let (SchemaNode::Struct(old_struct), SchemaNode::Struct(new_struct)) = (old, new) else {
        return check(old, new, path);
    };

    let fields: Vec<(&str, &FieldDef)> = old_struct.iter().collect();
    let per_section: Vec<Vec<Finding>> = fields
        .par_iter()
        .map(|(name, old_field)| {
            let mut findings = Vec::new();
            check_field(name, old_field, new_struct, path, &mut findings);
            findings
        })
        .collect();

    let mut findings: Vec<Finding> = per_section.into_iter().flatten().collect();
    check_added_fields(old_struct, new_struct, path, &mut findings);
    findings
}

/// Compatibility checker for schema trees
pub struct CompatibilityChecker {
    /// Check top-level sections concurrently
    parallel: bool,
}

impl CompatibilityChecker {
    /// Create a new compatibility checker
    pub fn new() -> Self {
        Self { parallel: false }
    }

    /// Enable per-section parallel checking
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Check that `new` accepts everything `old` accepts
    pub fn check(&self, old: &SchemaNode, new: &SchemaNode) -> Vec<Finding> {
        let root = Path::root();
        let findings = if self.parallel {
            check_sections(old, new, &root)
        } else {
            check(old, new, &root)
        };
        info!(
            findings = findings.len(),
            parallel = self.parallel,
            "compatibility check complete"
        );
        findings
    }
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;

    fn string() -> SchemaNode {
        SchemaNode::Scalar(ScalarType::String)
    }

    fn int() -> SchemaNode {
        SchemaNode::Scalar(ScalarType::Int)
    }

    fn root(s: StructNode) -> SchemaNode {
        s.into()
    }

    fn enumeration(values: &[i64]) -> SchemaNode {
        SchemaNode::enumeration(values.iter().copied()).unwrap()
    }

    #[test]
    fn test_compatible_optional_field_addition() {
        let old = root(StructNode::new().required("name", string()));
        let new = root(
            StructNode::new()
                .required("name", string())
                .optional("age", int()),
        );

        assert!(CompatibilityChecker::new().check(&old, &new).is_empty());
    }

    #[test]
    fn test_breaking_field_removal() {
        let old = root(
            StructNode::new()
                .required("name", string())
                .optional("age", int()),
        );
        let new = root(StructNode::new().required("name", string()));

        let findings = CompatibilityChecker::new().check(&old, &new);
        assert_eq!(
            findings,
            vec![Finding::new(
                Path::parse("age"),
                FindingKind::FieldRemoved,
                "optional field removed"
            )]
        );
    }

    #[test]
    fn test_field_made_required() {
        let old = root(StructNode::new().optional("name", string()));
        let new = root(StructNode::new().required("name", string()));

        let findings = check(&old, &new, &Path::root());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::FieldMadeRequired);

        // Relaxing a requirement is fine
        assert!(check(&new, &old, &Path::root()).is_empty());
    }

    #[test]
    fn test_enum_value_removed_carries_literal() {
        let old = SchemaNode::enumeration([1i64, 2, 3]).unwrap();
        let new = SchemaNode::enumeration([1i64]).unwrap();

        let findings = check(&old, &new, &Path::parse("enums.e"));
        let details: Vec<_> = findings.iter().map(|f| f.detail.as_str()).collect();
        assert_eq!(details, vec!["2", "3"]);
        assert!(findings
            .iter()
            .all(|f| f.kind == FindingKind::EnumValueRemoved && f.path == Path::parse("enums.e")));
    }

    #[test]
    fn test_type_mismatch() {
        let findings = check(&int(), &string(), &Path::parse("f"));
        assert_eq!(
            findings,
            vec![Finding::new(Path::parse("f"), FindingKind::TypeMismatch, "int -> string")]
        );

        let findings = check(&root(StructNode::new()), &int(), &Path::root());
        assert_eq!(findings[0].detail, "struct -> int");
    }

    #[test]
    fn test_traversal_order() {
        let old = root(
            StructNode::new()
                .optional("b", root(StructNode::new().required("x", int())))
                .required("a", string()),
        );
        let new = root(
            StructNode::new()
                .required("z", int())
                .required("b", root(StructNode::new()))
                .required("y", int()),
        );

        let paths: Vec<_> = check(&old, &new, &Path::root())
            .into_iter()
            .map(|f| (f.path.to_string(), f.kind))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("b".to_string(), FindingKind::FieldMadeRequired),
                ("b.x".to_string(), FindingKind::FieldRemoved),
                ("a".to_string(), FindingKind::FieldRemoved),
                ("z".to_string(), FindingKind::RequiredFieldAdded),
                ("y".to_string(), FindingKind::RequiredFieldAdded),
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let old = root(
            StructNode::new()
                .required("messages", root(StructNode::new().optional("foo", string())))
                .required("enums", root(StructNode::new().optional("e", enumeration(&[1, 2]))))
                .optional("gone", int()),
        );
        let new = root(
            StructNode::new()
                .required("messages", root(StructNode::new()))
                .required("enums", root(StructNode::new().optional("e", enumeration(&[1]))))
                .required("extra", int()),
        );

        let sequential = CompatibilityChecker::new().check(&old, &new);
        let parallel = CompatibilityChecker::new().parallel().check(&old, &new);
        assert_eq!(sequential.len(), 4);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_finding_serializes_kind_in_snake_case() {
        let finding = Finding::new(Path::parse("messages.foo"), FindingKind::FieldRemoved, "");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "field_removed");
        assert_eq!(json["path"], "messages.foo");
    }
}
