//! Fragment merging
//!
//! A side of a comparison (old, new or override) may be declared across
//! several source documents. Each document contributes a [`Fragment`]; all
//! fragments of a side are merged into one tree before checking.
//!
//! Merging is n-ary: every node addressed by the same path is merged in one
//! step, and struct fields are visited in sorted name order. The reported
//! conflict is therefore the first one in path order no matter how the
//! fragments were listed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::path::Path;
use crate::schema::{FieldDef, SchemaNode, StructNode};

/// Kind of merge failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeErrorKind {
    /// Same shape, but irreconcilable declarations (required flag, scalar tag)
    Conflict,
    /// Different node shapes at the same path
    ShapeConflict,
}

impl fmt::Display for MergeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeErrorKind::Conflict => f.write_str("conflict"),
            MergeErrorKind::ShapeConflict => f.write_str("shape conflict"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("merge {kind} at {path}")]
pub struct MergeError {
    pub kind: MergeErrorKind,
    pub path: Path,
}

impl MergeError {
    fn conflict(path: Path) -> Self {
        Self { kind: MergeErrorKind::Conflict, path }
    }

    fn shape(path: Path) -> Self {
        Self { kind: MergeErrorKind::ShapeConflict, path }
    }
}

/// A schema node declared at some path of the logical tree
#[derive(Debug, Clone)]
pub struct Fragment {
    pub at: Path,
    pub node: SchemaNode,
    /// Where the fragment came from, for diagnostics
    pub source: Option<String>,
}

impl Fragment {
    /// A fragment describing the whole tree
    pub fn root(node: SchemaNode) -> Self {
        Self { at: Path::root(), node, source: None }
    }

    pub fn at(at: Path, node: SchemaNode) -> Self {
        Self { at, node, source: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The fragment's node wrapped in required struct fields so it sits at
    /// `self.at` below the root
    fn rooted(&self) -> SchemaNode {
        self.at
            .segments()
            .iter()
            .rev()
            .fold(self.node.clone(), |node, name| {
                StructNode::new().required(name.clone(), node).into()
            })
    }
}

/// Merge all fragments of one side into a single tree
///
/// No fragments yields an empty struct.
pub fn merge(fragments: &[Fragment]) -> Result<SchemaNode, MergeError> {
    if fragments.is_empty() {
        return Ok(SchemaNode::empty_struct());
    }

    let rooted: Vec<SchemaNode> = fragments
        .iter()
        .map(|fragment| {
            debug!(
                at = %fragment.at,
                source = fragment.source.as_deref().unwrap_or("<inline>"),
                "merging fragment"
            );
            fragment.rooted()
        })
        .collect();
    let nodes: Vec<&SchemaNode> = rooted.iter().collect();

    merge_nodes(&nodes, &Path::root())
}

fn merge_nodes(nodes: &[&SchemaNode], path: &Path) -> Result<SchemaNode, MergeError> {
    let first = nodes[0];
    if nodes.len() == 1 {
        return Ok(first.clone());
    }

    match first {
        SchemaNode::Struct(_) => {
            let structs = nodes
                .iter()
                .copied()
                .map(|n| n.as_struct().ok_or_else(|| MergeError::shape(path.clone())))
                .collect::<Result<Vec<_>, _>>()?;
            merge_structs(&structs, path).map(SchemaNode::Struct)
        }
        SchemaNode::Enum(first_enum) => {
            let mut merged = first_enum.clone();
            for node in &nodes[1..] {
                let SchemaNode::Enum(e) = node else {
                    return Err(MergeError::shape(path.clone()));
                };
                merged = merged.union(e);
            }
            Ok(SchemaNode::Enum(merged))
        }
        SchemaNode::Scalar(tag) => {
            let mut conflict = false;
            for node in nodes {
                match node {
                    SchemaNode::Scalar(other) if other == tag => {}
                    SchemaNode::Scalar(_) => conflict = true,
                    _ => return Err(MergeError::shape(path.clone())),
                }
            }
            if conflict {
                Err(MergeError::conflict(path.clone()))
            } else {
                Ok(SchemaNode::Scalar(*tag))
            }
        }
        SchemaNode::Excluded => {
            if nodes.iter().all(|n| n.is_excluded()) {
                Ok(SchemaNode::Excluded)
            } else {
                Err(MergeError::shape(path.clone()))
            }
        }
    }
}

fn merge_structs(structs: &[&StructNode], path: &Path) -> Result<StructNode, MergeError> {
    let sorted_names: BTreeSet<&str> = structs
        .iter()
        .copied()
        .flat_map(|s| s.iter().map(|(n, _)| n))
        .collect();

    let mut merged_fields: BTreeMap<&str, FieldDef> = BTreeMap::new();
    for name in sorted_names {
        let field_path = path.child(name);
        let defs: Vec<&FieldDef> = structs.iter().copied().filter_map(|s| s.get(name)).collect();

        let required = defs[0].required;
        if defs.iter().any(|d| d.required != required) {
            return Err(MergeError::conflict(field_path));
        }

        let values: Vec<&SchemaNode> = defs.iter().map(|d| &d.value).collect();
        let value = merge_nodes(&values, &field_path)?;
        merged_fields.insert(name, FieldDef { required, value });
    }

    // Restore first-seen declaration order
    let mut result = StructNode::new();
    for s in structs {
        for (name, _) in s.iter() {
            if let Some(def) = merged_fields.remove(name) {
                result.insert(name.to_string(), def);
            }
        }
    }
    Ok(result)
}
