//! Schema tree types
//!
//! A schema tree is built from three shapes: closed structs of named fields,
//! enumerations of literal values and primitive scalars. Override trees may
//! additionally carry [`SchemaNode::Excluded`] at their leaves.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};
use crate::path::Path;

/// Primitive type tag of a scalar node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Number,
    Bool,
    Bytes,
    Null,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Number => "number",
            ScalarType::Bool => "bool",
            ScalarType::Bytes => "bytes",
            ScalarType::Null => "null",
        }
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(ScalarType::String),
            "int" => Ok(ScalarType::Int),
            "float" => Ok(ScalarType::Float),
            "number" => Ok(ScalarType::Number),
            "bool" => Ok(ScalarType::Bool),
            "bytes" => Ok(ScalarType::Bytes),
            "null" => Ok(ScalarType::Null),
            other => Err(SchemaError::InvalidFormat(format!(
                "unknown scalar type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value permitted by an enumeration
#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(String),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::UInt(a), Literal::UInt(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::String(a), Literal::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::UInt(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<u64> for Literal {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Literal::Int(i),
            Err(_) => Literal::UInt(v),
        }
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

/// A declared struct field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub required: bool,
    pub value: SchemaNode,
}

impl FieldDef {
    pub fn required(value: SchemaNode) -> Self {
        Self { required: true, value }
    }

    pub fn optional(value: SchemaNode) -> Self {
        Self { required: false, value }
    }
}

/// A closed struct: only the declared fields are permitted
///
/// Declaration order is kept so that traversal is deterministic; equality
/// ignores it.
#[derive(Debug, Clone, Default)]
pub struct StructNode {
    fields: Vec<(String, FieldDef)>,
}

impl StructNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing an earlier declaration of the same name in place
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.insert(name.into(), def);
        self
    }

    pub fn required(self, name: impl Into<String>, value: SchemaNode) -> Self {
        self.with_field(name, FieldDef::required(value))
    }

    pub fn optional(self, name: impl Into<String>, value: SchemaNode) -> Self {
        self.with_field(name, FieldDef::optional(value))
    }

    pub(crate) fn insert(&mut self, name: String, def: FieldDef) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = def,
            None => self.fields.push((name, def)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for StructNode {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, def)| other.get(name).is_some_and(|o| o == def))
    }
}

/// A non-empty set of permitted literals
#[derive(Debug, Clone)]
pub struct EnumNode {
    values: Vec<Literal>,
}

impl EnumNode {
    /// Build an enumeration, rejecting empty sets and repeated values
    pub fn new<I, L>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let mut collected: Vec<Literal> = Vec::new();
        for value in values {
            let value = value.into();
            if collected.contains(&value) {
                return Err(SchemaError::InvalidFormat(format!(
                    "enum value {} appears more than once",
                    value
                )));
            }
            collected.push(value);
        }
        if collected.is_empty() {
            return Err(SchemaError::InvalidFormat(
                "enum must permit at least one value".to_string(),
            ));
        }
        Ok(Self { values: collected })
    }

    pub fn contains(&self, value: &Literal) -> bool {
        self.values.contains(value)
    }

    pub fn values(&self) -> &[Literal] {
        &self.values
    }

    /// Union with another enumeration, keeping first-seen order
    pub(crate) fn union(&self, other: &EnumNode) -> EnumNode {
        let mut values = self.values.clone();
        for value in &other.values {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
        EnumNode { values }
    }
}

impl PartialEq for EnumNode {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().all(|v| other.contains(v))
    }
}

/// A node of a schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Struct(StructNode),
    Enum(EnumNode),
    Scalar(ScalarType),
    /// Override-only marker: suppress findings at this path
    Excluded,
}

impl SchemaNode {
    /// An empty struct, the neutral element for merging
    pub fn empty_struct() -> Self {
        SchemaNode::Struct(StructNode::new())
    }

    pub fn enumeration<I, L>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Ok(SchemaNode::Enum(EnumNode::new(values)?))
    }

    /// Short description of the node's shape, used in finding details
    pub fn shape_name(&self) -> String {
        match self {
            SchemaNode::Struct(_) => "struct".to_string(),
            SchemaNode::Enum(_) => "enum".to_string(),
            SchemaNode::Scalar(tag) => tag.to_string(),
            SchemaNode::Excluded => "_|_".to_string(),
        }
    }

    pub fn as_struct(&self) -> Option<&StructNode> {
        match self {
            SchemaNode::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, SchemaNode::Excluded)
    }

    /// Follow `path` from this node through struct fields
    pub fn lookup(&self, path: &Path) -> Option<&SchemaNode> {
        let mut node = self;
        for segment in path.segments() {
            node = &node.as_struct()?.get(segment)?.value;
        }
        Some(node)
    }

    /// Every path (relative to this node) that carries an `Excluded` marker,
    /// in pre-order
    pub fn excluded_paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        collect_excluded(self, &Path::root(), &mut out);
        out
    }

    /// Reject `Excluded` markers, which only have meaning in override trees
    pub fn ensure_no_excluded(&self) -> Result<()> {
        match self.excluded_paths().into_iter().next() {
            Some(path) => Err(SchemaError::ExcludedOutsideOverride { path }),
            None => Ok(()),
        }
    }
}

fn collect_excluded(node: &SchemaNode, path: &Path, out: &mut Vec<Path>) {
    match node {
        SchemaNode::Excluded => out.push(path.clone()),
        SchemaNode::Struct(s) => {
            for (name, def) in s.iter() {
                collect_excluded(&def.value, &path.child(name), out);
            }
        }
        SchemaNode::Enum(_) | SchemaNode::Scalar(_) => {}
    }
}

impl From<StructNode> for SchemaNode {
    fn from(s: StructNode) -> Self {
        SchemaNode::Struct(s)
    }
}

impl From<EnumNode> for SchemaNode {
    fn from(e: EnumNode) -> Self {
        SchemaNode::Enum(e)
    }
}

impl From<ScalarType> for SchemaNode {
    fn from(tag: ScalarType) -> Self {
        SchemaNode::Scalar(tag)
    }
}
