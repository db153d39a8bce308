//! Schema Compatibility Checking
//!
//! Decides whether a new revision of a schema is backward compatible with the
//! previous one: every instance valid under the old schema must stay valid
//! under the new schema.
//!
//! ## Features
//!
//! - **Fragment Merging**: a schema may be split across several documents
//! - **Structural Checking**: field removal, new required fields, tightened
//!   optionality, removed enum values and type changes
//! - **Overrides**: sanctioned breaking changes are marked with `_|_`
//! - **Reporting**: deterministic ordering, truncation and redaction that never
//!   hide the verdict
//!
//! ## Pipeline
//!
//! ```text
//! documents ──► loader ──► merge ──► {old, new, overrides}
//!                                        │
//!            check(old, new) ──► resolve(overrides) ──► aggregate ──► Report
//! ```

pub mod breaking;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod overrides;
pub mod path;
pub mod report;
pub mod schema;

pub use breaking::{BreakingCheck, CheckOptions};
pub use compatibility::{check, check_sections, CompatibilityChecker, Finding, FindingKind};
pub use config::{CompatConfig, OutputFormat};
pub use error::{Result, SchemaError};
pub use merge::{merge, Fragment, MergeError, MergeErrorKind};
pub use overrides::{resolve, resolve_with_usage, Resolution, StaleOverridePolicy};
pub use path::Path;
pub use report::{
    aggregate, aggregate_with, MessageFormatter, PlainFormatter, RedactedFinding, Report,
    ReportedFinding,
};
pub use schema::{EnumNode, FieldDef, Literal, ScalarType, SchemaNode, StructNode};
