//! Override resolution
//!
//! An override tree mirrors the schema layout and marks sanctioned breaking
//! changes with [`SchemaNode::Excluded`]. Every finding whose path equals an
//! excluded path is dropped, whatever its kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compatibility::Finding;
use crate::error::{Result, SchemaError};
use crate::path::Path;
use crate::schema::SchemaNode;

/// What to do with override entries that suppressed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleOverridePolicy {
    /// Silently accept them
    #[default]
    Ignore,
    /// Log a warning for each one
    Warn,
    /// Abort the check with [`SchemaError::StaleOverrides`]
    Error,
}

impl StaleOverridePolicy {
    /// Apply the policy to the override paths that matched no finding
    pub fn enforce(&self, unused: &[Path]) -> Result<()> {
        if unused.is_empty() {
            return Ok(());
        }
        match self {
            StaleOverridePolicy::Ignore => Ok(()),
            StaleOverridePolicy::Warn => {
                for path in unused {
                    warn!(path = %path, "override matched no finding");
                }
                Ok(())
            }
            StaleOverridePolicy::Error => Err(SchemaError::StaleOverrides {
                paths: unused.to_vec(),
            }),
        }
    }
}

impl FromStr for StaleOverridePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(StaleOverridePolicy::Ignore),
            "warn" => Ok(StaleOverridePolicy::Warn),
            "error" => Ok(StaleOverridePolicy::Error),
            other => Err(format!(
                "unknown stale override policy '{}' (expected ignore, warn or error)",
                other
            )),
        }
    }
}

impl fmt::Display for StaleOverridePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleOverridePolicy::Ignore => f.write_str("ignore"),
            StaleOverridePolicy::Warn => f.write_str("warn"),
            StaleOverridePolicy::Error => f.write_str("error"),
        }
    }
}

/// Outcome of applying an override tree
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Findings that survived, in their original order
    pub findings: Vec<Finding>,
    /// Number of findings removed by overrides
    pub suppressed: usize,
    /// Excluded paths that matched no finding
    pub unused: Vec<Path>,
}

/// Drop every finding located at an excluded path of `overrides`
pub fn resolve(findings: &[Finding], overrides: &SchemaNode) -> Vec<Finding> {
    resolve_with_usage(findings, overrides).findings
}

/// Like [`resolve`], also reporting which override entries were used
pub fn resolve_with_usage(findings: &[Finding], overrides: &SchemaNode) -> Resolution {
    let excluded = overrides.excluded_paths();
    let mut used = vec![false; excluded.len()];

    let mut kept = Vec::with_capacity(findings.len());
    for finding in findings {
        match excluded.iter().position(|p| *p == finding.path) {
            Some(idx) => {
                debug!(path = %finding.path, kind = %finding.kind, "finding suppressed by override");
                used[idx] = true;
            }
            None => kept.push(finding.clone()),
        }
    }

    let unused = excluded
        .into_iter()
        .zip(used)
        .filter_map(|(path, used)| (!used).then_some(path))
        .collect();

    Resolution {
        suppressed: findings.len() - kept.len(),
        findings: kept,
        unused,
    }
}
