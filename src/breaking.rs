//! Breaking change detection
//!
//! Wires the pipeline together: merge each side, check old against new,
//! drop overridden findings and aggregate the rest into a [`Report`].

use std::path::PathBuf;

use tracing::info;

use crate::compatibility::CompatibilityChecker;
use crate::error::Result;
use crate::loader;
use crate::merge::{merge, Fragment};
use crate::overrides::{resolve_with_usage, StaleOverridePolicy};
use crate::path::Path;
use crate::report::{aggregate_with, MessageFormatter, PlainFormatter, Report};
use crate::schema::SchemaNode;

/// Tunables of a single check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Maximum findings to display (0 = all)
    pub max_count: usize,
    /// Redact findings whose message is longer than this (0 = never)
    pub max_detail_length: usize,
    /// Sub-tree selected in every loaded document
    pub path: Option<Path>,
    pub stale_overrides: StaleOverridePolicy,
    /// Check top-level sections in parallel
    pub parallel: bool,
}

/// A configured breaking-change check
pub struct BreakingCheck {
    options: CheckOptions,
    formatter: Box<dyn MessageFormatter>,
}

impl BreakingCheck {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            formatter: Box::new(PlainFormatter),
        }
    }

    /// Use `formatter` to measure messages for redaction
    pub fn with_formatter(mut self, formatter: Box<dyn MessageFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn formatter(&self) -> &dyn MessageFormatter {
        self.formatter.as_ref()
    }

    /// Check already merged trees. `None` overrides suppress nothing.
    pub fn run_trees(
        &self,
        old: &SchemaNode,
        new: &SchemaNode,
        overrides: Option<&SchemaNode>,
    ) -> Result<Report> {
        old.ensure_no_excluded()?;
        new.ensure_no_excluded()?;

        let checker = if self.options.parallel {
            CompatibilityChecker::new().parallel()
        } else {
            CompatibilityChecker::new()
        };
        let raw = checker.check(old, new);

        let filtered = match overrides {
            Some(tree) => {
                let resolution = resolve_with_usage(&raw, tree);
                info!(
                    suppressed = resolution.suppressed,
                    unused = resolution.unused.len(),
                    "overrides applied"
                );
                self.options.stale_overrides.enforce(&resolution.unused)?;
                resolution.findings
            }
            None => raw,
        };

        Ok(aggregate_with(
            &filtered,
            self.options.max_count,
            self.options.max_detail_length,
            self.formatter.as_ref(),
        ))
    }

    /// Merge the fragments of each side, then check
    ///
    /// Merge failures abort before any comparison happens.
    pub fn run(&self, old: &[Fragment], new: &[Fragment], overrides: &[Fragment]) -> Result<Report> {
        let old_tree = merge(old)?;
        let new_tree = merge(new)?;
        let override_tree = merge(overrides)?;
        self.run_trees(&old_tree, &new_tree, Some(&override_tree))
    }

    /// Load, merge and check schema documents from disk
    pub fn run_files(
        &self,
        old: &[PathBuf],
        new: &[PathBuf],
        overrides: &[PathBuf],
    ) -> Result<Report> {
        let select = self.options.path.as_ref();
        let old = loader::load_fragments(old, select)?;
        let new = loader::load_fragments(new, select)?;
        let overrides = loader::load_fragments(overrides, select)?;
        info!(
            old = old.len(),
            new = new.len(),
            overrides = overrides.len(),
            "schema documents loaded"
        );
        self.run(&old, &new, &overrides)
    }
}

impl Default for BreakingCheck {
    fn default() -> Self {
        Self::new(CheckOptions::default())
    }
}
