//! Finding aggregation
//!
//! Turns the filtered finding list into the reportable result. The verdict
//! and total count always reflect the full list; `max_count` and
//! `max_detail_length` only shape what is displayed.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compatibility::{Finding, FindingKind};
use crate::path::Path;

/// Renders findings into display messages
///
/// Localized or otherwise customized output is provided by implementing this
/// trait and handing it to [`aggregate_with`].
pub trait MessageFormatter: Send + Sync {
    fn format(&self, finding: &Finding) -> String;

    /// Message printed in place of a redacted finding
    fn format_redacted(&self, finding: &RedactedFinding, max_detail_length: usize) -> String {
        format!(
            "{}: {}: Suppressed finding longer than {} characters",
            finding.path.display_name(),
            finding.kind,
            max_detail_length
        )
    }
}

/// Plain English messages: `path: kind: detail`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl MessageFormatter for PlainFormatter {
    fn format(&self, finding: &Finding) -> String {
        let path = finding.path.display_name();
        if finding.detail.is_empty() {
            format!("{}: {}", path, finding.kind)
        } else {
            format!("{}: {}: {}", path, finding.kind, finding.detail)
        }
    }
}

/// A finding whose message was too long to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedFinding {
    pub path: Path,
    pub kind: FindingKind,
}

/// An entry of the displayed finding list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportedFinding {
    Full(Finding),
    Redacted(RedactedFinding),
}

impl ReportedFinding {
    pub fn path(&self) -> &Path {
        match self {
            ReportedFinding::Full(f) => &f.path,
            ReportedFinding::Redacted(r) => &r.path,
        }
    }

    pub fn kind(&self) -> FindingKind {
        match self {
            ReportedFinding::Full(f) => f.kind,
            ReportedFinding::Redacted(r) => r.kind,
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, ReportedFinding::Redacted(_))
    }
}

/// Final result of a compatibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Displayed findings, in traversal order
    pub findings: Vec<ReportedFinding>,
    /// Number of findings before truncation
    pub total_count: usize,
    /// Whether the new schema is backward compatible
    pub pass: bool,
}

impl Report {
    /// Whether some findings were left out of `findings`
    pub fn is_truncated(&self) -> bool {
        self.findings.len() < self.total_count
    }
}

/// Aggregate with the [`PlainFormatter`]
pub fn aggregate(findings: &[Finding], max_count: usize, max_detail_length: usize) -> Report {
    aggregate_with(findings, max_count, max_detail_length, &PlainFormatter)
}

/// Aggregate findings, measuring message length with `formatter`
///
/// A limit of 0 disables truncation or redaction respectively.
pub fn aggregate_with(
    findings: &[Finding],
    max_count: usize,
    max_detail_length: usize,
    formatter: &dyn MessageFormatter,
) -> Report {
    let total_count = findings.len();
    let pass = total_count == 0;

    let shown = if max_count > 0 {
        &findings[..total_count.min(max_count)]
    } else {
        findings
    };

    let reported: Vec<ReportedFinding> = shown
        .iter()
        .map(|finding| {
            let too_long = max_detail_length > 0
                && formatter.format(finding).chars().count() > max_detail_length;
            if too_long {
                ReportedFinding::Redacted(RedactedFinding {
                    path: finding.path.clone(),
                    kind: finding.kind,
                })
            } else {
                ReportedFinding::Full(finding.clone())
            }
        })
        .collect();

    info!(
        total = total_count,
        shown = reported.len(),
        redacted = reported.iter().filter(|r| r.is_redacted()).count(),
        pass,
        "findings aggregated"
    );

    Report {
        findings: reported,
        total_count,
        pass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings(n: usize) -> Vec<Finding> {
        (0..n)
            .map(|i| {
                Finding::new(
                    Path::parse(&format!("messages.f{}", i)),
                    FindingKind::FieldRemoved,
                    "optional field removed",
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_passes() {
        let report = aggregate(&[], 0, 0);
        assert!(report.pass);
        assert_eq!(report.total_count, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_truncation_keeps_total_and_verdict() {
        let all = findings(5);
        let report = aggregate(&all, 2, 0);

        assert!(!report.pass);
        assert_eq!(report.total_count, 5);
        assert_eq!(report.findings.len(), 2);
        assert!(report.is_truncated());
        assert_eq!(report.findings[0], ReportedFinding::Full(all[0].clone()));
        assert_eq!(report.findings[1], ReportedFinding::Full(all[1].clone()));
    }

    #[test]
    fn test_max_count_larger_than_list() {
        let report = aggregate(&findings(3), 10, 0);
        assert_eq!(report.findings.len(), 3);
        assert!(!report.is_truncated());
    }

    #[test]
    fn test_redaction_by_formatted_length() {
        let short = Finding::new(Path::parse("a"), FindingKind::EnumValueRemoved, "2");
        let long = Finding::new(
            Path::parse("messages.some_really_long_field_name"),
            FindingKind::FieldRemoved,
            "optional field removed",
        );
        let limit = PlainFormatter.format(&short).len();

        let report = aggregate(&[short.clone(), long.clone()], 0, limit);
        assert_eq!(report.findings[0], ReportedFinding::Full(short));
        assert_eq!(
            report.findings[1],
            ReportedFinding::Redacted(RedactedFinding {
                path: long.path,
                kind: long.kind
            })
        );
        assert_eq!(report.total_count, 2);
        assert!(!report.pass);
    }

    struct Terse;

    impl MessageFormatter for Terse {
        fn format(&self, finding: &Finding) -> String {
            finding.path.to_string()
        }
    }

    #[test]
    fn test_injected_formatter_drives_redaction() {
        let all = vec![Finding::new(
            Path::parse("ab"),
            FindingKind::FieldRemoved,
            "a detail far longer than the limit",
        )];
        let report = aggregate_with(&all, 0, 2, &Terse);
        assert!(!report.findings[0].is_redacted());

        let report = aggregate(&all, 0, 2);
        assert!(report.findings[0].is_redacted());
    }

    #[test]
    fn test_plain_formatter() {
        let finding = Finding::new(Path::parse("enums.e"), FindingKind::EnumValueRemoved, "2");
        assert_eq!(PlainFormatter.format(&finding), "enums.e: enum value removed: 2");

        let root = Finding::new(Path::root(), FindingKind::TypeMismatch, "");
        assert_eq!(PlainFormatter.format(&root), "<root>: type changed");
    }

    #[test]
    fn test_redacted_message() {
        let redacted = RedactedFinding {
            path: Path::parse("messages.foo"),
            kind: FindingKind::FieldRemoved,
        };
        assert_eq!(
            PlainFormatter.format_redacted(&redacted, 20),
            "messages.foo: field removed: Suppressed finding longer than 20 characters"
        );
    }

    #[test]
    fn test_report_json_tags_entries() {
        let report = aggregate(&findings(1), 0, 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["findings"][0]["status"], "redacted");
        assert_eq!(json["total_count"], 1);
        assert_eq!(json["pass"], false);
    }
}
