//! codewarden: pattern-based static security scanner.
//!
//! Matches source code against a catalog of vulnerability signatures and
//! produces severity-ranked findings. Supports whole-project, single-file,
//! and diff-only scanning, plus best-effort dependency auditing through
//! `npm audit`. Matching is lexical by design; there is no AST, taint, or
//! data-flow analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use codewarden::{ScanRequest, Scanner};
//!
//! let scanner = Scanner::new();
//! let report = scanner
//!     .scan(&ScanRequest {
//!         project_path: Some("./my-service".into()),
//!         language: Some("typescript".into()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! println!("{} finding(s)", report.findings.len());
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod output;
pub mod recommend;
pub mod rules;
pub mod scan;

use std::path::Path;

pub use audit::{AuditResult, AuditSummary};
pub use error::{Result, WardenError};
pub use rules::{builtin_catalog, Category, Finding, RuleCatalog, RuleSummary, Severity, Summary};
pub use scan::{CancelFlag, Report, ScanOptions, ScanRequest, Scanner};

/// Scan a project or inline content with the builtin catalog.
pub fn scan(request: &ScanRequest) -> Result<Report> {
    Scanner::new().scan(request)
}

/// Scan one content blob with the builtin catalog.
pub fn scan_file(content: &str, language: &str, path: &str) -> Result<Report> {
    Scanner::new().scan_file(content, language, path)
}

/// Scan the added lines of a unified diff with the builtin catalog.
pub fn scan_diff(diff_text: &str, language: &str) -> Result<Report> {
    Scanner::new().scan_diff(diff_text, language)
}

/// Audit dependencies under `project_path`. Never fails; any audit-tool
/// problem yields an empty result.
pub fn audit_dependencies(project_path: &Path) -> AuditResult {
    audit::audit(project_path)
}

/// Static metadata for every builtin rule.
pub fn list_rules() -> Vec<RuleSummary> {
    builtin_catalog().list()
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn list_rules_exposes_catalog_metadata() {
        let rules = list_rules();
        assert!(rules.iter().any(|r| r.id == "HARDCODED_SECRET"));
        assert!(rules.iter().any(|r| r.id == "UNSAFE_DESERIALIZATION"));
        assert!(rules.iter().all(|r| !r.description.is_empty()));
    }

    #[test]
    fn scan_file_labels_findings_with_path() {
        let report = scan_file("document.write(html)", "javascript", "src/view.js").unwrap();
        assert_eq!(report.file_path, "src/view.js");
        assert!(report.findings.iter().all(|f| f.file == "src/view.js"));
    }

    #[test]
    fn scan_diff_never_reports_below_medium() {
        let diff = "+++ b/app.js\n+console.log(password)\n+Math.random()\n";
        let report = scan_diff(diff, "javascript").unwrap();
        assert!(report
            .findings
            .iter()
            .all(|f| f.severity >= Severity::Medium));
    }

    #[test]
    fn audit_on_empty_dir_is_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let result = audit_dependencies(dir.path());
        assert!(result.findings.is_empty());
        assert_eq!(result.summary, AuditSummary::default());
    }
}
