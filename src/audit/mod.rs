//! Dependency audit via the host package manager.
//!
//! Shells out to `npm audit --json` and normalizes advisories into the
//! common finding shape. Every failure arm (npm missing, timeout,
//! truncated or malformed output) degrades to an empty result; dependency
//! auditing is best-effort and never blocks a scan pipeline.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::{Category, Finding, Severity};

/// Default wall-clock budget for the audit subprocess.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured stdout is capped; a pathological lockfile cannot balloon memory.
const MAX_OUTPUT_BYTES: u64 = 8 * 1024 * 1024;

const MANIFEST_FILE: &str = "package.json";

/// Normalized audit outcome. Well-formed even when the tool failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditResult {
    pub findings: Vec<Finding>,
    pub summary: AuditSummary,
}

/// Advisory counts by severity. Info-level advisories are normalized but
/// not tallied, matching the report shape consumed downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Run `npm audit --json` against `project_path`.
pub fn audit(project_path: &Path) -> AuditResult {
    audit_with_timeout(project_path, DEFAULT_TIMEOUT)
}

pub fn audit_with_timeout(project_path: &Path, timeout: Duration) -> AuditResult {
    let output = match run_npm_audit(project_path, timeout) {
        Ok(output) => output,
        Err(reason) => {
            tracing::warn!(project = %project_path.display(), reason = %reason, "dependency audit unavailable");
            return AuditResult::default();
        }
    };

    match serde_json::from_str::<Value>(&output) {
        Ok(doc) => normalize(&doc),
        Err(e) => {
            tracing::warn!(error = %e, "audit output is not valid JSON");
            AuditResult::default()
        }
    }
}

/// Spawn npm with piped stdout, enforce the timeout by polling `try_wait`
/// and killing on expiry. npm reports "vulnerabilities found" through a
/// non-zero exit while still writing a complete JSON document, so exit
/// status is not treated as failure here; unparseable output is.
fn run_npm_audit(project_path: &Path, timeout: Duration) -> std::result::Result<String, String> {
    let mut child = Command::new("npm")
        .args(["audit", "--json"])
        .current_dir(project_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("spawn failed: {e}"))?;

    let stdout = child.stdout.take().ok_or("stdout not captured")?;
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let mut bounded = stdout.take(MAX_OUTPUT_BYTES);
        bounded.read_to_string(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_status)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("timed out after {}s", timeout.as_secs()));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(format!("wait failed: {e}"));
            }
        }
    }

    match reader.join() {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(format!("read failed: {e}")),
        Err(_) => Err("reader thread panicked".into()),
    }
}

/// Map npm's severity vocabulary onto the internal scale.
fn map_severity(vendor: &str) -> Severity {
    Severity::from_str_lenient(vendor).unwrap_or(Severity::Medium)
}

/// Normalize an npm audit document (v7+ `vulnerabilities` map) into one
/// finding per advisory.
fn normalize(doc: &Value) -> AuditResult {
    let mut result = AuditResult::default();

    let Some(vulnerabilities) = doc.get("vulnerabilities").and_then(Value::as_object) else {
        return result;
    };

    for (package, entry) in vulnerabilities {
        let package_severity = entry
            .get("severity")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let range = entry.get("range").and_then(Value::as_str).unwrap_or("*");
        let fix = fix_text(entry);

        let advisories = entry
            .get("via")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        // `via` mixes advisory objects with plain package-name strings for
        // transitive chains; only the objects are advisories.
        for advisory in advisories.iter().filter(|v| v.is_object()) {
            let severity = map_severity(
                advisory
                    .get("severity")
                    .and_then(Value::as_str)
                    .unwrap_or(package_severity),
            );
            let title = advisory
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Known vulnerability");
            let references = advisory
                .get("url")
                .and_then(Value::as_str)
                .map(|u| vec![u.to_string()])
                .unwrap_or_default();
            let cwe = advisory
                .get("cwe")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(Value::as_str)
                .map(String::from);

            result.findings.push(Finding {
                id: format!("VULNERABLE_DEPENDENCY-{}", result.findings.len() + 1),
                severity,
                category: Category::Dependencies,
                title: format!("Vulnerable dependency: {package}"),
                description: format!("{title} ({package} {range})"),
                file: MANIFEST_FILE.to_string(),
                line: 1,
                column: 1,
                end_line: 1,
                end_column: 1,
                code_snippet: format!("{package}@{range}"),
                fix: fix.clone(),
                references,
                cwe,
                owasp: None,
            });

            match severity {
                Severity::Critical => result.summary.critical += 1,
                Severity::High => result.summary.high += 1,
                Severity::Medium => result.summary.medium += 1,
                Severity::Low => result.summary.low += 1,
                Severity::Info => {}
            }
        }
    }

    result
}

fn fix_text(entry: &Value) -> Option<String> {
    match entry.get("fixAvailable") {
        Some(Value::Bool(true)) => Some("Run `npm audit fix`".to_string()),
        Some(Value::Object(fix)) => {
            let name = fix.get("name").and_then(Value::as_str)?;
            let version = fix.get("version").and_then(Value::as_str)?;
            Some(format!("Upgrade {name} to {version}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_tool_returns_empty_result() {
        // A directory with no package.json and (in CI images) often no npm:
        // every failure arm must produce the same empty shape.
        let dir = tempfile::tempdir().unwrap();
        let result = audit_with_timeout(dir.path(), Duration::from_secs(2));
        assert!(result.findings.is_empty());
        assert_eq!(result.summary, AuditSummary::default());
    }

    #[test]
    fn normalizes_v7_advisories() {
        let doc = json!({
            "auditReportVersion": 2,
            "vulnerabilities": {
                "lodash": {
                    "name": "lodash",
                    "severity": "high",
                    "range": "<4.17.21",
                    "fixAvailable": true,
                    "via": [
                        {
                            "title": "Prototype Pollution",
                            "severity": "high",
                            "url": "https://github.com/advisories/GHSA-p6mc-m468-83gw",
                            "cwe": ["CWE-1321"]
                        },
                        "minimist"
                    ]
                },
                "tar": {
                    "name": "tar",
                    "severity": "moderate",
                    "range": "<6.1.9",
                    "fixAvailable": { "name": "tar", "version": "6.2.0" },
                    "via": [
                        { "title": "Arbitrary File Overwrite", "severity": "moderate" }
                    ]
                }
            }
        });

        let result = normalize(&doc);
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.summary.high, 1);
        assert_eq!(result.summary.medium, 1);
        assert_eq!(result.summary.critical, 0);

        let lodash = result
            .findings
            .iter()
            .find(|f| f.title.contains("lodash"))
            .unwrap();
        assert_eq!(lodash.file, "package.json");
        assert_eq!(lodash.severity, Severity::High);
        assert_eq!(lodash.cwe.as_deref(), Some("CWE-1321"));
        assert_eq!(lodash.fix.as_deref(), Some("Run `npm audit fix`"));
        assert_eq!(lodash.references.len(), 1);

        let tar = result.findings.iter().find(|f| f.title.contains("tar")).unwrap();
        assert_eq!(tar.fix.as_deref(), Some("Upgrade tar to 6.2.0"));
    }

    #[test]
    fn unknown_vendor_severity_maps_to_medium() {
        assert_eq!(map_severity("serious"), Severity::Medium);
        assert_eq!(map_severity("moderate"), Severity::Medium);
        assert_eq!(map_severity("critical"), Severity::Critical);
    }

    #[test]
    fn document_without_vulnerabilities_is_empty() {
        let result = normalize(&json!({ "error": { "code": "EAUDITNOLOCK" } }));
        assert!(result.findings.is_empty());
        assert_eq!(result.summary, AuditSummary::default());
    }
}
