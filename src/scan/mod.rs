//! Scan orchestration: request validation, file fan-out, aggregation.

pub mod collector;
pub mod diff;
pub mod matcher;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WardenError};
use crate::rules::{builtin_catalog, Finding, Rule, RuleCatalog, Severity, Summary};

pub use diff::DiffLines;

/// Cooperative cancellation for in-flight project scans. Checked between
/// directory entries and between files, so stopping never corrupts the
/// findings accumulated so far.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parameters for one scan invocation.
///
/// Exactly one of `project_path` and `inline_content` must be supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    pub project_path: Option<PathBuf>,
    pub inline_content: Option<String>,
    /// Label attached to findings from inline content.
    pub file_path: Option<String>,
    pub language: Option<String>,
    /// Narrow the active rule set to these ids (empty = all).
    #[serde(default)]
    pub rule_ids: Vec<String>,
    /// Narrow the active rule set to these severities (empty = all).
    #[serde(default)]
    pub severities: Vec<Severity>,
}

/// Aggregated findings for one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub file_path: String,
    pub language: String,
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub scan_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Tuning knobs for a [`Scanner`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Worker-pool bound for per-file fan-out. `None` uses the global pool.
    pub threads: Option<usize>,
}

/// Runs scans against an immutable rule catalog.
///
/// Cheap to clone; the catalog is shared by reference and safe to use from
/// any number of threads concurrently.
#[derive(Debug, Clone)]
pub struct Scanner {
    catalog: Arc<RuleCatalog>,
    options: ScanOptions,
}

/// Diff scans only surface newly introduced risk.
const DIFF_SEVERITIES: [Severity; 3] = [Severity::Critical, Severity::High, Severity::Medium];

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// A scanner over the builtin catalog.
    pub fn new() -> Self {
        Self::with_catalog(builtin_catalog())
    }

    pub fn with_catalog(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Run a scan per the request. Fails with a validation error unless
    /// exactly one input mode is present; I/O problems inside a project
    /// scan degrade to partial results instead.
    pub fn scan(&self, request: &ScanRequest) -> Result<Report> {
        self.scan_with_cancel(request, &CancelFlag::new())
    }

    pub fn scan_with_cancel(&self, request: &ScanRequest, cancel: &CancelFlag) -> Result<Report> {
        let started = Instant::now();
        let language = request
            .language
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let rules = self
            .catalog
            .active_rules(&request.rule_ids, &request.severities);

        let (findings, file_path) = match (&request.project_path, &request.inline_content) {
            (Some(_), Some(_)) => {
                return Err(WardenError::Validation(
                    "supply either project_path or inline_content, not both".into(),
                ))
            }
            (None, None) => {
                return Err(WardenError::Validation(
                    "either project_path or inline_content is required".into(),
                ))
            }
            (Some(root), None) => (
                self.scan_project(root, &language, &rules, cancel),
                root.display().to_string(),
            ),
            (None, Some(content)) => {
                let label = request
                    .file_path
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                (match_unit(&rules, content, &label), label)
            }
        };

        Ok(finish(file_path, language, findings, started))
    }

    /// Scan a single content blob under the given path label.
    pub fn scan_file(&self, content: &str, language: &str, path: &str) -> Result<Report> {
        if content.is_empty() {
            return Err(WardenError::Validation("content must not be empty".into()));
        }
        self.scan(&ScanRequest {
            inline_content: Some(content.to_string()),
            file_path: Some(path.to_string()),
            language: Some(language.to_string()),
            ..Default::default()
        })
    }

    /// Scan only the lines a unified diff adds, restricted to severities
    /// that represent newly introduced risk. Removed lines are extracted
    /// but never scanned.
    pub fn scan_diff(&self, diff_text: &str, language: &str) -> Result<Report> {
        let started = Instant::now();
        let lines = diff::extract(diff_text);
        let blob = lines.added.join("\n");

        let rules = self.catalog.active_rules(&[], &DIFF_SEVERITIES);
        let mut findings = match_unit(&rules, &blob, "diff");
        for finding in &mut findings {
            let context = if finding.severity >= Severity::High {
                "introduced in this change"
            } else {
                "detected in the changes"
            };
            finding.description = format!("{} ({context})", finding.description);
        }

        Ok(finish("diff".to_string(), language.to_string(), findings, started))
    }

    fn scan_project(
        &self,
        root: &Path,
        language: &str,
        rules: &[&Rule],
        cancel: &CancelFlag,
    ) -> Vec<Finding> {
        let files = collector::collect(root, language, cancel);
        tracing::debug!(files = files.len(), root = %root.display(), "collected scan set");

        let run = || {
            files
                .par_iter()
                .map(|path| {
                    if cancel.is_cancelled() {
                        return Vec::new();
                    }
                    match std::fs::read_to_string(path) {
                        Ok(content) => match_unit(rules, &content, &path.display().to_string()),
                        Err(e) => {
                            tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                            Vec::new()
                        }
                    }
                })
                .collect::<Vec<_>>()
        };

        // Ordered collect keeps the fan-in deterministic regardless of
        // worker scheduling.
        let per_file = match self.options.threads {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    tracing::warn!(error = %e, "worker pool unavailable, using global pool");
                    run()
                }
            },
            None => run(),
        };

        per_file.into_iter().flatten().collect()
    }
}

/// Apply every active rule to one unit of text.
fn match_unit(rules: &[&Rule], text: &str, file: &str) -> Vec<Finding> {
    rules
        .iter()
        .flat_map(|rule| matcher::apply(rule, text, file))
        .collect()
}

fn finish(file_path: String, language: String, mut findings: Vec<Finding>, started: Instant) -> Report {
    assign_ids(&mut findings);
    let summary = Summary::tally(&findings);
    Report {
        report_id: Uuid::new_v4().to_string(),
        file_path,
        language,
        findings,
        summary,
        scan_duration_ms: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
    }
}

/// Rewrite each finding's base rule id into "<RULE_ID>-<n>" where n is the
/// per-rule ordinal across the whole report.
fn assign_ids(findings: &mut [Finding]) {
    let mut counters: HashMap<String, usize> = HashMap::new();
    for finding in findings {
        let n = counters.entry(finding.id.clone()).or_insert(0);
        *n += 1;
        finding.id = format!("{}-{}", finding.id, n);
    }
}
