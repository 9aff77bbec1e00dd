//! End-to-end project scans over temporary directory trees.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use codewarden::{CancelFlag, ScanRequest, Scanner, Severity};

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project_request(root: &Path, language: &str) -> ScanRequest {
    ScanRequest {
        project_path: Some(root.to_path_buf()),
        language: Some(language.to_string()),
        ..Default::default()
    }
}

#[test]
fn project_scan_aggregates_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        &dir.path().join("src/config.ts"),
        "export const apiKey = \"AbCdEfGhIj0123456789KLMN\"\n",
    );
    write_file(
        &dir.path().join("src/api.ts"),
        "export function load(raw: string) {\n  return eval(JSON.parse(raw))\n}\n",
    );
    write_file(&dir.path().join("src/clean.ts"), "export const n = 1\n");

    let report = Scanner::new()
        .scan(&project_request(dir.path(), "typescript"))
        .unwrap();

    assert_eq!(report.findings.len(), 2);
    assert_eq!(report.summary.critical, 2);
    let ids: Vec<_> = report.findings.iter().map(|f| f.id.as_str()).collect();
    assert!(ids.contains(&"HARDCODED_SECRET-1"));
    assert!(ids.contains(&"UNSAFE_DESERIALIZATION-1"));

    // Findings point at the files they came from.
    let secret = report
        .findings
        .iter()
        .find(|f| f.id == "HARDCODED_SECRET-1")
        .unwrap();
    assert!(secret.file.ends_with("config.ts"));
    assert_eq!(secret.line, 1);

    let eval = report
        .findings
        .iter()
        .find(|f| f.id == "UNSAFE_DESERIALIZATION-1")
        .unwrap();
    assert_eq!(eval.line, 2);
}

#[test]
fn vendored_and_build_output_is_never_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let secret = "const token = \"AbCdEfGhIj0123456789KLMN\"\n";
    write_file(&dir.path().join("node_modules/dep/index.ts"), secret);
    write_file(&dir.path().join("dist/bundle.ts"), secret);
    write_file(&dir.path().join("coverage/lcov.ts"), secret);
    write_file(&dir.path().join("src/ok.ts"), "const n = 1\n");

    let report = Scanner::new()
        .scan(&project_request(dir.path(), "typescript"))
        .unwrap();
    assert_eq!(report.findings.len(), 0);
    assert_eq!(report.summary.critical, 0);
}

#[test]
fn severity_filter_applies_to_project_scans() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        &dir.path().join("a.ts"),
        "console.log(x)\nconst apiKey = \"AbCdEfGhIj0123456789KLMN\"\n",
    );

    let request = ScanRequest {
        severities: vec![Severity::Critical],
        ..project_request(dir.path(), "typescript")
    };
    let report = Scanner::new().scan(&request).unwrap();

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.summary.info, 0);
    assert!(report.findings[0].id.starts_with("HARDCODED_SECRET"));
}

#[test]
fn cancelled_scan_returns_empty_but_valid_report() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        &dir.path().join("a.ts"),
        "const apiKey = \"AbCdEfGhIj0123456789KLMN\"\n",
    );

    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = Scanner::new()
        .scan_with_cancel(&project_request(dir.path(), "typescript"), &cancel)
        .unwrap();

    assert!(report.findings.is_empty());
    assert_eq!(report.summary.critical, 0);
    assert!(!report.report_id.is_empty());
}

#[test]
fn repeated_project_scans_are_structurally_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        &dir.path().join("a.ts"),
        "el.innerHTML = a\nMath.random()\n",
    );
    write_file(&dir.path().join("b.ts"), "document.write(x)\n");

    let scanner = Scanner::new();
    let request = project_request(dir.path(), "typescript");
    let first = scanner.scan(&request).unwrap();
    let second = scanner.scan(&request).unwrap();

    assert_eq!(first.findings, second.findings);
    assert_eq!(first.summary, second.summary);
    assert_ne!(first.report_id, second.report_id);
}

#[test]
fn bounded_worker_pool_matches_sequential_results() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..12 {
        write_file(
            &dir.path().join(format!("src/mod{i}.ts")),
            "el.innerHTML = a\nconsole.log(x)\n",
        );
    }

    let request = project_request(dir.path(), "typescript");
    let sequential = Scanner::new()
        .with_options(codewarden::ScanOptions { threads: Some(1) })
        .scan(&request)
        .unwrap();
    let parallel = Scanner::new()
        .with_options(codewarden::ScanOptions { threads: Some(4) })
        .scan(&request)
        .unwrap();

    assert_eq!(sequential.findings, parallel.findings);
    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential.summary.high, 12);
    assert_eq!(sequential.summary.info, 12);
}
