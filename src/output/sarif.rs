use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::error::Result;
use crate::rules::{Finding, Severity};
use crate::scan::Report;

/// Render a report as SARIF 2.1.0.
///
/// Produces a self-contained SARIF log compatible with GitHub Code Scanning
/// and other SARIF consumers.
pub fn render(report: &Report) -> Result<String> {
    let rules: Vec<Value> = report
        .findings
        .iter()
        .map(base_rule_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|rule_id| {
            let finding = report
                .findings
                .iter()
                .find(|f| base_rule_id(f) == rule_id)
                .unwrap();
            let mut rule = json!({
                "id": rule_id,
                "name": finding.title,
                "shortDescription": { "text": finding.title },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(finding.severity),
                },
            });
            if let Some(cwe) = &finding.cwe {
                rule["properties"] = json!({
                    "tags": [cwe],
                });
            }
            rule
        })
        .collect();

    let results: Vec<Value> = report
        .findings
        .iter()
        .map(|f| {
            let mut result = json!({
                "ruleId": base_rule_id(f),
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": f.description },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": f.file,
                        },
                        "region": {
                            "startLine": f.line,
                            "startColumn": f.column,
                            "endLine": f.end_line,
                            "endColumn": f.end_column,
                        },
                    },
                }],
            });

            if let Some(fix) = &f.fix {
                result["fixes"] = json!([{
                    "description": { "text": fix },
                }]);
            }

            result
        })
        .collect();

    let sarif = json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "automationDetails": {
                "id": format!("codewarden/{}", report.report_id),
            },
            "tool": {
                "driver": {
                    "name": "codewarden",
                    "version": env!("CARGO_PKG_VERSION"),
                    "informationUri": "https://github.com/limaronaldo/codewarden",
                    "rules": rules,
                },
            },
            "results": results,
        }],
    });

    Ok(serde_json::to_string_pretty(&sarif)?)
}

/// Finding ids are "<RULE_ID>-<ordinal>"; the SARIF rule id is the base.
fn base_rule_id(finding: &Finding) -> &str {
    finding
        .id
        .rsplit_once('-')
        .map(|(base, _)| base)
        .unwrap_or(&finding.id)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{ScanRequest, Scanner};

    #[test]
    fn sarif_log_carries_rules_and_results() {
        let content = "el.innerHTML = a\nel.innerHTML = b\nconsole.log(x)\n";
        let report = Scanner::new()
            .scan(&ScanRequest {
                inline_content: Some(content.to_string()),
                file_path: Some("view.ts".to_string()),
                ..Default::default()
            })
            .unwrap();

        let rendered = render(&report).unwrap();
        let doc: Value = serde_json::from_str(&rendered).unwrap();
        let run = &doc["runs"][0];

        // Two XSS findings deduplicate to one rule entry.
        let rule_ids: Vec<_> = run["tool"]["driver"]["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(rule_ids, vec!["DEBUG_LOGGING", "XSS_SINK"]);

        let results = run["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["ruleId"], "XSS_SINK");
        assert_eq!(results[0]["level"], "error");
        assert_eq!(
            results[0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            1
        );
    }
}
