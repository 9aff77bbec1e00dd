use crate::recommend;
use crate::rules::Severity;
use crate::scan::Report;

/// Render a report as console output, grouped by severity then file path,
/// with the summary and remediation guidance at the end.
pub fn render(report: &Report) -> String {
    let mut output = String::new();

    if report.findings.is_empty() {
        output.push_str("\n  No security findings detected.\n\n");
        return output;
    }

    let mut sorted: Vec<_> = report.findings.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });

    output.push_str(&format!(
        "\n  {} finding(s) in {}:\n\n",
        report.findings.len(),
        report.file_path
    ));

    for finding in &sorted {
        let severity_tag = match finding.severity {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]    ",
            Severity::Medium => "[MEDIUM]  ",
            Severity::Low => "[LOW]     ",
            Severity::Info => "[INFO]    ",
        };

        output.push_str(&format!(
            "  {} {} {}\n",
            severity_tag, finding.id, finding.description
        ));
        output.push_str(&format!(
            "           at {}:{}:{}\n",
            finding.file, finding.line, finding.column
        ));
        if !finding.code_snippet.is_empty() {
            output.push_str(&format!("           > {}\n", finding.code_snippet));
        }
        if let Some(fix) = &finding.fix {
            output.push_str(&format!("           fix: {}\n", fix));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "  Summary: {} critical, {} high, {} medium, {} low, {} info ({} ms)\n",
        report.summary.critical,
        report.summary.high,
        report.summary.medium,
        report.summary.low,
        report.summary.info,
        report.scan_duration_ms,
    ));

    let recommendations = recommend::recommend(report);
    if !recommendations.is_empty() {
        output.push('\n');
        for rec in recommendations {
            output.push_str(&format!("  * {}\n", rec));
        }
    }
    output.push('\n');

    output
}
