//! Derives prioritized remediation guidance from a completed report.

use crate::rules::Category;
use crate::scan::Report;

/// Remediation guidance in priority order. Pure function of the report.
pub fn recommend(report: &Report) -> Vec<String> {
    let mut recommendations = Vec::new();

    if report.summary.critical > 0 {
        recommendations.push(format!(
            "URGENT: address {} critical finding(s) before the next release",
            report.summary.critical
        ));
    }
    if report.summary.high > 0 {
        recommendations.push(format!(
            "Schedule remediation of {} high-severity finding(s) in the near term",
            report.summary.high
        ));
    }

    let has_category = |category: Category| report.findings.iter().any(|f| f.category == category);

    if has_category(Category::Injection) {
        recommendations.push(
            "Validate all external input and apply context-aware output encoding".to_string(),
        );
    }
    if has_category(Category::Secrets) {
        recommendations.push(
            "Rotate any exposed credentials and adopt a secret manager instead of source literals"
                .to_string(),
        );
    }
    if has_category(Category::Dependencies) {
        recommendations.push(
            "Upgrade vulnerable dependencies and enable automated dependency scanning".to_string(),
        );
    }

    recommendations
}
